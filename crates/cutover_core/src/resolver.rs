//! Cross-reference join between the modules chosen for cutover and the
//! reference block dataset.

use serde_json::Value;
use shared::domain::{IoChannels, ReferenceRecord, ReportRow};

pub const MISSING: &str = "N/A";

/// Builds the report rows for `modules`, in selection order.
///
/// Channel arrays are rendered as JSON text, joined as `"<input>, <output>"`
/// and split again on `,`. A channel value whose rendering contains a comma is
/// therefore spread over several positions; existing reports depend on this.
pub fn resolve<I, S>(modules: I, references: &[ReferenceRecord]) -> Vec<ReportRow>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rows = Vec::new();

    for module in modules {
        let module = module.as_ref();
        let Some(record) = references
            .iter()
            .find(|record| record.controller_name == module)
        else {
            rows.push(ReportRow {
                module: module.to_owned(),
                reference_name: MISSING.to_owned(),
                io_channel: MISSING.to_owned(),
            });
            continue;
        };

        let rendered = render_channels(&record.io_channels);
        let channels: Vec<&str> = rendered.split(',').map(str::trim).collect();
        let len = record.reference_names.len().max(channels.len());

        rows.extend((0..len).map(|position| ReportRow {
            module: module.to_owned(),
            reference_name: record
                .reference_names
                .get(position)
                .cloned()
                .unwrap_or_default(),
            io_channel: channels
                .get(position)
                .map(|channel| (*channel).to_owned())
                .unwrap_or_default(),
        }));
    }

    rows
}

pub fn render_channels(channels: &IoChannels) -> String {
    format!(
        "{}, {}",
        render_array(&channels.input),
        render_array(&channels.output)
    )
}

fn render_array(values: &[Value]) -> String {
    Value::Array(values.to_vec()).to_string()
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
