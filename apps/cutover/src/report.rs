//! Text and JSON renderings of the final cutover report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::domain::{CutoverType, ReportRow};

const HEADERS: [&str; 3] = ["Module", "Reference", "IO Channel"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub cutover_type: CutoverType,
    pub controllers: Vec<&'a str>,
    pub rows: &'a [ReportRow],
}

pub fn render_table(rows: &[ReportRow]) -> String {
    let cells: Vec<[&str; 3]> = rows
        .iter()
        .map(|row| {
            [
                row.module.as_str(),
                row.reference_name.as_str(),
                row.io_channel.as_str(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS, &widths);
    let rule = widths.map(|width| "-".repeat(width));
    push_line(&mut out, &rule.each_ref().map(String::as_str), &widths);
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str; 3], widths: &[usize; 3]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

pub fn render_json(document: &ReportDocument<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}
