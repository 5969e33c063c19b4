use super::*;
use serde_json::json;

fn record(name: &str, references: &[&str], input: Value, output: Value) -> ReferenceRecord {
    serde_json::from_value(json!({
        "controllerName": name,
        "referenceNames": references,
        "IOChannels": { "input": input, "output": output },
    }))
    .expect("reference record")
}

fn pairs(rows: &[ReportRow]) -> Vec<(&str, &str, &str)> {
    rows.iter()
        .map(|row| {
            (
                row.module.as_str(),
                row.reference_name.as_str(),
                row.io_channel.as_str(),
            )
        })
        .collect()
}

#[test]
fn zips_found_record_and_marks_missing_module() {
    let references = vec![record("A", &["R1", "R2"], json!([1]), json!([2]))];

    let rows = resolve(["A", "B"], &references);

    assert_eq!(
        pairs(&rows),
        vec![("A", "R1", "[1]"), ("A", "R2", "[2]"), ("B", "N/A", "N/A")]
    );
}

#[test]
fn pads_shorter_side_with_empty_strings() {
    let references = vec![
        record("A", &["R1", "R2", "R3"], json!([1]), json!([2])),
        record("B", &["R9"], json!([3]), json!([4])),
    ];

    let rows = resolve(["A", "B"], &references);

    assert_eq!(
        pairs(&rows),
        vec![
            ("A", "R1", "[1]"),
            ("A", "R2", "[2]"),
            ("A", "R3", ""),
            ("B", "R9", "[3]"),
            ("B", "", "[4]"),
        ]
    );
}

#[test]
fn multi_value_channels_are_split_on_commas() {
    let references = vec![record("A", &["R1", "R2"], json!([1, 2]), json!([3]))];

    let rows = resolve(["A"], &references);

    assert_eq!(
        pairs(&rows),
        vec![("A", "R1", "[1"), ("A", "R2", "2]"), ("A", "", "[3]")]
    );
}

#[test]
fn string_channel_with_comma_spreads_over_positions() {
    let references = vec![record("A", &["R1"], json!(["AI,01"]), json!([]))];

    let rows = resolve(["A"], &references);

    assert_eq!(
        pairs(&rows),
        vec![("A", "R1", "[\"AI"), ("A", "", "01\"]"), ("A", "", "[]")]
    );
}

#[test]
fn first_matching_record_wins_and_order_follows_selection() {
    let references = vec![
        record("B", &["RB"], json!([7]), json!([])),
        record("A", &["first"], json!([]), json!([])),
        record("A", &["second"], json!([]), json!([])),
    ];

    let rows = resolve(vec!["A".to_string(), "B".to_string()], &references);

    assert_eq!(rows[0].reference_name, "first");
    assert_eq!(rows[0].io_channel, "[]");
    assert_eq!(rows.last().map(|row| row.module.as_str()), Some("B"));
    assert_eq!(rows[2].io_channel, "[7]");
}

#[test]
fn empty_reference_set_yields_one_placeholder_per_module() {
    let rows = resolve(["A", "B", "C"], &[]);
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|row| row.reference_name == MISSING && row.io_channel == MISSING));
}

#[test]
fn missing_channel_fields_render_as_empty_arrays() {
    let record: ReferenceRecord =
        serde_json::from_value(json!({ "controllerName": "A", "referenceNames": ["R1"] }))
            .expect("record without channels");
    assert_eq!(render_channels(&record.io_channels), "[], []");
}
