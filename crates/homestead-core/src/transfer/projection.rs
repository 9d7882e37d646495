//! CSV projection of a bundle
//!
//! CSV holds exactly one collection: the first non-empty one in registry
//! order. Every other collection in the scope is dropped from the artifact.
//! The header is the comma-joined keys of that collection's first record,
//! quoted only where a name needs it; every data cell is double-quoted.

use csv::{QuoteStyle, WriterBuilder};
use serde_json::Value;

use super::error::TransferResult;
use crate::models::Record;

/// Render the first non-empty collection as CSV
///
/// Returns the collection name alongside the bytes, or `None` when every
/// collection is empty.
pub fn project_first_collection<'a, I>(collections: I) -> TransferResult<Option<(String, Vec<u8>)>>
where
    I: IntoIterator<Item = &'a (String, Vec<Record>)>,
{
    let Some((name, records)) = collections
        .into_iter()
        .find(|(_, records)| !records.is_empty())
    else {
        return Ok(None);
    };

    Ok(Some((name.clone(), records_to_csv(records)?)))
}

/// Render records as CSV using the first record's keys as the header
pub fn records_to_csv(records: &[Record]) -> TransferResult<Vec<u8>> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let header: Vec<&str> = first.keys().map(String::as_str).collect();

    // Header names are quoted only when they contain a delimiter or quote
    let mut header_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .has_headers(false)
        .from_writer(Vec::new());
    header_writer.write_record(&header)?;
    let out = header_writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .has_headers(false)
        .from_writer(out);

    for record in records {
        let row = header
            .iter()
            .map(|key| render_cell(record.get(key)));
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()).into())
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_header_unquoted_and_cells_quoted() {
        let records = vec![
            record(json!({"id": "t-1", "title": "Water beds", "done": false})),
            record(json!({"id": "t-2", "title": "Feed hens", "done": true})),
        ];

        let csv = String::from_utf8(records_to_csv(&records).unwrap()).unwrap();

        assert_eq!(
            csv,
            "id,title,done\n\"t-1\",\"Water beds\",\"false\"\n\"t-2\",\"Feed hens\",\"true\"\n"
        );
    }

    #[test]
    fn test_cells_escape_quotes_and_flatten_nested_values() {
        let records = vec![record(json!({
            "id": "a-1",
            "name": "Big \"Red\"",
            "tags": ["dairy", "jersey"],
            "notes": null
        }))];

        let csv = String::from_utf8(records_to_csv(&records).unwrap()).unwrap();
        let row = csv.lines().nth(1).unwrap();

        assert_eq!(
            row,
            r#""a-1","Big ""Red""","[""dairy"",""jersey""]","""#
        );
    }

    #[test]
    fn test_header_quotes_names_with_delimiters() {
        let records = vec![record(json!({"id": "x", "a,b": "v", "say \"hi\"": 1}))];

        let bytes = records_to_csv(&records).unwrap();
        let csv = String::from_utf8(bytes.clone()).unwrap();

        assert_eq!(csv.lines().next().unwrap(), r#"id,"a,b","say ""hi""""#);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(headers.len(), 3);
        assert_eq!(&headers[1], "a,b");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), headers.len());
    }

    #[test]
    fn test_rows_follow_first_record_keys() {
        let records = vec![
            record(json!({"id": "s-1", "variety": "Brandywine"})),
            record(json!({"id": "s-2", "extra": "dropped"})),
        ];

        let csv = String::from_utf8(records_to_csv(&records).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines, ["id,variety", "\"s-1\",\"Brandywine\"", "\"s-2\",\"\""]);
    }

    #[test]
    fn test_project_picks_first_non_empty_collection() {
        let collections = vec![
            ("tasks".to_string(), vec![]),
            (
                "notification_tasks".to_string(),
                vec![record(json!({"id": "n-1"}))],
            ),
            ("budgets".to_string(), vec![record(json!({"id": "b-1"}))]),
        ];

        let (name, bytes) = project_first_collection(&collections).unwrap().unwrap();
        let csv = String::from_utf8(bytes).unwrap();

        assert_eq!(name, "notification_tasks");
        assert_eq!(csv, "id\n\"n-1\"\n");
    }

    #[test]
    fn test_project_all_empty() {
        let collections: Vec<(String, Vec<Record>)> = vec![("tasks".to_string(), vec![])];
        assert!(project_first_collection(&collections).unwrap().is_none());
    }
}
