use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::types::EmailRecord;

/// Serialize records as quoted CSV under a `subject,body` header. Every
/// field is wrapped in double quotes with embedded quotes doubled; newlines
/// are flattened in the body column only, so the file stays one line per
/// email.
pub fn serialize(records: &[EmailRecord]) -> String {
    let mut csv = String::from("subject,body\n");
    for record in records {
        csv.push_str(&quote(&record.subject));
        csv.push(',');
        csv.push_str(&quote(&flatten_newlines(&record.body)));
        csv.push('\n');
    }
    csv
}

/// Overwrites any previous output; there is no append/merge across runs.
pub fn write_csv(path: &Path, records: &[EmailRecord]) -> Result<()> {
    fs::write(path, serialize(records))?;
    Ok(())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Each newline becomes a single space; carriage returns are dropped.
fn flatten_newlines(body: &str) -> String {
    body.replace('\n', " ").replace('\r', "")
}
