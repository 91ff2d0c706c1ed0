//! Writers for downloaded TSML data.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Output format for downloaded sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Pretty-printed JSON array.
    #[default]
    Json,
    /// CSV with one column per key.
    Csv,
}

impl Format {
    /// File extension for the format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write records to `path` in the given format.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write(records: &[Value], format: Format, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    match format {
        Format::Json => write_json(records, &mut out)?,
        Format::Csv => write_csv(records, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// Pretty-print records as JSON with two-space indentation.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_json<W: Write>(records: &[Value], out: W) -> Result<()> {
    let mut serializer = serde_json::Serializer::pretty(out);
    records.serialize(&mut serializer)?;
    Ok(())
}

/// Write records as CSV.
///
/// The header is the union of all object keys with `id` first and the rest
/// sorted. List values are joined with `|` and missing keys are left empty.
/// Nothing is written when there are no keys.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(records: &[Value], out: W) -> Result<()> {
    let header = csv_header(records);
    if header.is_empty() {
        return Ok(());
    }
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);
    writer.write_record(&header)?;
    for record in records {
        writer.write_record(
            header
                .iter()
                .map(|key| record.get(key).map(cell).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_header(records: &[Value]) -> Vec<String> {
    let keys: BTreeSet<&String> = records
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|object| object.keys())
        .collect();
    let has_id = keys.iter().any(|key| *key == "id");
    let rest = keys.into_iter().filter(|key| *key != "id").cloned();
    if has_id {
        std::iter::once("id".to_string()).chain(rest).collect()
    } else {
        rest.collect()
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("|"),
        other => other.to_string(),
    }
}
