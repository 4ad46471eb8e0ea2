//! Load policy records from JSON/CSV files and write rated records back out

use csv::{Reader, Writer};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{FieldValue, PolicyRecord};
use crate::error::{PricingError, Result};

/// Extensions the loaders understand
pub const SUPPORTED_FORMATS: [&str; 2] = ["json", "csv"];

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum JsonQuotes {
    One(PolicyRecord),
    Many(Vec<PolicyRecord>),
}

/// Load records from a JSON value holding one quote object or an array of them
pub fn load_json_from_reader<R: Read>(reader: R) -> Result<Vec<PolicyRecord>> {
    let quotes: JsonQuotes = serde_json::from_reader(reader)?;
    Ok(match quotes {
        JsonQuotes::One(record) => vec![record],
        JsonQuotes::Many(records) => records,
    })
}

/// Load records from CSV with a header row, inferring each cell's type
pub fn load_csv_from_reader<R: Read>(reader: R) -> Result<Vec<PolicyRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for result in csv_reader.records() {
        let row = result?;
        let record = PolicyRecord::from_pairs(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name, FieldValue::infer(cell))),
        );
        records.push(record);
    }

    Ok(records)
}

/// Load a single `.json` or `.csv` file
pub fn load_file(path: &Path) -> Result<Vec<PolicyRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let file = BufReader::new(File::open(path)?);
    let records = match extension.as_str() {
        "json" => load_json_from_reader(file)?,
        "csv" => load_csv_from_reader(file)?,
        other => return Err(PricingError::UnsupportedFormat(format!(".{}", other))),
    };

    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Supported data files under `dir` (recursive), sorted by path
///
/// Directory symlinks are followed; entries walkdir cannot read, including
/// symlink loops, are skipped with a warning.
pub fn find_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping directory entry: {}", err);
                continue;
            }
        };
        if entry.file_type().is_file() && has_supported_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_FORMATS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load records from a file, or concatenate every data file in a directory
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<PolicyRecord>> {
    let path = path.as_ref();
    if !path.is_dir() {
        return load_file(path);
    }

    let mut records = Vec::new();
    let files = find_data_files(path)?;
    for file in &files {
        records.extend(load_file(file)?);
    }

    info!(
        "Loaded {} records from {} files in {}",
        records.len(),
        files.len(),
        path.display()
    );
    Ok(records)
}

/// Write records as CSV; the header is the union of field names in first-seen order
pub fn write_records_csv<W: Write>(writer: W, records: &[PolicyRecord]) -> Result<()> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| record.get(c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Write records as a pretty-printed JSON array
pub fn write_records_json<W: Write>(writer: W, records: &[PolicyRecord]) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}
