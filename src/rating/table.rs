//! Rating tables loaded from CSV

use csv::Reader;
use std::io::Read;
use std::path::Path;

use crate::error::{PricingError, Result};
use crate::record::FieldValue;

/// A named factor table: header plus rows of typed cells
///
/// Which columns are keys and which are factors is decided by the rating
/// plan that joins against it, not by the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl RatingTable {
    pub fn new(name: &str, columns: Vec<String>, rows: Vec<Vec<FieldValue>>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Parse a table from CSV text with a header row
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut csv_reader = Reader::from_reader(reader);
        let columns: Vec<String> = csv_reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(FieldValue::infer).collect());
        }

        Ok(Self::new(name, columns, rows))
    }

    /// Load a table file; a missing file is `RatingTableNotFound`
    pub fn from_path(name: &str, path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PricingError::RatingTableNotFound {
                table: name.to_string(),
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(name, std::io::BufReader::new(file))
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Like `column_index` but a missing column is an error
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| PricingError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
