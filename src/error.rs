//! Error taxonomy for the rating pipeline
//!
//! Only fatal conditions live here. Non-fatal ones (missing config, absent
//! fields, unmapped categories, values outside every band, dropped join
//! misses) degrade to pass-through or null values and are logged instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Result type for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;

/// Errors raised by the pricing pipeline
#[derive(Debug, Error)]
pub enum PricingError {
    /// A banded field held a non-numeric value
    #[error("banding stage: field '{field}' in record {record} is not numeric (found {found})")]
    InvalidBandInput {
        field: String,
        record: usize,
        found: String,
    },

    /// A configured rating table file does not exist
    #[error("rating table '{table}' not found at {}", path.display())]
    RatingTableNotFound { table: String, path: PathBuf },

    /// A record had no matching row and the join-miss policy is `Error`
    #[error("rating stage: record {record} has no matching row in table '{table}'")]
    NoRatingMatch { table: String, record: usize },

    /// A join key or factor column is missing from a rating table
    #[error("rating table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Two rows of a rating table share the same join key combination
    #[error("rating table '{table}' has duplicate rows for key {key}")]
    DuplicateRatingKey { table: String, key: String },

    /// A factor cell could not be read as a number
    #[error("rating table '{table}' row {row}: factor column '{column}' holds non-numeric value '{value}'")]
    InvalidFactor {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    /// A table has several factor columns and its plan entry named none
    #[error("rating table '{table}' has several factor columns {candidates:?}; set factor_column")]
    AmbiguousFactorColumn {
        table: String,
        candidates: Vec<String>,
    },

    /// A table row has fewer cells than the table has columns
    #[error("rating table '{table}' row {row} has {found} cells, expected {expected}")]
    ShortRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A table has no column besides its join keys
    #[error("rating table '{table}' has no factor column")]
    NoFactorColumn { table: String },

    /// A registered user transform failed
    #[error("transform '{name}' failed: {reason}")]
    Transform { name: String, reason: String },

    /// A configuration file exists but could not be parsed
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Input file with an extension no loader understands
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    /// Pipeline stage the error aborted, if it belongs to one
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PricingError::Transform { .. } => Some(PipelineStage::Raw),
            PricingError::InvalidBandInput { .. } => Some(PipelineStage::Banded),
            PricingError::RatingTableNotFound { .. }
            | PricingError::NoRatingMatch { .. }
            | PricingError::MissingColumn { .. }
            | PricingError::DuplicateRatingKey { .. }
            | PricingError::ShortRow { .. }
            | PricingError::InvalidFactor { .. }
            | PricingError::AmbiguousFactorColumn { .. }
            | PricingError::NoFactorColumn { .. } => Some(PipelineStage::Rated),
            _ => None,
        }
    }
}
