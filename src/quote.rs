//! Quote results and batch summaries for callers of the pipeline

use serde::Serialize;

use crate::rating::FINAL_PREMIUM_FIELD;
use crate::record::PolicyRecord;

/// Premium and rating details for a single quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteResult {
    /// Value of the primary id field, if the quote carried one
    pub quote_id: Option<String>,

    /// `final_premium`, absent when the plan has no tables
    pub premium: Option<f64>,

    /// Fields the pipeline added to the raw quote, in order
    pub premium_details: PolicyRecord,
}

impl QuoteResult {
    pub fn from_records(raw: &PolicyRecord, rated: &PolicyRecord, primary_id: &str) -> Self {
        Self {
            quote_id: raw
                .get(primary_id)
                .filter(|v| !v.is_null())
                .map(|v| v.to_string()),
            premium: rated.get_f64(FINAL_PREMIUM_FIELD),
            premium_details: rated.added_since(raw),
        }
    }
}

/// Aggregate view of one rated batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub input_records: usize,
    pub rated_records: usize,
    pub dropped_records: usize,
    pub total_premium: f64,
    pub mean_premium: f64,
    pub min_premium: f64,
    pub max_premium: f64,
}

impl BatchSummary {
    pub fn from_records(input_records: usize, rated: &[PolicyRecord]) -> Self {
        let premiums: Vec<f64> = rated.iter().filter_map(|r| r.get_f64(FINAL_PREMIUM_FIELD)).collect();

        let mut summary = Self {
            input_records,
            rated_records: rated.len(),
            dropped_records: input_records.saturating_sub(rated.len()),
            ..Default::default()
        };
        if premiums.is_empty() {
            return summary;
        }

        summary.total_premium = premiums.iter().sum();
        summary.mean_premium = summary.total_premium / premiums.len() as f64;
        summary.min_premium = premiums.iter().copied().fold(f64::INFINITY, f64::min);
        summary.max_premium = premiums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        summary
    }
}
