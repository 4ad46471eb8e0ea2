//! Continuous banding: numeric values to labelled buckets
//!
//! Each banded field carries an ordered list of interval rules. A value is
//! classified by the first rule whose interval contains it; later rules are
//! never consulted, so overlapping bands resolve by declaration order rather
//! than by position on the number line. Values outside every band get a
//! `Null` label.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PricingError, Result};
use crate::record::{FieldValue, PolicyRecord};

/// Suffix used for the output column when the config names none
pub const BAND_SUFFIX: &str = "Band";

fn default_true() -> bool {
    true
}

/// Interval boundary convention shared by all bands of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// `min <= v < max`
    ClosedOpen,
    /// `min <= v <= max`
    Closed,
    /// `min < v < max`
    Open,
    /// `min < v <= max`
    OpenClosed,
}

impl Interval {
    pub fn from_flags(min_inclusive: bool, max_exclusive: bool) -> Self {
        match (min_inclusive, max_exclusive) {
            (true, true) => Interval::ClosedOpen,
            (true, false) => Interval::Closed,
            (false, true) => Interval::Open,
            (false, false) => Interval::OpenClosed,
        }
    }

    pub fn contains(self, min: f64, max: f64, v: f64) -> bool {
        match self {
            Interval::ClosedOpen => min <= v && v < max,
            Interval::Closed => min <= v && v <= max,
            Interval::Open => min < v && v < max,
            Interval::OpenClosed => min < v && v <= max,
        }
    }
}

/// One labelled interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

impl Band {
    pub fn new(min: f64, max: f64, label: &str) -> Self {
        Self {
            min,
            max,
            label: label.to_string(),
        }
    }
}

/// Banding rules for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    pub bands: Vec<Band>,

    #[serde(default = "default_true")]
    pub min_inclusive: bool,

    #[serde(default = "default_true")]
    pub max_exclusive: bool,

    /// Output column; defaults to `<field>Band`
    #[serde(default, rename = "column_name", alias = "output_field")]
    pub output_field: Option<String>,
}

impl BandSpec {
    /// Half-open `[min, max)` bands, the most common layout
    pub fn half_open(bands: Vec<Band>) -> Self {
        Self {
            bands,
            min_inclusive: true,
            max_exclusive: true,
            output_field: None,
        }
    }

    pub fn with_output(mut self, output_field: &str) -> Self {
        self.output_field = Some(output_field.to_string());
        self
    }

    pub fn interval(&self) -> Interval {
        Interval::from_flags(self.min_inclusive, self.max_exclusive)
    }

    pub fn output_field_for(&self, field: &str) -> String {
        self.output_field
            .clone()
            .unwrap_or_else(|| format!("{}{}", field, BAND_SUFFIX))
    }

    /// Label of the first band containing `v`
    pub fn classify(&self, v: f64) -> Option<&str> {
        let interval = self.interval();
        self.bands
            .iter()
            .find(|b| interval.contains(b.min, b.max, v))
            .map(|b| b.label.as_str())
    }

    /// Band `field` of one record; `Ok(false)` when the value fell outside every band
    pub fn band_record(&self, field: &str, record_index: usize, record: &mut PolicyRecord) -> Result<bool> {
        let Some(value) = record.get(field) else {
            return Ok(true);
        };

        let label = match value {
            FieldValue::Null => None,
            FieldValue::Int(i) => self.classify(*i as f64).map(str::to_string),
            FieldValue::Float(f) => self.classify(*f).map(str::to_string),
            FieldValue::Text(_) => {
                return Err(PricingError::InvalidBandInput {
                    field: field.to_string(),
                    record: record_index,
                    found: value.describe(),
                });
            }
        };

        let matched = label.is_some();
        if !matched {
            debug!("No band matched {} for field '{}'", value.describe(), field);
        }
        record.insert(self.output_field_for(field), label);
        Ok(matched)
    }
}

/// Banding rules for all fields, keyed by input field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandConfig {
    fields: BTreeMap<String, BandSpec>,
}

impl BandConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: &str, spec: BandSpec) -> Self {
        self.fields.insert(field.to_string(), spec);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&BandSpec> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Band every configured field of one record
    ///
    /// Returns the number of values that matched no band.
    pub fn band_record(&self, record_index: usize, record: &mut PolicyRecord) -> Result<usize> {
        let mut misses = 0;
        for (field, spec) in &self.fields {
            if spec.bands.is_empty() {
                continue;
            }
            if !spec.band_record(field, record_index, record)? {
                misses += 1;
            }
        }
        Ok(misses)
    }

    /// Band a batch of records, failing fast on the first non-numeric input
    pub fn band(&self, mut records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>> {
        for (field, spec) in &self.fields {
            if spec.bands.is_empty() {
                warn!("Band config for '{}' has no bands; skipping", field);
            }
        }

        let mut misses = 0;
        for (i, record) in records.iter_mut().enumerate() {
            misses += self.band_record(i, record)?;
        }
        if misses > 0 {
            info!("Banding left {} values outside all bands as null", misses);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn veh_age_spec() -> BandSpec {
        BandSpec::half_open(vec![
            Band::new(0.0, 1.0, "0"),
            Band::new(1.0, 6.0, "1-5"),
            Band::new(6.0, 11.0, "6-10"),
        ])
    }

    #[test]
    fn test_inclusivity_flags() {
        assert!(Interval::ClosedOpen.contains(1.0, 6.0, 1.0));
        assert!(!Interval::ClosedOpen.contains(1.0, 6.0, 6.0));
        assert!(Interval::Closed.contains(1.0, 6.0, 6.0));
        assert!(!Interval::Open.contains(1.0, 6.0, 1.0));
        assert!(!Interval::Open.contains(1.0, 6.0, 6.0));
        assert!(!Interval::OpenClosed.contains(1.0, 6.0, 1.0));
        assert!(Interval::OpenClosed.contains(1.0, 6.0, 6.0));
    }

    #[test]
    fn test_boundaries_fall_into_next_band() {
        let spec = veh_age_spec();
        assert_eq!(spec.classify(1.0), Some("1-5"));
        assert_eq!(spec.classify(5.999), Some("1-5"));
        assert_eq!(spec.classify(6.0), Some("6-10"));
        // Exclusive top of the last band is outside every band
        assert_eq!(spec.classify(11.0), None);
    }

    #[test]
    fn test_open_closed_boundaries() {
        let mut spec = veh_age_spec();
        spec.min_inclusive = false;
        spec.max_exclusive = false;
        assert_eq!(spec.classify(1.0), Some("0"));
        assert_eq!(spec.classify(6.0), Some("1-5"));
        assert_eq!(spec.classify(0.0), None);
    }

    #[test]
    fn test_overlapping_bands_first_match_wins() {
        let spec = BandSpec::half_open(vec![
            Band::new(18.0, 100.0, "Adult"),
            Band::new(18.0, 25.0, "Young"),
            Band::new(0.0, 100.0, "Any"),
        ]);
        assert_eq!(spec.classify(20.0), Some("Adult"));
        assert_eq!(spec.classify(10.0), Some("Any"));
    }

    #[test]
    fn test_band_records_default_and_custom_output() {
        let config = BandConfig::new()
            .with_field("VehAge", veh_age_spec())
            .with_field(
                "DrivAge",
                BandSpec::half_open(vec![Band::new(18.0, 40.0, "18-39"), Band::new(40.0, 60.0, "40-59")])
                    .with_output("DrivAgeBand"),
            );
        let records = vec![PolicyRecord::from_pairs([
            ("VehAge", FieldValue::Int(3)),
            ("DrivAge", FieldValue::Float(45.0)),
        ])];

        let out = config.band(records).unwrap();
        assert_eq!(out[0].get("VehAgeBand"), Some(&FieldValue::from("1-5")));
        assert_eq!(out[0].get("DrivAgeBand"), Some(&FieldValue::from("40-59")));
    }

    #[test]
    fn test_no_match_emits_null_sentinel() {
        let config = BandConfig::new().with_field("VehAge", veh_age_spec());
        let out = config
            .band(vec![PolicyRecord::from_pairs([("VehAge", 40)])])
            .unwrap();
        assert_eq!(out[0].get("VehAgeBand"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_absent_field_skipped_but_text_is_error() {
        let config = BandConfig::new().with_field("VehAge", veh_age_spec());

        let out = config
            .band(vec![PolicyRecord::from_pairs([("Area", "D")])])
            .unwrap();
        assert!(!out[0].contains("VehAgeBand"));

        let err = config
            .band(vec![
                PolicyRecord::from_pairs([("VehAge", FieldValue::Int(2))]),
                PolicyRecord::from_pairs([("VehAge", FieldValue::from("three"))]),
            ])
            .unwrap_err();
        match err {
            PricingError::InvalidBandInput { field, record, .. } => {
                assert_eq!(field, "VehAge");
                assert_eq!(record, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_json_config_defaults() {
        let json = r#"{
            "VehAge": {"bands": [{"min": 0, "max": 1, "label": "0"}, {"min": 1, "max": 6, "label": "1-5"}]},
            "Density": {"bands": [{"min": 0, "max": 100, "label": "Rural"}],
                        "min_inclusive": false, "max_exclusive": false, "column_name": "DensityGroup"}
        }"#;
        let config: BandConfig = serde_json::from_str(json).unwrap();

        let veh_age = config.get("VehAge").unwrap();
        assert_eq!(veh_age.interval(), Interval::ClosedOpen);
        assert_eq!(veh_age.output_field_for("VehAge"), "VehAgeBand");

        let density = config.get("Density").unwrap();
        assert_eq!(density.interval(), Interval::OpenClosed);
        assert_eq!(density.output_field_for("Density"), "DensityGroup");
    }
}
