//! Category indexing: raw categorical values to integer indices

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::{FieldValue, PolicyRecord};

/// Suffix appended to a field name for its index column
pub const INDEX_SUFFIX: &str = "_indexed";

/// Name of the index column produced for `field`
pub fn indexed_field_name(field: &str) -> String {
    format!("{}{}", field, INDEX_SUFFIX)
}

/// Per-field lookup of raw value -> index
///
/// Fields are kept sorted so output column order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryConfig {
    fields: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CategoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the mapping for one field
    pub fn with_field<K, I>(mut self, field: &str, mapping: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, u32)>,
    {
        self.fields.insert(
            field.to_string(),
            mapping.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Index for a raw value, `None` when the field or value is unmapped
    pub fn lookup(&self, field: &str, value: &FieldValue) -> Option<u32> {
        let mapping = self.fields.get(field)?;
        let key = value.canonical_text()?;
        mapping.get(&key).copied()
    }

    /// Append `<field>_indexed` for every configured field present in the record
    ///
    /// Returns how many values were present but unmapped.
    pub fn index_record(&self, record: &mut PolicyRecord) -> usize {
        let mut unmapped = 0;
        for field in self.fields.keys() {
            let Some(value) = record.get(field) else {
                continue;
            };
            let index = self.lookup(field, value);
            if index.is_none() {
                debug!("Unmapped value {} for category field '{}'", value.describe(), field);
                unmapped += 1;
            }
            record.insert(indexed_field_name(field), index.map(|i| i as i64));
        }
        unmapped
    }

    /// Index a batch of records; never fails, unknown categories become null
    pub fn index(&self, mut records: Vec<PolicyRecord>) -> Vec<PolicyRecord> {
        let unmapped: usize = records.iter_mut().map(|r| self.index_record(r)).sum();
        if unmapped > 0 {
            info!("Category indexing left {} unmapped values as null", unmapped);
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_config() -> CategoryConfig {
        CategoryConfig::new()
            .with_field("Area", [("A", 0), ("B", 1), ("D", 2)])
            .with_field("VehPower", [("4", 0), ("7", 3)])
    }

    #[test]
    fn test_index_maps_present_fields() {
        let records = vec![PolicyRecord::from_pairs([
            ("Area", FieldValue::from("D")),
            ("VehPower", FieldValue::Int(7)),
        ])];

        let out = area_config().index(records);
        assert_eq!(out[0].get("Area_indexed"), Some(&FieldValue::Int(2)));
        assert_eq!(out[0].get("VehPower_indexed"), Some(&FieldValue::Int(3)));
        // Raw fields untouched
        assert_eq!(out[0].get("Area"), Some(&FieldValue::from("D")));
    }

    #[test]
    fn test_unmapped_value_is_null() {
        let records = vec![PolicyRecord::from_pairs([("Area", "Z")])];
        let out = area_config().index(records);
        assert_eq!(out[0].get("Area_indexed"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_absent_field_skipped() {
        let records = vec![PolicyRecord::from_pairs([("Region", "R82")])];
        let out = area_config().index(records);
        assert!(!out[0].contains("Area_indexed"));
        assert!(!out[0].contains("VehPower_indexed"));
        assert_eq!(out[0].len(), 1);
    }

    #[test]
    fn test_index_is_deterministic() {
        let records = vec![
            PolicyRecord::from_pairs([("VehPower", FieldValue::Int(4)), ("Area", FieldValue::from("B"))]),
            PolicyRecord::from_pairs([("Area", FieldValue::from("Q"))]),
        ];
        let config = area_config();

        let first = config.index(records.clone());
        let second = config.index(records);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{"Area": {"A": 0, "D": 3}, "VehGas": {"Diesel": 0, "Regular": 1}}"#;
        let config: CategoryConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.lookup("Area", &FieldValue::from("D")), Some(3));
        assert_eq!(config.lookup("VehGas", &FieldValue::from("Regular")), Some(1));
        assert_eq!(config.lookup("VehBrand", &FieldValue::from("B12")), None);
    }
}
