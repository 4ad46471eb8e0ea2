//! Rating plan: the ordered table specs plus composition options

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::transform::loader::load_optional_json;

/// Default file name of the rating plan
pub const RATING_PLAN_FILE: &str = "rating-plan.json";

/// Output field holding the first table's factor
pub const BASE_PREMIUM_FIELD: &str = "base_premium";

/// Output field holding the composed, rounded premium
pub const FINAL_PREMIUM_FIELD: &str = "final_premium";

/// One step of the rating chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub table_name: String,
    pub join_keys: Vec<String>,

    /// Column multiplied into the premium; required when the table has several factors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_column: Option<String>,
}

impl TableSpec {
    pub fn new(table_name: &str, join_keys: &[&str]) -> Self {
        Self {
            table_name: table_name.to_string(),
            join_keys: join_keys.iter().map(|k| k.to_string()).collect(),
            factor_column: None,
        }
    }

    pub fn with_factor_column(mut self, column: &str) -> Self {
        self.factor_column = Some(column.to_string());
        self
    }
}

/// What happens to a record with no matching row in a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMissPolicy {
    /// Inner-join semantics: the record leaves the result set
    #[default]
    Drop,
    /// Abort the batch with `NoRatingMatch`
    Error,
}

/// Tie-break used when rounding the final premium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// 2.345 -> 2.35, -2.345 -> -2.35
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding: 2.345 -> 2.34
    HalfEven,
}

impl RoundingMode {
    /// Round `value` to `decimals` places
    pub fn round(self, value: f64, decimals: u32) -> f64 {
        let scale = 10f64.powi(decimals as i32);
        let mut scaled = value * scale;
        // Snap to 1e-9 of a unit first so 104.50000000000001 is not a false non-tie
        let snapped = scaled * 1e9;
        if snapped.is_finite() {
            scaled = snapped.round() / 1e9;
        }
        let rounded = match self {
            RoundingMode::HalfAwayFromZero => scaled.round(),
            RoundingMode::HalfEven => scaled.round_ties_even(),
        };
        rounded / scale
    }
}

fn default_decimals() -> u32 {
    2
}

/// Composition options shared by every table in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingOptions {
    #[serde(default)]
    pub join_miss: JoinMissPolicy,

    #[serde(default)]
    pub rounding: RoundingMode,

    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl Default for RatingOptions {
    fn default() -> Self {
        Self {
            join_miss: JoinMissPolicy::Drop,
            rounding: RoundingMode::HalfAwayFromZero,
            decimals: 2,
        }
    }
}

impl RatingOptions {
    /// Options that reject join misses instead of dropping records
    pub fn strict() -> Self {
        Self {
            join_miss: JoinMissPolicy::Error,
            ..Default::default()
        }
    }
}

/// Ordered rating tables; order matters, the first table supplies the base premium
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingPlan {
    #[serde(default)]
    pub tables: Vec<TableSpec>,

    #[serde(flatten)]
    pub options: RatingOptions,
}

impl RatingPlan {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self {
            tables,
            options: RatingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RatingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Load a plan file; an absent or blank file gives an empty plan
    pub fn load(path: &Path) -> Result<Self> {
        Ok(load_optional_json(path)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rounding_modes() {
        assert_eq!(RoundingMode::HalfAwayFromZero.round(2.345, 2), 2.35);
        assert_eq!(RoundingMode::HalfEven.round(2.345, 2), 2.34);
        assert_eq!(RoundingMode::HalfEven.round(2.355, 2), 2.36);
        assert_eq!(RoundingMode::HalfAwayFromZero.round(-2.345, 2), -2.35);
        assert_eq!(RoundingMode::HalfAwayFromZero.round(100.0 * 1.10 * 0.95, 2), 104.5);
        assert_eq!(RoundingMode::HalfEven.round(123.4799999, 2), 123.48);
    }

    #[test]
    fn test_rounding_huge_values_stay_finite() {
        for mode in [RoundingMode::HalfAwayFromZero, RoundingMode::HalfEven] {
            let rounded = mode.round(1e300, 2);
            assert!(rounded.is_finite());
            assert_relative_eq!(rounded, 1e300, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_parse_plan() {
        let json = r#"{
            "tables": [
                {"table_name": "area_base", "join_keys": ["Area"]},
                {"table_name": "power_age_factor", "join_keys": ["PowerGroup", "DrivAgeBand"],
                 "factor_column": "PowerAgeFactor"}
            ],
            "join_miss": "error",
            "rounding": "half_even"
        }"#;
        let plan: RatingPlan = serde_json::from_str(json).unwrap();

        assert_eq!(plan.tables.len(), 2);
        assert_eq!(plan.tables[1].join_keys, vec!["PowerGroup", "DrivAgeBand"]);
        assert_eq!(plan.tables[1].factor_column.as_deref(), Some("PowerAgeFactor"));
        assert_eq!(plan.options.join_miss, JoinMissPolicy::Error);
        assert_eq!(plan.options.rounding, RoundingMode::HalfEven);
        assert_eq!(plan.options.decimals, 2);
    }

    #[test]
    fn test_plan_defaults() {
        let plan: RatingPlan = serde_json::from_str(r#"{"tables": []}"#).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.options, RatingOptions::default());
    }
}
