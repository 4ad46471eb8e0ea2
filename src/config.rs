//! Locations of configuration and rating tables
//!
//! Defaults point at the `data/` directory shipped with the crate and can be
//! overridden per-process through `PRICER_*` environment variables.

use std::path::PathBuf;

use crate::rating::{DEFAULT_TABLES_DIR, RATING_PLAN_FILE};
use crate::transform::loader::{CATEGORY_INDEX_FILE, CONTINUOUS_BANDING_FILE};

/// Default directory holding the transform configs and rating plan
pub const DEFAULT_CONFIG_DIR: &str = "data/config";

/// Default field identifying a quote in results
pub const DEFAULT_PRIMARY_ID: &str = "IDpol";

pub const ENV_CONFIG_DIR: &str = "PRICER_CONFIG_DIR";
pub const ENV_TABLES_DIR: &str = "PRICER_TABLES_DIR";
pub const ENV_PRIMARY_ID: &str = "PRICER_PRIMARY_ID";

/// Where the pipeline reads its configuration from
#[derive(Debug, Clone, PartialEq)]
pub struct PricerConfig {
    /// Directory of the category, banding and rating plan files
    pub config_dir: PathBuf,

    /// Directory of rating table CSV files
    pub tables_dir: PathBuf,

    pub category_file: String,
    pub banding_file: String,
    pub rating_plan_file: String,

    /// Field whose value identifies a quote
    pub primary_id: String,
}

impl Default for PricerConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            tables_dir: PathBuf::from(DEFAULT_TABLES_DIR),
            category_file: CATEGORY_INDEX_FILE.to_string(),
            banding_file: CONTINUOUS_BANDING_FILE.to_string(),
            rating_plan_file: RATING_PLAN_FILE.to_string(),
            primary_id: DEFAULT_PRIMARY_ID.to_string(),
        }
    }
}

impl PricerConfig {
    /// Defaults with `PRICER_*` environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (environment, test map, ...)
    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(dir) = lookup(ENV_CONFIG_DIR) {
            self.config_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_TABLES_DIR) {
            self.tables_dir = PathBuf::from(dir);
        }
        if let Some(id) = lookup(ENV_PRIMARY_ID) {
            self.primary_id = id;
        }
        self
    }

    /// Set both directories at once
    pub fn with_dirs<P: Into<PathBuf>, Q: Into<PathBuf>>(mut self, config_dir: P, tables_dir: Q) -> Self {
        self.config_dir = config_dir.into();
        self.tables_dir = tables_dir.into();
        self
    }

    pub fn category_path(&self) -> PathBuf {
        self.config_dir.join(&self.category_file)
    }

    pub fn banding_path(&self) -> PathBuf {
        self.config_dir.join(&self.banding_file)
    }

    pub fn rating_plan_path(&self) -> PathBuf {
        self.config_dir.join(&self.rating_plan_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_paths() {
        let config = PricerConfig::default();
        assert_eq!(config.category_path(), PathBuf::from("data/config/category-index.json"));
        assert_eq!(config.banding_path(), PathBuf::from("data/config/continuous-banding.json"));
        assert_eq!(config.rating_plan_path(), PathBuf::from("data/config/rating-plan.json"));
        assert_eq!(config.tables_dir, PathBuf::from("data/tables"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(ENV_TABLES_DIR, "/srv/tables"), (ENV_PRIMARY_ID, "QuoteId")]
            .into_iter()
            .collect();
        let config = PricerConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.config_dir, PathBuf::from(DEFAULT_CONFIG_DIR));
        assert_eq!(config.tables_dir, PathBuf::from("/srv/tables"));
        assert_eq!(config.primary_id, "QuoteId");
    }
}
