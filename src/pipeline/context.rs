//! Pre-loaded pipeline configuration
//!
//! Configs and the table store are loaded once and then only read, so one
//! context can serve any number of pipeline runs, including concurrent ones.

use log::{info, warn};

use crate::config::{PricerConfig, DEFAULT_PRIMARY_ID};
use crate::error::Result;
use crate::rating::{RatingPlan, RatingTableStore};
use crate::transform::{load_band_config, load_category_config, BandConfig, CategoryConfig};

#[derive(Debug)]
pub struct PipelineContext {
    pub category: CategoryConfig,
    pub bands: BandConfig,
    pub plan: RatingPlan,
    pub store: RatingTableStore,

    /// Field whose value identifies a quote in results
    pub primary_id: String,
}

impl PipelineContext {
    pub fn new(category: CategoryConfig, bands: BandConfig, plan: RatingPlan, store: RatingTableStore) -> Self {
        Self {
            category,
            bands,
            plan,
            store,
            primary_id: DEFAULT_PRIMARY_ID.to_string(),
        }
    }

    /// Load configs and the rating plan from the configured locations
    ///
    /// Rating tables themselves are loaded lazily by the store on first use;
    /// call `preload_tables` to fail early on missing tables.
    pub fn load(config: &PricerConfig) -> Result<Self> {
        let category = load_category_config(&config.category_path())?;
        let bands = load_band_config(&config.banding_path())?;
        let plan = RatingPlan::load(&config.rating_plan_path())?;

        if plan.is_empty() {
            warn!("Rating plan {} has no tables; rating will be skipped", config.rating_plan_path().display());
        }
        info!(
            "Loaded pipeline config: {} category fields, {} banded fields, {} rating tables",
            category.fields().count(),
            bands.fields().count(),
            plan.tables.len()
        );

        Ok(Self {
            category,
            bands,
            plan,
            store: RatingTableStore::new(config.tables_dir.clone()),
            primary_id: config.primary_id.clone(),
        })
    }

    pub fn with_primary_id(mut self, primary_id: &str) -> Self {
        self.primary_id = primary_id.to_string();
        self
    }

    /// Load every table named by the plan into the store
    pub fn preload_tables(&self) -> Result<()> {
        for spec in &self.plan.tables {
            self.store.load(&spec.table_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PricingError;
    use tempfile::TempDir;

    #[test]
    fn test_load_shipped_data() {
        let context = PipelineContext::load(&PricerConfig::default()).unwrap();
        assert!(!context.category.is_empty());
        assert!(!context.bands.is_empty());
        assert_eq!(context.plan.tables.len(), 3);

        context.preload_tables().unwrap();
        assert_eq!(context.store.len(), 3);
    }

    #[test]
    fn test_load_empty_dir_gives_empty_context() {
        let dir = TempDir::new().unwrap();
        let config = PricerConfig::default().with_dirs(dir.path(), dir.path());

        let context = PipelineContext::load(&config).unwrap();
        assert!(context.category.is_empty());
        assert!(context.bands.is_empty());
        assert!(context.plan.is_empty());
    }

    #[test]
    fn test_preload_reports_missing_table() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("rating-plan.json"),
            r#"{"tables": [{"table_name": "area_base", "join_keys": ["Area"]}]}"#,
        )
        .unwrap();
        let config = PricerConfig::default().with_dirs(dir.path(), dir.path());

        let context = PipelineContext::load(&config).unwrap();
        let err = context.preload_tables().unwrap_err();
        assert!(matches!(err, PricingError::RatingTableNotFound { .. }));
    }
}
