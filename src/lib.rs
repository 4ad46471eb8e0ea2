//! Policy Pricer - configuration-driven rating pipeline for insurance quotes
//!
//! This library provides:
//! - Category indexing of categorical policy fields
//! - Continuous banding with ordered, first-match-wins interval rules
//! - A cached rating table store
//! - Sequential table joins composing a multiplicative premium
//! - A pipeline orchestrator with pluggable per-record transforms

pub mod config;
pub mod error;
pub mod pipeline;
pub mod quote;
pub mod rating;
pub mod record;
pub mod transform;

// Re-export commonly used types
pub use config::PricerConfig;
pub use error::{PricingError, Result};
pub use pipeline::{Pipeline, PipelineContext, PipelineStage, RecordTransform};
pub use quote::{BatchSummary, QuoteResult};
pub use rating::{RatingComposer, RatingPlan, RatingTable, RatingTableStore, TableSpec};
pub use record::{FieldValue, PolicyRecord};
pub use transform::{BandConfig, BandSpec, CategoryConfig};
