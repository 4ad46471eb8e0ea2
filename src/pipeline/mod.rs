//! Pipeline orchestration over batches of policy records

mod context;
mod orchestrator;
mod strategy;

pub use context::PipelineContext;
pub use orchestrator::{process, Pipeline};
pub use strategy::{
    driver_age_band, power_group, BandTransform, FnTransform, RecordTransform, TransformRegistry,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage a batch has reached; stages only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Raw,
    Indexed,
    Banded,
    Rated,
}

impl PipelineStage {
    pub fn next(self) -> Option<Self> {
        match self {
            PipelineStage::Raw => Some(PipelineStage::Indexed),
            PipelineStage::Indexed => Some(PipelineStage::Banded),
            PipelineStage::Banded => Some(PipelineStage::Rated),
            PipelineStage::Rated => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Raw => "RAW",
            PipelineStage::Indexed => "INDEXED",
            PipelineStage::Banded => "BANDED",
            PipelineStage::Rated => "RATED",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
