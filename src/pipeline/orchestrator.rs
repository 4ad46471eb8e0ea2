//! Pipeline orchestrator: RAW -> INDEXED -> BANDED -> RATED
//!
//! Each stage reads only the loaded context, so running the same batch
//! through the same context twice yields identical records. Indexing and
//! banding work record by record; banding aborts the batch on the first
//! non-numeric input. Rating loads every table before touching a record.

use log::{debug, info, warn};
use rayon::prelude::*;

use super::{PipelineContext, PipelineStage, RecordTransform, TransformRegistry};
use crate::error::{PricingError, Result};
use crate::quote::QuoteResult;
use crate::rating::{RatingComposer, RatingPlan, RatingTableStore};
use crate::record::PolicyRecord;
use crate::transform::{BandConfig, CategoryConfig};

/// Runs batches of records through the loaded context
#[derive(Debug)]
pub struct Pipeline {
    context: PipelineContext,
    transforms: TransformRegistry,
}

impl Pipeline {
    pub fn new(context: PipelineContext) -> Self {
        Self {
            context,
            transforms: TransformRegistry::new(),
        }
    }

    /// Use a prepared set of user transforms
    pub fn with_transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    /// Register one user transform; lower priorities run first
    pub fn register_transform<T: RecordTransform + 'static>(&mut self, priority: i32, transform: T) {
        self.transforms.register(priority, transform);
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Full run, RAW to RATED
    pub fn process(&self, records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>> {
        self.run_until(records, PipelineStage::Rated)
    }

    /// Full run with records partitioned across threads
    pub fn process_parallel(&self, records: Vec<PolicyRecord>) -> Result<Vec<PolicyRecord>> {
        self.run(records, PipelineStage::Rated, true)
    }

    /// Run the stages up to and including `target`
    pub fn run_until(&self, records: Vec<PolicyRecord>, target: PipelineStage) -> Result<Vec<PolicyRecord>> {
        self.run(records, target, false)
    }

    fn run(&self, mut records: Vec<PolicyRecord>, target: PipelineStage, parallel: bool) -> Result<Vec<PolicyRecord>> {
        info!("Processing {} records up to {}", records.len(), target);
        records = self.apply_transforms(records, parallel)?;

        let mut stage = PipelineStage::Raw;
        while let Some(next) = stage.next().filter(|s| *s <= target) {
            records = match next {
                PipelineStage::Raw => records,
                PipelineStage::Indexed => self.index_stage(records, parallel),
                PipelineStage::Banded => self.band_stage(records, parallel)?,
                PipelineStage::Rated => self.rate_stage(records, parallel)?,
            };
            debug!("{} -> {} ({} records)", stage, next, records.len());
            stage = next;
        }

        Ok(records)
    }

    fn apply_transforms(&self, mut records: Vec<PolicyRecord>, parallel: bool) -> Result<Vec<PolicyRecord>> {
        if self.transforms.is_empty() {
            return Ok(records);
        }
        debug!("Applying transforms {:?}", self.transforms.names());

        if parallel {
            records
                .par_iter_mut()
                .enumerate()
                .try_for_each(|(i, r)| self.transforms.apply(i, r))?;
        } else {
            for (i, record) in records.iter_mut().enumerate() {
                self.transforms.apply(i, record)?;
            }
        }
        Ok(records)
    }

    fn index_stage(&self, mut records: Vec<PolicyRecord>, parallel: bool) -> Vec<PolicyRecord> {
        let category = &self.context.category;
        if category.is_empty() {
            info!("No category config; indexing skipped");
            return records;
        }
        if !parallel {
            return category.index(records);
        }

        let unmapped: usize = records.par_iter_mut().map(|r| category.index_record(r)).sum();
        if unmapped > 0 {
            info!("Category indexing left {} unmapped values as null", unmapped);
        }
        records
    }

    fn band_stage(&self, mut records: Vec<PolicyRecord>, parallel: bool) -> Result<Vec<PolicyRecord>> {
        let bands = &self.context.bands;
        if bands.is_empty() {
            info!("No band config; banding skipped");
            return Ok(records);
        }
        if !parallel {
            return bands.band(records);
        }

        let misses: usize = records
            .par_iter_mut()
            .enumerate()
            .map(|(i, r)| bands.band_record(i, r))
            .collect::<Result<Vec<usize>>>()?
            .into_iter()
            .sum();
        if misses > 0 {
            info!("Banding left {} values outside all bands as null", misses);
        }
        Ok(records)
    }

    fn rate_stage(&self, records: Vec<PolicyRecord>, parallel: bool) -> Result<Vec<PolicyRecord>> {
        let plan = &self.context.plan;
        if plan.is_empty() {
            warn!("Rating plan is empty; rating skipped");
            return Ok(records);
        }

        let composer = RatingComposer::new(&self.context.store, plan.options.clone());
        if parallel {
            composer.rate_parallel(records, &plan.tables)
        } else {
            composer.rate(records, &plan.tables)
        }
    }

    /// Price a single quote and report the fields the pipeline added
    ///
    /// A quote dropped by a join miss is reported as `NoRatingMatch`.
    pub fn quote(&self, record: PolicyRecord) -> Result<QuoteResult> {
        let raw = record.clone();
        let rated = self.process(vec![record])?;

        match rated.into_iter().next() {
            Some(rated) => Ok(QuoteResult::from_records(&raw, &rated, &self.context.primary_id)),
            None => Err(PricingError::NoRatingMatch {
                table: self.first_missing_table(&raw).unwrap_or_default(),
                record: 0,
            }),
        }
    }

    /// First table that leaves this quote without a match, for error reporting
    fn first_missing_table(&self, raw: &PolicyRecord) -> Option<String> {
        let staged = self.run_until(vec![raw.clone()], PipelineStage::Banded).ok()?;
        let record = staged.into_iter().next()?;
        let composer = RatingComposer::new(&self.context.store, self.context.plan.options.clone());
        let tables = composer.prepare(&self.context.plan.tables).ok()?;
        tables
            .iter()
            .find(|t| t.match_row(&record).is_none())
            .map(|t| t.name().to_string())
    }
}

/// One-shot run without a pre-built context
pub fn process(
    records: Vec<PolicyRecord>,
    category: &CategoryConfig,
    bands: &BandConfig,
    plan: &RatingPlan,
    store: &RatingTableStore,
) -> Result<Vec<PolicyRecord>> {
    let records = category.index(records);
    let records = bands.band(records)?;
    if plan.is_empty() {
        return Ok(records);
    }
    RatingComposer::new(store, plan.options.clone()).rate(records, &plan.tables)
}
