//! Pluggable record transforms run ahead of indexing
//!
//! User transforms are registered values implementing `RecordTransform`,
//! ordered by priority. They operate on one record at a time so a batch can
//! be split across threads without changing results.

use log::debug;
use std::fmt;

use crate::error::{PricingError, Result};
use crate::record::PolicyRecord;
use crate::transform::{Band, BandSpec};

/// A named, per-record transform
pub trait RecordTransform: Send + Sync {
    fn name(&self) -> &str;

    /// Transform one record in place; `record_index` is its position in the batch
    fn apply(&self, record_index: usize, record: &mut PolicyRecord) -> Result<()>;
}

/// Adapter turning a closure into a `RecordTransform`
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&mut PolicyRecord) -> std::result::Result<(), String> + Send + Sync,
{
    pub fn new(name: &str, func: F) -> Self {
        Self {
            name: name.to_string(),
            func,
        }
    }
}

impl<F> RecordTransform for FnTransform<F>
where
    F: Fn(&mut PolicyRecord) -> std::result::Result<(), String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, _record_index: usize, record: &mut PolicyRecord) -> Result<()> {
        (self.func)(record).map_err(|reason| PricingError::Transform {
            name: self.name.clone(),
            reason,
        })
    }
}

/// Transform that bands one field with a fixed set of rules
#[derive(Debug, Clone)]
pub struct BandTransform {
    name: String,
    field: String,
    spec: BandSpec,
}

impl BandTransform {
    pub fn new(name: &str, field: &str, spec: BandSpec) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            spec,
        }
    }
}

impl RecordTransform for BandTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, record_index: usize, record: &mut PolicyRecord) -> Result<()> {
        if !record.contains(&self.field) {
            debug!("Field '{}' not found; '{}' skipped", self.field, self.name);
            return Ok(());
        }
        self.spec
            .band_record(&self.field, record_index, record)
            .map_err(|err| PricingError::Transform {
                name: self.name.clone(),
                reason: err.to_string(),
            })?;
        Ok(())
    }
}

/// `DrivAge` -> `DrivAgeBand`: Under 25, 25-39, 40-59, 60+
pub fn driver_age_band() -> BandTransform {
    let spec = BandSpec::half_open(vec![
        Band::new(f64::NEG_INFINITY, 25.0, "Under 25"),
        Band::new(25.0, 40.0, "25-39"),
        Band::new(40.0, 60.0, "40-59"),
        Band::new(60.0, f64::INFINITY, "60+"),
    ])
    .with_output("DrivAgeBand");
    BandTransform::new("driver_age_band", "DrivAge", spec)
}

/// `VehPower` -> `PowerGroup`: Low below 5, Medium below 8, High otherwise
pub fn power_group() -> BandTransform {
    let spec = BandSpec::half_open(vec![
        Band::new(f64::NEG_INFINITY, 5.0, "Low"),
        Band::new(5.0, 8.0, "Medium"),
        Band::new(8.0, f64::INFINITY, "High"),
    ])
    .with_output("PowerGroup");
    BandTransform::new("power_group", "VehPower", spec)
}

struct Entry {
    priority: i32,
    transform: Box<dyn RecordTransform>,
}

/// Transforms ordered by ascending priority, ties kept in registration order
#[derive(Default)]
pub struct TransformRegistry {
    entries: Vec<Entry>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in example transforms
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(0, driver_age_band());
        registry.register(0, power_group());
        registry
    }

    pub fn register<T: RecordTransform + 'static>(&mut self, priority: i32, transform: T) {
        let position = self.entries.partition_point(|e| e.priority <= priority);
        self.entries.insert(
            position,
            Entry {
                priority,
                transform: Box::new(transform),
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.transform.name()).collect()
    }

    /// Run every transform on one record, stopping at the first failure
    pub fn apply(&self, record_index: usize, record: &mut PolicyRecord) -> Result<()> {
        for entry in &self.entries {
            entry.transform.apply(record_index, record)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.names())
            .finish()
    }
}
