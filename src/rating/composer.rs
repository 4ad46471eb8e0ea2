//! Rating composer: sequential table joins and multiplicative premium
//!
//! For each table spec, in plan order, a record is matched by exact equality
//! on every join key. The first table's premium factor becomes
//! `base_premium`; every later table multiplies the running premium by its
//! factor. After the last table the premium is rounded once into
//! `final_premium`.
//!
//! All tables are loaded and validated before any record is rated, so a
//! missing or malformed table never produces a partially rated batch.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    JoinMissPolicy, RatingOptions, RatingTable, RatingTableStore, TableSpec, BASE_PREMIUM_FIELD,
    FINAL_PREMIUM_FIELD,
};
use crate::error::{PricingError, Result};
use crate::record::{JoinKey, PolicyRecord};

/// A table resolved against its spec: join index and numeric factor columns
#[derive(Debug)]
pub struct PreparedTable {
    pub spec: TableSpec,
    table: Arc<RatingTable>,

    /// Join key combination -> row
    index: HashMap<Vec<JoinKey>, usize>,

    /// (column name, factor per row) for every non-key column
    factors: Vec<(String, Vec<f64>)>,

    /// Position in `factors` of the column multiplied into the premium
    premium_factor: usize,
}

impl PreparedTable {
    /// Validate a table against its plan entry and build the join index
    pub fn new(spec: &TableSpec, table: Arc<RatingTable>) -> Result<Self> {
        let width = table.columns.len();
        if let Some((row_idx, row)) = table.rows.iter().enumerate().find(|(_, r)| r.len() < width) {
            return Err(PricingError::ShortRow {
                table: table.name.clone(),
                row: row_idx + 1,
                expected: width,
                found: row.len(),
            });
        }

        let key_positions = spec
            .join_keys
            .iter()
            .map(|k| table.require_column(k))
            .collect::<Result<Vec<_>>>()?;

        let mut index = HashMap::with_capacity(table.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            // Rows with a blank key cell can never be matched
            let Some(key) = key_positions
                .iter()
                .map(|&p| row[p].join_key())
                .collect::<Option<Vec<_>>>()
            else {
                warn!("Rating table '{}' row {} has a blank key; ignored", table.name, row_idx + 1);
                continue;
            };
            if index.insert(key.clone(), row_idx).is_some() {
                return Err(PricingError::DuplicateRatingKey {
                    table: table.name.clone(),
                    key: format_key(&key),
                });
            }
        }

        let mut factors = Vec::new();
        for (col_idx, column) in table.columns.iter().enumerate() {
            if key_positions.contains(&col_idx) {
                continue;
            }
            let values = table
                .rows
                .iter()
                .enumerate()
                .map(|(row_idx, row)| {
                    row[col_idx].as_f64().ok_or_else(|| PricingError::InvalidFactor {
                        table: table.name.clone(),
                        column: column.clone(),
                        row: row_idx + 1,
                        value: row[col_idx].to_string(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            factors.push((column.clone(), values));
        }

        let premium_factor = match &spec.factor_column {
            Some(column) => factors
                .iter()
                .position(|(name, _)| name == column)
                .ok_or_else(|| PricingError::MissingColumn {
                    table: table.name.clone(),
                    column: column.clone(),
                })?,
            None => match factors.len() {
                0 => return Err(PricingError::NoFactorColumn { table: table.name.clone() }),
                1 => 0,
                _ => {
                    return Err(PricingError::AmbiguousFactorColumn {
                        table: table.name.clone(),
                        candidates: factors.iter().map(|(n, _)| n.clone()).collect(),
                    })
                }
            },
        };

        Ok(Self {
            spec: spec.clone(),
            table,
            index,
            factors,
            premium_factor,
        })
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    /// Names of the factor columns appended to each matched record
    pub fn factor_columns(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|(n, _)| n.as_str())
    }

    /// Row matching the record's join keys; absent keys or null values never match
    pub fn match_row(&self, record: &PolicyRecord) -> Option<usize> {
        let key = self
            .spec
            .join_keys
            .iter()
            .map(|k| record.get(k).and_then(|v| v.join_key()))
            .collect::<Option<Vec<_>>>()?;
        self.index.get(&key).copied()
    }

    /// Premium factor of a row
    pub fn premium_factor(&self, row: usize) -> f64 {
        self.factors[self.premium_factor].1[row]
    }
}

fn format_key(key: &[JoinKey]) -> String {
    let parts: Vec<String> = key.iter().map(|k| k.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Applies a rating plan to records using tables from a store
#[derive(Debug)]
pub struct RatingComposer<'a> {
    store: &'a RatingTableStore,
    options: RatingOptions,
}

impl<'a> RatingComposer<'a> {
    pub fn new(store: &'a RatingTableStore, options: RatingOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &RatingOptions {
        &self.options
    }

    /// Load and validate every table of the plan, in order
    pub fn prepare(&self, specs: &[TableSpec]) -> Result<Vec<PreparedTable>> {
        specs
            .iter()
            .map(|spec| PreparedTable::new(spec, self.store.load(&spec.table_name)?))
            .collect()
    }

    /// Rate one record; `Ok(None)` when it was dropped on a join miss
    pub fn rate_record(
        &self,
        record_index: usize,
        mut record: PolicyRecord,
        tables: &[PreparedTable],
    ) -> Result<Option<PolicyRecord>> {
        let mut premium: Option<f64> = None;

        for table in tables {
            let Some(row) = table.match_row(&record) else {
                return match self.options.join_miss {
                    JoinMissPolicy::Drop => {
                        debug!("Record {} has no match in '{}'; dropped", record_index, table.name());
                        Ok(None)
                    }
                    JoinMissPolicy::Error => Err(PricingError::NoRatingMatch {
                        table: table.name().to_string(),
                        record: record_index,
                    }),
                };
            };

            for (column, values) in &table.factors {
                record.insert(column.as_str(), values[row]);
            }

            let factor = table.premium_factor(row);
            premium = Some(match premium {
                None => {
                    record.insert(BASE_PREMIUM_FIELD, factor);
                    factor
                }
                Some(running) => running * factor,
            });
        }

        if let Some(premium) = premium {
            let rounded = self.options.rounding.round(premium, self.options.decimals);
            record.insert(FINAL_PREMIUM_FIELD, rounded);
        }
        Ok(Some(record))
    }

    /// Rate a batch in order; survivors keep their relative order
    pub fn rate(&self, records: Vec<PolicyRecord>, specs: &[TableSpec]) -> Result<Vec<PolicyRecord>> {
        let tables = self.prepare(specs)?;
        let input = records.len();

        let mut rated = Vec::with_capacity(input);
        for (i, record) in records.into_iter().enumerate() {
            if let Some(record) = self.rate_record(i, record, &tables)? {
                rated.push(record);
            }
        }

        log_drops(input, rated.len());
        Ok(rated)
    }

    /// Same as `rate` but rates records in parallel
    pub fn rate_parallel(&self, records: Vec<PolicyRecord>, specs: &[TableSpec]) -> Result<Vec<PolicyRecord>> {
        let tables = self.prepare(specs)?;
        let input = records.len();

        let rated: Vec<Option<PolicyRecord>> = records
            .into_par_iter()
            .enumerate()
            .map(|(i, record)| self.rate_record(i, record, &tables))
            .collect::<Result<_>>()?;
        let rated: Vec<PolicyRecord> = rated.into_iter().flatten().collect();

        log_drops(input, rated.len());
        Ok(rated)
    }
}

fn log_drops(input: usize, output: usize) {
    if output < input {
        warn!("Rating dropped {} of {} records with no matching table row", input - output, input);
    } else {
        info!("Rated {} records", output);
    }
}
