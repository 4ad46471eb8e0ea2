//! Rating stage: factor tables, table store and premium composition

mod composer;
mod plan;
mod store;
mod table;

pub use composer::{PreparedTable, RatingComposer};
pub use plan::{
    JoinMissPolicy, RatingOptions, RatingPlan, RoundingMode, TableSpec, BASE_PREMIUM_FIELD,
    FINAL_PREMIUM_FIELD, RATING_PLAN_FILE,
};
pub use store::{RatingTableStore, DEFAULT_TABLES_DIR};
pub use table::RatingTable;
