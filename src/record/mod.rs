//! Policy records and record-level IO

mod data;
mod value;
pub mod loader;

pub use data::PolicyRecord;
pub use value::{FieldValue, JoinKey};
pub use loader::{load_records, write_records_csv, write_records_json};
