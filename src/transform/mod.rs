//! Transform stage: category indexing and continuous banding

mod banding;
mod category;
pub mod loader;

pub use banding::{Band, BandConfig, BandSpec, Interval, BAND_SUFFIX};
pub use category::{indexed_field_name, CategoryConfig, INDEX_SUFFIX};
pub use loader::{load_band_config, load_category_config, load_transformation_configs};
