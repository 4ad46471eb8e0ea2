//! JSON config loading for the transform stage
//!
//! A missing or blank config file is not an error: the stage it drives is
//! skipped and records pass through untouched. A file that exists but does
//! not parse is an error.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{BandConfig, CategoryConfig};
use crate::error::{PricingError, Result};

/// Default file name of the category index config
pub const CATEGORY_INDEX_FILE: &str = "category-index.json";

/// Default file name of the continuous banding config
pub const CONTINUOUS_BANDING_FILE: &str = "continuous-banding.json";

/// Read and parse a JSON config, `None` when the file is absent or blank
pub fn load_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Config file not found: {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if contents.trim().is_empty() {
        warn!("Config file is empty: {}", path.display());
        return Ok(None);
    }

    let parsed = serde_json::from_str(&contents).map_err(|source| PricingError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(Some(parsed))
}

/// Load the category index config; absent file gives an empty config
pub fn load_category_config(path: &Path) -> Result<CategoryConfig> {
    Ok(load_optional_json(path)?.unwrap_or_default())
}

/// Load the continuous banding config; absent file gives an empty config
pub fn load_band_config(path: &Path) -> Result<BandConfig> {
    Ok(load_optional_json(path)?.unwrap_or_default())
}

/// Load both transform configs from a directory using the default file names
pub fn load_transformation_configs(config_dir: &Path) -> Result<(CategoryConfig, BandConfig)> {
    Ok((
        load_category_config(&config_dir.join(CATEGORY_INDEX_FILE))?,
        load_band_config(&config_dir.join(CONTINUOUS_BANDING_FILE))?,
    ))
}
