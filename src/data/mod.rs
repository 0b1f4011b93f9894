/// Data layer: loading, reshaping, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .parquet (wide: one column per year)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  reshape  │  melt year columns → Observations (country, year, value)
///   └──────────┘
///        │            (memoized per path + mtime in `cache`)
///        ▼
///   ┌──────────┐
///   │  filter   │  year range + country set → chart rows, growth metrics
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod format;
pub mod loader;
pub mod model;
pub mod reshape;

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use model::{Observations, YearRange};

/// Where the dashboard looks for data when nothing else is configured.
pub const DEFAULT_DATA_FILE: &str = "data/inv_data.csv";

/// Reshaped observations for the default window, read from `path` or
/// [`DEFAULT_DATA_FILE`]. Repeated calls reuse the cached result.
pub fn observations(path: Option<&Path>) -> Result<Arc<Observations>> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_DATA_FILE));
    cache::load_cached(path, YearRange::default(), b',')
}
