use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use once_cell::sync::Lazy;

use super::loader::load_file;
use super::model::{Observations, YearRange};
use super::reshape::melt;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    range: YearRange,
    delimiter: u8,
}

/// Reshaped datasets for the lifetime of the process. Entries are never
/// evicted; a file with a new modification time simply gets a new entry.
static CACHE: Lazy<Mutex<HashMap<CacheKey, Arc<Observations>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load and melt `path` over `range`, reusing a previous result when the file
/// has not changed since.
pub fn load_cached(path: &Path, range: YearRange, delimiter: u8) -> Result<Arc<Observations>> {
    let modified = std::fs::metadata(path)
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .modified()
        .ok();
    let key = CacheKey {
        path: path.to_path_buf(),
        modified,
        range,
        delimiter,
    };

    if let Some(hit) = lock().get(&key) {
        log::debug!("Cache hit for {}", path.display());
        return Ok(Arc::clone(hit));
    }

    log::info!("Loading {} for {range}", path.display());
    let table = load_file(path, delimiter)?;
    let observations = Arc::new(melt(&table, range)?);
    log::info!(
        "Loaded {} countries into {} observations",
        table.len(),
        observations.len()
    );

    lock().insert(key, Arc::clone(&observations));
    Ok(observations)
}

/// Drop every cached entry for `path`. Returns how many were removed.
pub fn invalidate(path: &Path) -> usize {
    let mut cache = lock();
    let before = cache.len();
    cache.retain(|key, _| key.path != path);
    before - cache.len()
}

fn lock() -> std::sync::MutexGuard<'static, HashMap<CacheKey, Arc<Observations>>> {
    // Entries are only inserted whole, so a poisoned map is still consistent.
    CACHE.lock().unwrap_or_else(PoisonError::into_inner)
}
