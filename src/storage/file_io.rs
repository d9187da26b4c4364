//! Reading and replacing the store's record files
//!
//! Each of `categories.json`, `transactions.json` and `budgets.json` holds
//! one JSON array. A reader never sees a half-written array: a save either
//! replaces the whole file or leaves the previous one in place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::SikaiError;

/// Load a record file; a file that was never saved reads as an empty set
pub fn read_json<T, P>(path: P) -> Result<T, SikaiError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no file yet; using empty set");
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| SikaiError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| SikaiError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Replace a record file with `data`
///
/// The array is written and synced to a sibling `.json.tmp` file, which is
/// then renamed over the target.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), SikaiError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SikaiError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| SikaiError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| SikaiError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| SikaiError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| SikaiError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        SikaiError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    tracing::debug!(path = %path.display(), "file written");
    Ok(())
}
