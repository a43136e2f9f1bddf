// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic atomic JSON file persistence, shared by `RunnerStateSnapshot`
//! writes and `rn-coordinator`'s coordination-directory records.
//!
//! A crash mid-write can never leave a half-written file behind: the
//! value is written to a sibling `.tmp` file, fsynced, then renamed into
//! place. `rename` within the same directory is atomic on the filesystems
//! this runs on.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `value` to `path` atomically via a temp file + fsync + rename.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load a value previously written with [`write_atomic`]. Returns `Ok(None)`
/// if the file does not exist; a corrupt file is reported as an error
/// rather than silently ignored, since coordination records must not be
/// guessed at.
pub fn read_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    match File::open(path) {
        Ok(file) => {
            let reader = std::io::BufReader::new(file);
            Ok(Some(serde_json::from_reader(reader)?))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
