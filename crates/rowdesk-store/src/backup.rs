//! Timestamped copies of database files.

use crate::{Result, StoreError};
use chrono::{Local, NaiveDateTime};
use rowdesk_core::config::BackupConfig;
use std::path::PathBuf;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Copy each configured file from `source_dir` into
/// `<out_dir>/<label>_<YYYYmmdd_HHMMSS>` and return that folder.
///
/// Files missing from the source directory are skipped with a warning; a
/// missing source directory is an error and creates nothing.
pub fn backup_database(config: &BackupConfig, now: NaiveDateTime) -> Result<PathBuf> {
    if !config.source_dir.is_dir() {
        return Err(StoreError::NotFound(format!(
            "data directory {}",
            config.source_dir.display()
        )));
    }

    let target = config
        .out_dir
        .join(format!("{}_{}", config.label, now.format(STAMP_FORMAT)));
    std::fs::create_dir_all(&target)?;

    for name in &config.files {
        let src = config.source_dir.join(name);
        if !src.is_file() {
            tracing::warn!(path = %src.display(), "backup source not found, skipping");
            continue;
        }
        let bytes = std::fs::copy(&src, target.join(name))?;
        tracing::debug!(file = %name, bytes, "backed up");
    }

    tracing::info!(path = %target.display(), "backup created");
    Ok(target)
}

/// [`backup_database`] stamped with the local time.
pub fn backup_now(config: &BackupConfig) -> Result<PathBuf> {
    backup_database(config, Local::now().naive_local())
}
