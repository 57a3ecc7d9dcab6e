//! Orphaned staging file sweeper.
//!
//! Staging files are left behind when a rename fails (deliberately) or when
//! abort-time removal fails. Nothing removes them automatically; operators
//! run this against a directory to reclaim them.
//!
//! Only regular files whose name parses as a staging name are considered.
//! Symlinks are never followed. Files younger than `min_age` may belong to a
//! live session and are skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::helpers::io_error_with_help_io;
use super::staging::is_staging_name;
use crate::errors::{ReplaceError, Result};

pub const DEFAULT_MIN_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Minimum age (by mtime) before a staging file counts as orphaned.
    pub min_age: Duration,
    /// Also descend into subdirectories (up to `max_depth`).
    pub recursive: bool,
    pub max_depth: usize,
    /// Report what would be removed without removing anything.
    pub dry_run: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self { min_age: DEFAULT_MIN_AGE, recursive: false, max_depth: 8, dry_run: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Removed orphans; in a dry run, the ones that would be removed.
    pub removed: Vec<PathBuf>,
    pub skipped_recent: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub dry_run: bool,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove orphaned staging files under `dir`.
pub fn sweep_orphans(dir: &Path, opts: &SweepOptions) -> Result<SweepReport> {
    let meta = fs::metadata(dir).map_err(|source| ReplaceError::Sweep { path: dir.to_path_buf(), source })?;
    if !meta.is_dir() {
        return Err(ReplaceError::Sweep {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let depth = if opts.recursive { opts.max_depth.max(1) } else { 1 };
    let now = SystemTime::now();
    let mut report = SweepReport { dry_run: opts.dry_run, ..Default::default() };

    for entry in WalkDir::new(dir).min_depth(1).max_depth(depth).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                warn!(path = %path.display(), error = %e, "sweep: cannot read entry");
                report.failed.push((path, e.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_staging_name(entry.file_name()) {
            continue;
        }
        let path = entry.path().to_path_buf();

        let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
            Some(t) => t,
            None => {
                report.failed.push((path, "modification time unavailable".into()));
                continue;
            }
        };
        // mtime in the future counts as fresh.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < opts.min_age {
            debug!(path = %path.display(), age_secs = age.as_secs(), "sweep: staging file too recent, skipping");
            report.skipped_recent.push(path);
            continue;
        }

        if opts.dry_run {
            info!(path = %path.display(), "dry-run: would remove orphaned staging file");
            report.removed.push(path);
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), age_secs = age.as_secs(), "Removed orphaned staging file");
                report.removed.push(path);
            }
            Err(e) => {
                let e = io_error_with_help_io("remove", &path)(e);
                warn!(error = %e, "sweep: failed to remove staging file");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}
