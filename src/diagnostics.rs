//! Diagnostics side channel for the replacer.
//!
//! Secondary failures (a staging file that could not be removed, or one kept
//! after a failed rename) never reach the caller as errors. They are reported
//! here so operators can find orphans on disk.

use std::io;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::fs_ops::is_cross_device;

pub trait Diagnostics: Send + Sync {
    fn staging_created(&self, _staging: &Path, _target: &Path) {}

    fn committed(&self, _target: &Path) {}

    /// Removing the staging file during abort failed; the file is orphaned.
    fn cleanup_failed(&self, staging: &Path, error: &io::Error);

    /// The rename failed and the staging file was left in place on purpose.
    fn staging_retained(&self, staging: &Path, target: &Path, error: &io::Error);

    /// The rename failed because staging file and target sit on different
    /// filesystems. Reported just before `staging_retained`.
    fn cross_device(&self, _staging: &Path, _target: &Path) {}
}

/// Route a failed rename to the sink: `cross_device` for EXDEV, then
/// `staging_retained` in every case.
pub(crate) fn report_rename_failure(diag: &dyn Diagnostics, staging: &Path, target: &Path, error: &io::Error) {
    if is_cross_device(error) {
        diag.cross_device(staging, target);
    }
    diag.staging_retained(staging, target, error);
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn staging_created(&self, staging: &Path, target: &Path) {
        debug!(staging = %staging.display(), target_path = %target.display(), "Created staging file");
    }

    fn committed(&self, target: &Path) {
        debug!(target_path = %target.display(), "Replaced target atomically");
    }

    fn cleanup_failed(&self, staging: &Path, error: &io::Error) {
        warn!(
            staging = %staging.display(),
            error = %error,
            "Failed to remove staging file; orphaned staging files may accumulate"
        );
    }

    fn staging_retained(&self, staging: &Path, target: &Path, error: &io::Error) {
        warn!(
            staging = %staging.display(),
            target_path = %target.display(),
            error = %error,
            "Rename failed; staging file left in place"
        );
    }

    fn cross_device(&self, staging: &Path, target: &Path) {
        error!(
            staging = %staging.display(),
            target_path = %target.display(),
            "staging file and target are on different filesystems"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn cleanup_failed(&self, _staging: &Path, _error: &io::Error) {}
    fn staging_retained(&self, _staging: &Path, _target: &Path, _error: &io::Error) {}
}
