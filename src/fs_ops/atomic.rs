//! Atomic replace step.
//! - One `rename` call swaps the staging file into the target's name.
//! - On Windows std's rename already uses MOVEFILE_REPLACE_EXISTING; the
//!   target is never removed first.
//! - On Unix, best-effort fsync of the directory after the rename.

use std::fs;
use std::io;
use std::path::Path;

use super::util::{fsync_dir, parent_or_cwd};

/// Rename `staging` over `target`. The caller must have closed the staging handle.
pub(crate) fn replace_file(staging: &Path, target: &Path) -> io::Result<()> {
    fs::rename(staging, target)?;

    // A failed directory fsync must not turn a completed rename into a failure.
    let _ = fsync_dir(parent_or_cwd(target));
    Ok(())
}
