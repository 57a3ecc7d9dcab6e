//! Core library for `atomic_replace`.
//!
//! Replaces a file so that readers only ever see its old complete content or
//! its new complete content. New bytes go to a hidden staging file next to
//! the target; a single `rename` makes them visible.
//!
//! ```no_run
//! use std::io::Write;
//! use atomic_replace::{AtomicReplacer, ReplaceError, WriteMode};
//!
//! let replacer = AtomicReplacer::default();
//! replacer.write_with("/var/lib/app/state.txt", WriteMode::Text, None, |s| {
//!     s.write_all(b"ready\n").map_err(|source| ReplaceError::Write {
//!         staging: s.staging_path().to_path_buf(),
//!         source,
//!     })
//! })?;
//! # Ok::<(), ReplaceError>(())
//! ```
//!
//! Failure rules:
//! - anything failing before the rename removes the staging file and returns
//!   the original error;
//! - a failed rename keeps the staging file (`ReplaceError::Commit`);
//! - failures while removing a staging file go to [`Diagnostics`] only.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod encoding;
pub mod errors;
pub mod fs_ops;
pub mod json;
pub mod output;
pub mod replacer;
pub mod session;
pub mod shutdown;
pub mod stream;

use serde::Serialize;
use std::path::Path;

pub use config::{default_config_path, path_has_symlink_ancestor, Config, LogLevel};
pub use diagnostics::{Diagnostics, NoopDiagnostics, TracingDiagnostics};
pub use encoding::{Encoding, WriteMode};
pub use errors::{ConfigError, ReplaceError, Result};
pub use fs_ops::{is_staging_name, sweep_orphans, SweepOptions, SweepReport};
pub use json::{to_json_string, JsonFormatter, JsonOptions};
pub use replacer::{AtomicReplacer, Durability, ReplaceOptions};
pub use session::WriteSession;
pub use stream::copy_into;

/// Scoped write with default options. See [`AtomicReplacer::write_with`].
pub fn atomic_write<T, E, F>(
    target: impl AsRef<Path>,
    mode: WriteMode,
    encoding: Option<Encoding>,
    f: F,
) -> std::result::Result<T, E>
where
    F: FnOnce(&mut WriteSession) -> std::result::Result<T, E>,
    E: From<ReplaceError>,
{
    AtomicReplacer::default().write_with(target, mode, encoding, f)
}

/// Replace `target` with `bytes` using default options.
pub fn write_bytes_atomic(target: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    AtomicReplacer::default().write_bytes(target, bytes)
}

/// Serialize `value` as JSON into `target` using default replacer options.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    target: impl AsRef<Path>,
    value: &T,
    opts: &JsonOptions,
) -> Result<()> {
    AtomicReplacer::default().write_json(target, value, opts)
}

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::diagnostics::{Diagnostics, TracingDiagnostics};
    pub use crate::encoding::{Encoding, WriteMode};
    pub use crate::errors::{ConfigError, ReplaceError, Result as ARResult};
    pub use crate::fs_ops::{sweep_orphans, SweepOptions};
    pub use crate::json::JsonOptions;
    pub use crate::replacer::{AtomicReplacer, Durability, ReplaceOptions};
    pub use crate::session::WriteSession;
    pub use crate::{atomic_write, write_bytes_atomic, write_json_atomic};
}
