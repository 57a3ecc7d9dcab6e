//! Typed error definitions for atomic_replace.
//!
//! `ConfigError` covers requests rejected before the filesystem is touched.
//! `ReplaceError` covers everything else; the variant tells the caller
//! whether a staging file may still exist on disk.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fs_ops::helpers::hint_suffix;

/// Invalid combination of target, mode and encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("binary mode does not take a text encoding (got '{0}')")]
    EncodingWithBinary(String),

    #[error("unknown write mode '{0}'; expected one of: w, wt, wb")]
    UnknownMode(String),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("target path has no file name: {}", .0.display())]
    InvalidTarget(PathBuf),

    #[error("JSON output requires a text encoding")]
    JsonNeedsText,
}

#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("create parent directory '{}': {source}{}", .dir.display(), hint_suffix(.source))]
    CreateDir { dir: PathBuf, source: io::Error },

    #[error("create staging file '{}': {source}{}", .path.display(), hint_suffix(.source))]
    Staging { path: PathBuf, source: io::Error },

    #[error("write staging file '{}': {source}{}", .staging.display(), hint_suffix(.source))]
    Write { staging: PathBuf, source: io::Error },

    #[error("serialize JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(
        "replace '{}' with '{}': {source}{} (staging file left in place)",
        .target.display(),
        .staging.display(),
        hint_suffix(.source)
    )]
    Commit {
        staging: PathBuf,
        target: PathBuf,
        source: io::Error,
    },

    #[error("scan '{}': {source}{}", .path.display(), hint_suffix(.source))]
    Sweep { path: PathBuf, source: io::Error },

    #[error("read input: {source}{}", hint_suffix(.source))]
    Input { source: io::Error },

    #[error("operation interrupted by user")]
    Interrupted,
}

impl ReplaceError {
    /// Stable numeric code for structured logs and exit statuses.
    pub fn code(&self) -> i32 {
        match self {
            ReplaceError::Config(_) => 2,
            ReplaceError::CreateDir { .. } => 10,
            ReplaceError::Staging { .. } => 11,
            ReplaceError::Write { .. } => 12,
            ReplaceError::Serialize(_) => 13,
            ReplaceError::Commit { .. } => 14,
            ReplaceError::Sweep { .. } => 15,
            ReplaceError::Input { .. } => 16,
            ReplaceError::Interrupted => 130,
        }
    }

    /// Short snake_case label, e.g. `kind = "commit"`.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplaceError::Config(_) => "config",
            ReplaceError::CreateDir { .. } => "create_dir",
            ReplaceError::Staging { .. } => "staging",
            ReplaceError::Write { .. } => "write",
            ReplaceError::Serialize(_) => "serialize",
            ReplaceError::Commit { .. } => "commit",
            ReplaceError::Sweep { .. } => "sweep",
            ReplaceError::Input { .. } => "input",
            ReplaceError::Interrupted => "interrupted",
        }
    }

    /// Staging file deliberately left on disk, if any.
    ///
    /// Only a failed rename leaves one behind on purpose; every other variant
    /// has already attempted removal.
    pub fn retained_staging(&self) -> Option<&Path> {
        match self {
            ReplaceError::Commit { staging, .. } => Some(staging),
            _ => None,
        }
    }

    /// The underlying I/O error, when there is one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ReplaceError::CreateDir { source, .. }
            | ReplaceError::Staging { source, .. }
            | ReplaceError::Write { source, .. }
            | ReplaceError::Commit { source, .. }
            | ReplaceError::Sweep { source, .. }
            | ReplaceError::Input { source } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T, E = ReplaceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_error_names_retained_staging() {
        let err = ReplaceError::Commit {
            staging: PathBuf::from("/d/.t.tmp.0000000000ab"),
            target: PathBuf::from("/d/t"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.retained_staging(), Some(Path::new("/d/.t.tmp.0000000000ab")));
        assert_eq!(err.kind(), "commit");
        let msg = err.to_string();
        assert!(msg.contains("left in place"), "msg was: {msg}");
        assert!(msg.contains("permission denied"), "msg was: {msg}");
    }

    #[test]
    fn config_error_is_transparent() {
        let err = ReplaceError::from(ConfigError::EncodingWithBinary("utf-8".into()));
        assert_eq!(err.to_string(), "binary mode does not take a text encoding (got 'utf-8')");
        assert_eq!(err.code(), 2);
        assert!(err.retained_staging().is_none());
        assert!(err.io_error().is_none());
    }
}
