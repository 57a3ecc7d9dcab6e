//! Core configuration types.
//! - Config holds runtime settings for the binary with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::Diagnostics;
use crate::fs_ops::DEFAULT_MIN_AGE;
use crate::replacer::{Durability, ReplaceOptions, DEFAULT_FILE_MODE};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration used by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    pub durability: Durability,
    /// Unix mode for new staging files (`None` = umask)
    pub file_mode: Option<u32>,
    pub preserve_permissions: bool,
    /// Staging files younger than this are left alone by `sweep`
    pub sweep_min_age: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            log_file: None,
            durability: Durability::Full,
            file_mode: Some(DEFAULT_FILE_MODE),
            preserve_permissions: true,
            sweep_min_age: DEFAULT_MIN_AGE,
        }
    }
}

impl Config {
    /// Replacer options derived from this config, reporting to `diagnostics`.
    pub fn replace_options(&self, diagnostics: Arc<dyn Diagnostics>) -> ReplaceOptions {
        ReplaceOptions::default()
            .durability(self.durability)
            .file_mode(self.file_mode)
            .preserve_permissions(self.preserve_permissions)
            .shared_diagnostics(diagnostics)
    }
}

/// Parse an octal permission string such as `0644`, `644` or `0o600`.
pub fn parse_octal_mode(s: &str) -> Option<u32> {
    let t = s.trim();
    let digits = t.strip_prefix("0o").or_else(|| t.strip_prefix("0O")).unwrap_or(t);
    let mode = u32::from_str_radix(digits, 8).ok()?;
    (mode <= 0o7777).then_some(mode)
}
