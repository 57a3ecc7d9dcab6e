//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - Flags override values loaded from the XML config.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::types::{parse_octal_mode, Config, LogLevel};
use crate::encoding::{resolve_encoding, Encoding, WriteMode};
use crate::errors::ConfigError;
use crate::fs_ops::SweepOptions;
use crate::json::JsonOptions;
use crate::replacer::Durability;

/// CLI wrapper for the atomic_replace library.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Replace files atomically: readers see the old content or the new, never a mix"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json_logs: bool,

    /// Also append logs to this file.
    #[arg(long, global = true, value_hint = ValueHint::FilePath, help = "Append logs to this file")]
    pub log_file: Option<PathBuf>,

    /// Print where atomic_replace will look for the config file, then exit.
    #[arg(long, help = "Print the config file location used by atomic_replace and exit")]
    pub print_config: bool,

    /// Write a commented template config at the default location, then exit.
    #[arg(long, help = "Create a template config file and exit")]
    pub init_config: bool,

    /// Override durability: full (fsync before rename) or data (flush only).
    #[arg(long, global = true, help = "Durability: full or data")]
    pub durability: Option<String>,

    /// Octal mode for new files, e.g. 0644.
    #[arg(long, global = true, value_name = "OCTAL", help = "Unix mode for newly created files (octal)")]
    pub file_mode: Option<String>,

    /// Do not copy the existing target's permissions onto the replacement.
    #[arg(long, global = true, help = "Do not keep the replaced file's permissions")]
    pub no_preserve_permissions: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read stdin and atomically replace TARGET with it.
    Write(WriteArgs),
    /// Remove staging files left behind by crashed writers.
    Sweep(SweepArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct WriteArgs {
    /// File to replace (created if missing, parents included).
    #[arg(value_name = "TARGET", value_hint = ValueHint::FilePath)]
    pub target: PathBuf,

    /// Copy stdin byte-for-byte.
    #[arg(long, short = 'b', help = "Binary mode: copy stdin bytes unchanged")]
    pub binary: bool,

    /// Text encoding of the written file (default utf-8).
    #[arg(long, short = 'e', value_name = "ENCODING", help = "Text encoding: utf-8, utf-16le, utf-16be, latin-1, ascii")]
    pub encoding: Option<String>,

    /// Parse stdin as JSON and write it re-formatted.
    #[arg(long, help = "Parse stdin as JSON and re-emit it")]
    pub json: bool,

    /// Indent width for --json output.
    #[arg(long, value_name = "N", requires = "json", conflicts_with = "compact")]
    pub indent: Option<usize>,

    /// Single-line --json output.
    #[arg(long, requires = "json")]
    pub compact: bool,

    /// Escape non-ASCII characters as \uXXXX in --json output.
    #[arg(long, requires = "json")]
    pub ascii: bool,
}

impl WriteArgs {
    pub fn mode(&self) -> WriteMode {
        if self.binary { WriteMode::Binary } else { WriteMode::Text }
    }

    /// Parsed and validated encoding for this request.
    pub fn encoding(&self) -> Result<Option<Encoding>, ConfigError> {
        let requested = match self.encoding.as_deref() {
            Some(name) => Some(name.parse::<Encoding>()?),
            None => None,
        };
        resolve_encoding(self.mode(), requested)
    }

    /// JSON formatting options; `--json` is text-only.
    pub fn json_options(&self) -> Result<JsonOptions, ConfigError> {
        if self.binary {
            return Err(ConfigError::JsonNeedsText);
        }
        let defaults = JsonOptions::default();
        let indent = if self.compact { None } else { self.indent.or(defaults.indent) };
        Ok(JsonOptions {
            indent,
            escape_non_ascii: self.ascii,
            encoding: self.encoding()?.unwrap_or(defaults.encoding),
        })
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SweepArgs {
    /// Directory to scan.
    #[arg(value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Only remove staging files older than SECS (default from config, 3600).
    #[arg(long, value_name = "SECS")]
    pub older_than: Option<u64>,

    /// Descend into subdirectories.
    #[arg(long, short = 'r')]
    pub recursive: bool,

    /// Report what would be removed without removing it.
    #[arg(long)]
    pub dry_run: bool,
}

impl SweepArgs {
    pub fn sweep_options(&self, cfg: &Config) -> SweepOptions {
        SweepOptions {
            min_age: self.older_than.map(Duration::from_secs).unwrap_or(cfg.sweep_min_age),
            recursive: self.recursive,
            dry_run: self.dry_run,
            ..SweepOptions::default()
        }
    }
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    ///
    /// Returns an error for values that do not parse, instead of silently
    /// keeping the config value.
    pub fn apply_overrides(&self, cfg: &mut Config) -> anyhow::Result<()> {
        if let Some(s) = self.log_level.as_deref() {
            s.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(p) = &self.log_file {
            cfg.log_file = Some(p.clone());
        }
        if let Some(d) = self.durability.as_deref() {
            cfg.durability = d.parse::<Durability>().map_err(anyhow::Error::msg)?;
        }
        if let Some(m) = self.file_mode.as_deref() {
            let mode = parse_octal_mode(m)
                .ok_or_else(|| anyhow::anyhow!("invalid --file-mode '{m}'; expected octal like 0644"))?;
            cfg.file_mode = Some(mode);
        }
        if self.no_preserve_permissions {
            cfg.preserve_permissions = false;
        }
        Ok(())
    }
}

pub fn parse() -> Args {
    Args::parse()
}
