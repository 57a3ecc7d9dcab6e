//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Writes a commented template on request, itself through the replacer.
//!
//! Unknown XML fields are a hard error to surface misconfigurations early.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{parse_octal_mode, Config, LogLevel};
use crate::diagnostics::TracingDiagnostics;
use crate::fs_ops::io_error_with_help;
use crate::replacer::{AtomicReplacer, Durability, ReplaceOptions};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    durability: Option<String>,
    /// Octal, e.g. `0644`; empty means "leave it to the umask"
    file_mode: Option<String>,
    preserve_permissions: Option<bool>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    sweep_min_age_seconds: Option<u64>,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = parsed.log_level.as_deref() {
        cfg.log_level = s.trim().parse::<LogLevel>().map_err(anyhow::Error::msg)?;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    if let Some(s) = parsed.durability.as_deref() {
        cfg.durability = s.parse::<Durability>().map_err(anyhow::Error::msg)?;
    }
    if let Some(s) = parsed.file_mode.as_deref() {
        cfg.file_mode = if s.trim().is_empty() {
            None
        } else {
            Some(parse_octal_mode(s).with_context(|| format!("invalid file_mode '{}'; expected octal like 0644", s.trim()))?)
        };
    }
    if let Some(b) = parsed.preserve_permissions {
        cfg.preserve_permissions = b;
    }
    if let Some(secs) = parsed.sweep_min_age_seconds {
        cfg.sweep_min_age = Duration::from_secs(secs);
    }
    Ok(cfg)
}

/// Parse config XML text.
pub fn parse_config_xml(contents: &str) -> Result<Config> {
    let parsed: XmlConfig = from_xml_str(contents).context("parse config xml")?;
    xml_to_config(parsed)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(io_error_with_help("read config xml", path))?;
    parse_config_xml(&contents).with_context(|| format!("load config '{}'", path.display()))
}

/// Outcome of looking for the config file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(Config, PathBuf),
    /// No file at the resolved path (or no path could be resolved); defaults apply.
    Defaults(Option<PathBuf>),
}

impl LoadResult {
    pub fn into_config(self) -> Config {
        match self {
            LoadResult::Loaded(cfg, _) => cfg,
            LoadResult::Defaults(_) => Config::default(),
        }
    }
}

/// Load from `$ATOMIC_REPLACE_CONFIG` or the default path.
///
/// A missing file is not an error; a present but invalid one is.
pub fn load_config() -> Result<LoadResult> {
    let Some(path) = default_config_path() else {
        return Ok(LoadResult::Defaults(None));
    };
    if !path.exists() {
        debug!(path = %path.display(), "No config file; using defaults");
        return Ok(LoadResult::Defaults(Some(path)));
    }
    let cfg = load_config_from_xml_path(&path)?;
    debug!(path = %path.display(), "Loaded config");
    Ok(LoadResult::Loaded(cfg, path))
}

/// Write a commented template config at `path` (0600 on Unix).
/// Refuses to overwrite an existing file or write through a symlinked ancestor.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("config file already exists: {}", path.display());
    }
    if path_has_symlink_ancestor(path)? {
        bail!("refusing to create config: ancestor of {} is a symlink", path.display());
    }

    let defaults = Config::default();
    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/atomic_replace.log".into());

    let content = format!(
        "<!--\n  atomic_replace configuration (XML)\n\n    log_level              -> quiet | normal | info | debug\n    log_file               -> optional log file (stdout/stderr still used)\n    durability             -> full (fsync before rename) | data (flush only)\n    file_mode              -> octal mode for new files on Unix; empty = umask\n    preserve_permissions   -> keep an existing target's mode when replacing it\n    sweep_min_age_seconds  -> staging files younger than this are never swept\n\n  CLI flags override XML values.\n-->\n<config>\n  <log_level>{}</log_level>\n  <log_file>{}</log_file>\n  <durability>{}</durability>\n  <file_mode>{:04o}</file_mode>\n  <preserve_permissions>{}</preserve_permissions>\n  <sweep_min_age_seconds>{}</sweep_min_age_seconds>\n</config>\n",
        defaults.log_level,
        suggested_log,
        defaults.durability,
        defaults.file_mode.unwrap_or(0o600),
        defaults.preserve_permissions,
        defaults.sweep_min_age.as_secs(),
    );

    let replacer = AtomicReplacer::new(
        ReplaceOptions::default()
            .file_mode(Some(0o600))
            .preserve_permissions(false)
            .diagnostics(TracingDiagnostics),
    );
    replacer
        .write_text(path, &content, None)
        .with_context(|| format!("write template config '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_defaults() {
        let cfg = parse_config_xml("<config></config>").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn values_applied_with_whitespace() {
        let cfg = parse_config_xml(
            "<config>\n  <log_level> debug </log_level>\n  <durability>data</durability>\n  <file_mode>0644</file_mode>\n  <preserve_permissions>false</preserve_permissions>\n  <sweep_min_age_seconds> 120 </sweep_min_age_seconds>\n</config>",
        )
        .unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.durability, Durability::Data);
        assert_eq!(cfg.file_mode, Some(0o644));
        assert!(!cfg.preserve_permissions);
        assert_eq!(cfg.sweep_min_age, Duration::from_secs(120));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = parse_config_xml("<config><colour>blue</colour></config>").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "err was: {err:#}");
    }

    #[test]
    fn bad_values_rejected() {
        assert!(parse_config_xml("<config><file_mode>rw-r--r--</file_mode></config>").is_err());
        assert!(parse_config_xml("<config><durability>sometimes</durability></config>").is_err());
        assert!(parse_config_xml("<config><log_level>loud</log_level></config>").is_err());
    }

    #[test]
    fn template_round_trips() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("cfg").join("config.xml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.durability, Durability::Full);
        assert_eq!(cfg.file_mode, Some(0o600));
        assert!(create_template_config(&path).is_err(), "second create must refuse");
    }
}
