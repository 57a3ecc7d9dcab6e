//! The atomic replacer: options, session creation and the scoped write form.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::encoding::{resolve_encoding, Encoding, WriteMode};
use crate::errors::{ConfigError, ReplaceError, Result};
use crate::fs_ops::{create_exclusive, parent_or_cwd};
use crate::session::WriteSession;

/// Mode used for new staging files on Unix unless overridden.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// What happens to the staging file's data before the rename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Durability {
    /// Flush to the OS page cache only. Fastest; a power loss right after the
    /// rename may surface an empty or stale target.
    Data,
    /// `sync_all` the staging file before renaming it.
    #[default]
    Full,
}

impl FromStr for Durability {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" | "flush" => Ok(Durability::Data),
            "full" | "sync" | "fsync" => Ok(Durability::Full),
            _ => Err(format!("invalid durability: '{s}'")),
        }
    }
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Durability::Data => "data",
            Durability::Full => "full",
        })
    }
}

#[derive(Clone)]
pub struct ReplaceOptions {
    pub durability: Durability,
    /// Unix mode for new staging files; `None` leaves it to the umask.
    pub file_mode: Option<u32>,
    /// Copy an existing target's permissions onto the staging file.
    pub preserve_permissions: bool,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            durability: Durability::Full,
            file_mode: Some(DEFAULT_FILE_MODE),
            preserve_permissions: true,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }
}

impl fmt::Debug for ReplaceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaceOptions")
            .field("durability", &self.durability)
            .field("file_mode", &self.file_mode.map(|m| format!("{m:o}")))
            .field("preserve_permissions", &self.preserve_permissions)
            .finish_non_exhaustive()
    }
}

impl ReplaceOptions {
    pub fn durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    pub fn file_mode(mut self, mode: Option<u32>) -> Self {
        self.file_mode = mode;
        self
    }

    pub fn preserve_permissions(mut self, yes: bool) -> Self {
        self.preserve_permissions = yes;
        self
    }

    pub fn diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    pub fn shared_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Creates write sessions. Holds no per-target state, so one replacer can
/// serve any number of targets and threads.
#[derive(Debug, Clone, Default)]
pub struct AtomicReplacer {
    opts: ReplaceOptions,
}

impl AtomicReplacer {
    pub fn new(opts: ReplaceOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &ReplaceOptions {
        &self.opts
    }

    /// Open a write session for `target`.
    ///
    /// Mode and encoding are validated before anything on disk is touched.
    /// Then the parent directory is created if missing and a staging file is
    /// created next to the target. Nothing is left behind if this fails.
    pub fn begin(
        &self,
        target: impl AsRef<Path>,
        mode: WriteMode,
        encoding: Option<Encoding>,
    ) -> Result<WriteSession> {
        let target = target.as_ref();
        let encoding = resolve_encoding(mode, encoding)?;
        let file_name = target
            .file_name()
            .ok_or_else(|| ConfigError::InvalidTarget(target.to_path_buf()))?;

        let dir = parent_or_cwd(target);
        fs::create_dir_all(dir).map_err(|source| ReplaceError::CreateDir { dir: dir.to_path_buf(), source })?;

        let (staging, file) = create_exclusive(dir, file_name, self.opts.file_mode)
            .map_err(|(path, source)| ReplaceError::Staging { path, source })?;

        if self.opts.preserve_permissions
            && let Err(source) = copy_target_permissions(target, &file)
        {
            drop(file);
            if let Err(e) = fs::remove_file(&staging) {
                self.opts.diagnostics.cleanup_failed(&staging, &e);
            }
            return Err(ReplaceError::Staging { path: staging, source });
        }

        self.opts.diagnostics.staging_created(&staging, target);
        Ok(WriteSession::new(
            target.to_path_buf(),
            staging,
            file,
            mode,
            encoding,
            self.opts.durability,
            Arc::clone(&self.opts.diagnostics),
        ))
    }

    /// Scoped write: commit when `f` returns `Ok`, abort when it returns `Err`.
    ///
    /// The closure's error is returned untouched; a failure while removing
    /// the staging file only reaches the diagnostics sink. A panic inside `f`
    /// aborts through the session's `Drop`.
    pub fn write_with<T, E, F>(
        &self,
        target: impl AsRef<Path>,
        mode: WriteMode,
        encoding: Option<Encoding>,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut WriteSession) -> std::result::Result<T, E>,
        E: From<ReplaceError>,
    {
        let mut session = self.begin(target, mode, encoding)?;
        match f(&mut session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(e) => {
                session.abort();
                Err(e)
            }
        }
    }

    /// Replace `target` with `bytes`.
    pub fn write_bytes(&self, target: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
        self.write_with(target, WriteMode::Binary, None, |s| {
            io::Write::write_all(s, bytes).map_err(|source| ReplaceError::Write {
                staging: s.staging_path().to_path_buf(),
                source,
            })
        })
    }

    /// Replace `target` with `text` in the given encoding (UTF-8 by default).
    pub fn write_text(&self, target: impl AsRef<Path>, text: &str, encoding: Option<Encoding>) -> Result<()> {
        self.write_with(target, WriteMode::Text, encoding, |s| {
            s.write_text(text).map_err(|source| ReplaceError::Write {
                staging: s.staging_path().to_path_buf(),
                source,
            })
        })
    }
}

fn copy_target_permissions(target: &Path, staging: &File) -> io::Result<()> {
    match fs::metadata(target) {
        Ok(meta) if meta.is_file() => staging.set_permissions(meta.permissions()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durability_parse() {
        assert_eq!("FULL".parse::<Durability>().unwrap(), Durability::Full);
        assert_eq!("flush".parse::<Durability>().unwrap(), Durability::Data);
        assert!("maybe".parse::<Durability>().is_err());
    }

    #[test]
    fn options_debug_hides_diagnostics_and_shows_octal() {
        let s = format!("{:?}", ReplaceOptions::default());
        assert!(s.contains("\"600\""), "debug was: {s}");
        assert!(s.contains(".."));
    }

    #[test]
    fn invalid_target_is_config_error() {
        let err = AtomicReplacer::default().begin("/", WriteMode::Text, None).unwrap_err();
        assert!(matches!(err, ReplaceError::Config(ConfigError::InvalidTarget(_))));
    }
}
