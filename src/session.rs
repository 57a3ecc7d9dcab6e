//! Write session: the scoped handle over one staging file.
//!
//! A session ends exactly once, through `commit`, `abort` or `Drop`.
//! Dropping an open session is an abort.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::{report_rename_failure, Diagnostics};
use crate::encoding::{Encoding, TextEncoder, WriteMode};
use crate::errors::{ReplaceError, Result};
use crate::fs_ops::replace_file;
use crate::replacer::Durability;

const BUF_SIZE: usize = 64 * 1024;

pub struct WriteSession {
    target: PathBuf,
    staging: PathBuf,
    writer: Option<BufWriter<File>>,
    mode: WriteMode,
    encoder: Option<TextEncoder>,
    scratch: Vec<u8>,
    durability: Durability,
    diagnostics: Arc<dyn Diagnostics>,
    bytes_written: u64,
    /// First write failure; a poisoned session refuses to commit.
    poisoned: Option<(io::ErrorKind, String)>,
    finished: bool,
}

impl WriteSession {
    pub(crate) fn new(
        target: PathBuf,
        staging: PathBuf,
        file: File,
        mode: WriteMode,
        encoding: Option<Encoding>,
        durability: Durability,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            target,
            staging,
            writer: Some(BufWriter::with_capacity(BUF_SIZE, file)),
            mode,
            encoder: encoding.map(TextEncoder::new),
            scratch: Vec::new(),
            durability,
            diagnostics,
            bytes_written: 0,
            poisoned: None,
            finished: false,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// `None` for binary sessions.
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoder.as_ref().map(TextEncoder::encoding)
    }

    /// Bytes handed to the staging file so far (after encoding).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write text in the session's encoding. Binary sessions reject this.
    pub fn write_text(&mut self, text: &str) -> io::Result<()> {
        if self.mode == WriteMode::Binary {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "text write on a binary session; write bytes instead",
            ));
        }
        self.write_all(text.as_bytes())
    }

    /// Make the written content visible under the target's name.
    ///
    /// Everything up to the rename (flush, sync, close) failing is an abort:
    /// the staging file is removed and `ReplaceError::Write` returned. If the
    /// rename itself fails the staging file is kept and
    /// `ReplaceError::Commit` names it.
    pub fn commit(mut self) -> Result<PathBuf> {
        if let Err(source) = self.finish_staging() {
            self.discard();
            return Err(ReplaceError::Write { staging: self.staging.clone(), source });
        }
        // From here on the staging file is only ever renamed, never removed.
        self.finished = true;

        match replace_file(&self.staging, &self.target) {
            Ok(()) => {
                self.diagnostics.committed(&self.target);
                Ok(self.target.clone())
            }
            Err(source) => {
                report_rename_failure(self.diagnostics.as_ref(), &self.staging, &self.target, &source);
                Err(ReplaceError::Commit {
                    staging: self.staging.clone(),
                    target: self.target.clone(),
                    source,
                })
            }
        }
    }

    /// Throw the written content away. The target is untouched.
    pub fn abort(mut self) {
        self.discard();
    }

    /// Flush, check encoder state, sync and close the staging handle.
    fn finish_staging(&mut self) -> io::Result<()> {
        if let Some((kind, msg)) = &self.poisoned {
            return Err(io::Error::new(*kind, format!("refusing to commit after a failed write: {msg}")));
        }
        let Some(writer) = self.writer.take() else {
            return Err(closed());
        };
        if let Some(enc) = self.encoder.as_mut() {
            enc.finish()?;
        }
        let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        if self.durability == Durability::Full {
            file.sync_all()?;
        }
        drop(file);
        Ok(())
    }

    /// Close the handle without flushing and remove the staging file.
    fn discard(&mut self) {
        if let Some(writer) = self.writer.take() {
            let (file, _unflushed) = writer.into_parts();
            drop(file);
        }
        match fs::remove_file(&self.staging) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.diagnostics.cleanup_failed(&self.staging, &e),
        }
        self.finished = true;
    }

    fn poison(&mut self, e: &io::Error) {
        if self.poisoned.is_none() {
            self.poisoned = Some((e.kind(), e.to_string()));
        }
    }
}

fn closed() -> io::Error {
    io::Error::other("write session already finished")
}

impl Write for WriteSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(closed());
        };
        let res = match self.encoder.as_mut() {
            None => writer.write(buf).map(|n| (n, n)),
            Some(enc) => {
                self.scratch.clear();
                enc.feed(buf, &mut self.scratch)
                    .and_then(|()| writer.write_all(&self.scratch))
                    .map(|()| (buf.len(), self.scratch.len()))
            }
        };
        match res {
            Ok((consumed, produced)) => {
                self.bytes_written += produced as u64;
                Ok(consumed)
            }
            Err(e) => {
                self.poison(&e);
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(closed());
        };
        let res = writer.flush();
        if let Err(e) = &res {
            self.poison(e);
        }
        res
    }
}

impl Drop for WriteSession {
    fn drop(&mut self) {
        if !self.finished {
            self.discard();
        }
    }
}

impl fmt::Debug for WriteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSession")
            .field("target", &self.target)
            .field("staging", &self.staging)
            .field("mode", &self.mode)
            .field("encoding", &self.encoding())
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}
