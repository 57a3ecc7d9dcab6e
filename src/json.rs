//! JSON convenience layer over the replacer.
//!
//! Serialization streams straight into a text session, so a value that fails
//! halfway through takes the ordinary abort path and the target keeps its old
//! content.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;
use std::path::Path;

use crate::encoding::{Encoding, WriteMode};
use crate::errors::{ReplaceError, Result};
use crate::replacer::AtomicReplacer;

/// Output shape for [`AtomicReplacer::write_json`].
///
/// Non-finite floats (`NaN`, `inf`) are written as `null`, the same as
/// `serde_json` does; they never fail the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    /// Spaces per nesting level; `None` writes a single line.
    pub indent: Option<usize>,
    /// Write every non-ASCII character as a `\uXXXX` escape.
    pub escape_non_ascii: bool,
    pub encoding: Encoding,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self { indent: Some(2), escape_non_ascii: false, encoding: Encoding::Utf8 }
    }
}

/// Formatter producing `": "` key separators, `,` + newline between items
/// when indenting and `", "` on a single line otherwise.
#[derive(Debug)]
pub struct JsonFormatter {
    indent: Option<Vec<u8>>,
    escape_non_ascii: bool,
    depth: usize,
    has_value: bool,
}

impl JsonFormatter {
    pub fn new(opts: &JsonOptions) -> Self {
        Self {
            indent: opts.indent.map(|n| vec![b' '; n]),
            escape_non_ascii: opts.escape_non_ascii,
            depth: 0,
            has_value: false,
        }
    }

    fn newline_and_indent<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        if let Some(unit) = &self.indent {
            writer.write_all(b"\n")?;
            for _ in 0..self.depth {
                writer.write_all(unit)?;
            }
        }
        Ok(())
    }

    fn begin_item<W: ?Sized + io::Write>(&self, writer: &mut W, first: bool) -> io::Result<()> {
        match (&self.indent, first) {
            (_, true) => {}
            (Some(_), false) => writer.write_all(b",")?,
            (None, false) => writer.write_all(b", ")?,
        }
        self.newline_and_indent(writer)
    }

    fn close<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            self.newline_and_indent(writer)?;
        }
        writer.write_all(bracket)
    }
}

impl Formatter for JsonFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.begin_item(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.begin_item(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if !self.escape_non_ascii || fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

impl AtomicReplacer {
    /// Serialize `value` into `target` atomically.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        target: impl AsRef<Path>,
        value: &T,
        opts: &JsonOptions,
    ) -> Result<()> {
        self.write_with(target, WriteMode::Text, Some(opts.encoding), |session| {
            let staging = session.staging_path().to_path_buf();
            let mut ser = serde_json::Serializer::with_formatter(&mut *session, JsonFormatter::new(opts));
            value.serialize(&mut ser).map_err(|e| {
                if e.is_io() {
                    ReplaceError::Write { staging, source: io::Error::from(e) }
                } else {
                    ReplaceError::Serialize(e)
                }
            })
        })
    }
}

/// Render `value` with the same formatter, without touching the filesystem.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T, opts: &JsonOptions) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, JsonFormatter::new(opts));
    value.serialize(&mut ser).map_err(ReplaceError::Serialize)?;
    // The formatter only ever emits UTF-8.
    String::from_utf8(buf).map_err(|e| ReplaceError::Serialize(serde::ser::Error::custom(e)))
}
