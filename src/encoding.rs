//! Write modes and text encodings for a session.
//!
//! Text sessions accept UTF-8 (either `&str` or raw bytes through
//! `io::Write`) and transcode to the session's encoding on the way to the
//! staging file. Binary sessions pass bytes through untouched.

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::errors::ConfigError;

/// How bytes written to a session reach the staging file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Text,
    Binary,
}

impl FromStr for WriteMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "wt" | "t" | "text" => Ok(WriteMode::Text),
            "wb" | "b" | "binary" => Ok(WriteMode::Binary),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteMode::Text => "text",
            WriteMode::Binary => "binary",
        })
    }
}

/// Supported text encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1; code points above U+00FF are rejected.
    Latin1,
    /// 7-bit ASCII; code points above U+007F are rejected.
    Ascii,
}

impl Encoding {
    /// Parse common encoding names (case-insensitive, `-`/`_` interchangeable).
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "utf8" | "u8" => Some(Encoding::Utf8),
            "utf16le" => Some(Encoding::Utf16Le),
            "utf16be" => Some(Encoding::Utf16Be),
            "latin1" | "iso88591" | "l1" => Some(Encoding::Latin1),
            "ascii" | "usascii" => Some(Encoding::Ascii),
            _ => None,
        }
    }

    /// Append `text` to `out` in this encoding.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Encoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            Encoding::Utf16Le => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            Encoding::Utf16Be => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
            Encoding::Latin1 => encode_narrow(text, 0xFF, self, out)?,
            Encoding::Ascii => encode_narrow(text, 0x7F, self, out)?,
        }
        Ok(())
    }
}

fn encode_narrow(text: &str, max: u32, enc: &Encoding, out: &mut Vec<u8>) -> io::Result<()> {
    out.reserve(text.len());
    for (idx, ch) in text.char_indices() {
        let cp = ch as u32;
        if cp > max {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("'{enc}' cannot encode character {ch:?} (U+{cp:04X}) at byte {idx}"),
            ));
        }
        out.push(cp as u8);
    }
    Ok(())
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16-le",
            Encoding::Utf16Be => "utf-16-be",
            Encoding::Latin1 => "latin-1",
            Encoding::Ascii => "ascii",
        })
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConfigError::UnknownEncoding(s.to_string()))
    }
}

/// Check mode/encoding consistency; returns the encoding text output will use.
///
/// Binary mode with an explicit encoding is rejected; text mode defaults to UTF-8.
pub fn resolve_encoding(mode: WriteMode, encoding: Option<Encoding>) -> Result<Option<Encoding>, ConfigError> {
    match (mode, encoding) {
        (WriteMode::Binary, Some(enc)) => Err(ConfigError::EncodingWithBinary(enc.to_string())),
        (WriteMode::Binary, None) => Ok(None),
        (WriteMode::Text, enc) => Ok(Some(enc.unwrap_or_default())),
    }
}

/// Streaming UTF-8 -> target encoding transcoder.
///
/// Holds back an incomplete trailing UTF-8 sequence (at most 3 bytes) until
/// the next write completes it.
#[derive(Debug)]
pub(crate) struct TextEncoder {
    encoding: Encoding,
    pending: Vec<u8>,
}

impl TextEncoder {
    pub(crate) fn new(encoding: Encoding) -> Self {
        Self { encoding, pending: Vec::new() }
    }

    pub(crate) fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Transcode `buf`, appending encoded output to `out`.
    pub(crate) fn feed(&mut self, buf: &[u8], out: &mut Vec<u8>) -> io::Result<()> {
        let joined;
        let input: &[u8] = if self.pending.is_empty() {
            buf
        } else {
            let mut v = std::mem::take(&mut self.pending);
            v.extend_from_slice(buf);
            joined = v;
            &joined
        };

        match std::str::from_utf8(input) {
            Ok(text) => self.encoding.encode_into(text, out),
            Err(e) => {
                let valid = e.valid_up_to();
                let head = std::str::from_utf8(&input[..valid]).map_err(invalid_utf8)?;
                self.encoding.encode_into(head, out)?;
                match e.error_len() {
                    None => {
                        self.pending.extend_from_slice(&input[valid..]);
                        Ok(())
                    }
                    Some(_) => Err(invalid_utf8(e)),
                }
            }
        }
    }

    /// Fails if a partial UTF-8 sequence is still buffered.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            let n = self.pending.len();
            self.pending.clear();
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("stream ended inside a UTF-8 sequence ({n} dangling bytes)"),
            ))
        }
    }
}

fn invalid_utf8(e: std::str::Utf8Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("text session received invalid UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_strings() {
        assert_eq!("w".parse::<WriteMode>().unwrap(), WriteMode::Text);
        assert_eq!("wt".parse::<WriteMode>().unwrap(), WriteMode::Text);
        assert_eq!("wb".parse::<WriteMode>().unwrap(), WriteMode::Binary);
        assert_eq!(
            "a+".parse::<WriteMode>().unwrap_err(),
            ConfigError::UnknownMode("a+".into())
        );
    }

    #[test]
    fn encoding_aliases() {
        assert_eq!(Encoding::parse("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::parse("utf_16_le"), Some(Encoding::Utf16Le));
        assert_eq!(Encoding::parse("ISO-8859-1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::parse("us-ascii"), Some(Encoding::Ascii));
        assert!("klingon".parse::<Encoding>().is_err());
    }

    #[test]
    fn binary_with_encoding_rejected() {
        let err = resolve_encoding(WriteMode::Binary, Some(Encoding::Utf8)).unwrap_err();
        assert!(matches!(err, ConfigError::EncodingWithBinary(_)));
        assert_eq!(resolve_encoding(WriteMode::Binary, None).unwrap(), None);
        assert_eq!(resolve_encoding(WriteMode::Text, None).unwrap(), Some(Encoding::Utf8));
    }

    #[test]
    fn latin1_rejects_wide_chars() {
        let mut out = Vec::new();
        Encoding::Latin1.encode_into("caf\u{e9}", &mut out).unwrap();
        assert_eq!(out, b"caf\xe9");
        let err = Encoding::Latin1.encode_into("\u{20ac}", &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn utf16_encodes_surrogates() {
        let mut out = Vec::new();
        Encoding::Utf16Be.encode_into("\u{1F600}", &mut out).unwrap();
        assert_eq!(out, vec![0xD8, 0x3D, 0xDE, 0x00]);
    }

    #[test]
    fn encoder_carries_split_sequence() {
        let bytes = "\u{e9}".as_bytes(); // 0xC3 0xA9
        let mut enc = TextEncoder::new(Encoding::Latin1);
        let mut out = Vec::new();
        enc.feed(&bytes[..1], &mut out).unwrap();
        assert!(out.is_empty());
        enc.feed(&bytes[1..], &mut out).unwrap();
        assert_eq!(out, vec![0xE9]);
        enc.finish().unwrap();
    }

    #[test]
    fn encoder_flags_dangling_and_invalid() {
        let mut enc = TextEncoder::new(Encoding::Utf8);
        let mut out = Vec::new();
        enc.feed(&[b'a', 0xE2, 0x82], &mut out).unwrap();
        assert_eq!(out, b"a");
        assert_eq!(enc.finish().unwrap_err().kind(), io::ErrorKind::InvalidData);

        let err = enc.feed(&[0xFF, b'b'], &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
