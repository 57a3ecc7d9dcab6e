//! Staging file naming and exclusive creation.
//!
//! Pattern: `.<target-name>.tmp.<token>`, always a sibling of the target so
//! the final rename never crosses a volume. `token` is 12 lowercase hex
//! digits mixed from the pid, the clock and a process-wide counter, which
//! keeps the suffix at 18 bytes on top of the target's name.

use std::ffi::{OsStr, OsString};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Name collisions retried before giving up with `AlreadyExists`.
const MAX_ATTEMPTS: u32 = 16;

const MARKER: &str = ".tmp";
const TOKEN_HEX_DIGITS: usize = 12;
const TOKEN_MASK: u64 = (1 << (4 * TOKEN_HEX_DIGITS)) - 1;

/// Bytes a staging name adds to the target's file name.
pub const STAGING_SUFFIX_LEN: usize = 1 + MARKER.len() + 1 + TOKEN_HEX_DIGITS;

/// 48-bit token; distinct counter values never share one within a process.
fn next_token() -> u64 {
    let pid = u64::from(std::process::id());
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut x = nanos ^ pid.rotate_left(32);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    x.wrapping_add(seq) & TOKEN_MASK
}

/// Unique hidden sibling path for a target named `file_name` inside `dir`.
pub fn staging_path_for(dir: &Path, file_name: &OsStr) -> PathBuf {
    let mut name = OsString::with_capacity(file_name.len() + STAGING_SUFFIX_LEN);
    name.push(".");
    name.push(file_name);
    name.push(format!("{MARKER}.{:0width$x}", next_token(), width = TOKEN_HEX_DIGITS));
    dir.join(name)
}

/// Target file name encoded in a staging file name; `None` for anything else.
pub fn parse_staging_name(name: &str) -> Option<&str> {
    let (rest, token) = name.rsplit_once('.')?;
    if token.len() != TOKEN_HEX_DIGITS || !token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    let stem = rest.strip_prefix('.')?.strip_suffix(MARKER)?;
    if stem.is_empty() {
        return None;
    }
    Some(stem)
}

/// True if `name` matches the staging pattern.
pub fn is_staging_name(name: &OsStr) -> bool {
    name.to_str().and_then(parse_staging_name).is_some()
}

/// Create a fresh staging file next to `target` with O_EXCL semantics.
///
/// Collisions (`AlreadyExists`) are retried with a new name; every other
/// error is returned with the path that failed.
pub(crate) fn create_exclusive(
    dir: &Path,
    file_name: &OsStr,
    mode: Option<u32>,
) -> Result<(PathBuf, File), (PathBuf, io::Error)> {
    let mut attempt = 0;
    loop {
        let path = staging_path_for(dir, file_name);
        let mut opts = OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        if let Some(m) = mode {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(m);
        }
        #[cfg(not(unix))]
        let _ = mode;

        match opts.open(&path) {
            Ok(f) => return Ok((path, f)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt + 1 < MAX_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err((path, e)),
        }
    }
}
