//! I/O helper utilities.
//!
//! Turns raw `io::Error` values into actionable messages. The same hint table
//! backs the `Display` impl of [`crate::ReplaceError`] and the anyhow adapter
//! used by the binary.
//!
//! Usage:
//!   // in functions returning anyhow::Result<_>
//!   fs::read_dir(dir).map_err(io_error_with_help("scan directory", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Platform-aware hint for an I/O failure, keyed on the raw OS code when present.
pub fn hint(e: &io::Error) -> Option<&'static str> {
    if let Some(h) = e.raw_os_error().and_then(os_hint) {
        return Some(h);
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("path already exists (a parent may be a regular file)"),
        io::ErrorKind::InvalidData => Some("content cannot be represented in the session's encoding"),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            Some("busy/timed out; retry after the current write finishes")
        }
        _ => None,
    }
}

#[cfg(unix)]
fn os_hint(code: i32) -> Option<&'static str> {
    match code {
        libc::EACCES | libc::EPERM => {
            Some("permission denied; check ownership and write permissions on the directory")
        }
        libc::EXDEV => Some("cross-filesystem; staging file and target must share a volume"),
        libc::EBUSY => Some("resource busy; ensure no other process holds the target"),
        libc::ENOENT => Some("path not found; verify the parent directory exists"),
        libc::EEXIST => Some("path already exists (a parent may be a regular file)"),
        libc::ENOSPC => Some("insufficient space on device"),
        libc::EROFS => Some("read-only filesystem; cannot write here"),
        libc::EISDIR => Some("target is a directory"),
        libc::ELOOP => Some("too many symbolic link levels (ELOOP); possible symlink cycle"),
        libc::ENAMETOOLONG => Some("filename or path too long; shorten path segments"),
        libc::EMFILE => Some("process file descriptor limit reached; close files or raise limits"),
        libc::ENFILE => Some("system-wide file table overflow; reduce open files"),
        _ => None,
    }
}

#[cfg(windows)]
fn os_hint(code: i32) -> Option<&'static str> {
    match code {
        5 => Some("access denied; check permissions"),                        // ERROR_ACCESS_DENIED
        17 => Some("not same device; staging file and target must share a volume"), // ERROR_NOT_SAME_DEVICE
        32 => Some("sharing violation; target is open in another process"),   // ERROR_SHARING_VIOLATION
        2 | 3 => Some("path not found; verify the parent directory exists"),
        80 => Some("path already exists (a parent may be a regular file)"), // ERROR_FILE_EXISTS
        112 => Some("insufficient disk space"),                                // ERROR_DISK_FULL
        19 => Some("write protected / read-only media"),
        206 => Some("filename or path too long (MAX_PATH exceeded)"),
        4 => Some("too many open files; close handles or increase limit"),
        _ => None,
    }
}

#[cfg(not(any(unix, windows)))]
fn os_hint(_code: i32) -> Option<&'static str> {
    None
}

/// `"; <hint> [os code: N]"` or an empty string. Appended after the error text.
pub(crate) fn hint_suffix(e: &io::Error) -> String {
    let mut out = String::new();
    if let Some(h) = hint(e) {
        out.push_str("; ");
        out.push_str(h);
    }
    if let Some(code) = e.raw_os_error() {
        out.push_str(&format!(" [os code: {code}]"));
    }
    out
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    format!("{} '{}': {}{}", op, path.display(), e, hint_suffix(e))
}

/// Adapter for anyhow::Result code.
/// Returns a closure suitable for `.map_err(...)` that converts io::Error -> anyhow::Error.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Adapter for io::Result code; keeps the original ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_fallback_has_hint_without_os_code() {
        let e = io::Error::from(io::ErrorKind::NotFound);
        let s = hint_suffix(&e);
        assert!(s.contains("path not found"));
        assert!(!s.contains("os code"));
    }

    #[cfg(unix)]
    #[test]
    fn exdev_mentions_volume() {
        let e = io::Error::from_raw_os_error(libc::EXDEV);
        assert!(hint(&e).unwrap().contains("share a volume"));
        assert!(hint_suffix(&e).contains(&format!("[os code: {}]", libc::EXDEV)));
    }

    #[test]
    fn adapters_name_operation_and_path() {
        let p = Path::new("/srv/state.json");
        let e = io_error_with_help_io("remove", p)(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);
        let msg = e.to_string();
        assert!(msg.starts_with("remove '/srv/state.json': "), "msg was: {msg}");
        assert!(msg.contains("check ownership"), "msg was: {msg}");

        let a = io_error_with_help("read config xml", p)(io::Error::from(io::ErrorKind::NotFound));
        assert!(a.to_string().contains("verify it exists"));
    }

    #[test]
    fn already_exists_hint_names_blocking_path() {
        let h = hint(&io::Error::from(io::ErrorKind::AlreadyExists)).unwrap();
        assert!(h.contains("a parent may be a regular file"), "hint was: {h}");
        assert!(!h.contains("staging"));
        #[cfg(unix)]
        assert_eq!(hint(&io::Error::from_raw_os_error(libc::EEXIST)), Some(h));
    }

    #[test]
    fn unknown_kind_has_no_hint() {
        let e = io::Error::other("boom");
        assert_eq!(hint(&e), None);
        assert_eq!(hint_suffix(&e), "");
    }
}
