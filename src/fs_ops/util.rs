use std::fs::File;
use std::io;
use std::path::Path;

/// EXDEV / ERROR_NOT_SAME_DEVICE; std has no stable ErrorKind for it.
pub(crate) fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::EXDEV,
        #[cfg(windows)]
        Some(code) => code == 17,
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}

#[cfg(unix)]
pub(crate) fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Directory a target lives in; `.` for bare file names.
pub(crate) fn parent_or_cwd(target: &Path) -> &Path {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_resolves_to_cwd() {
        assert_eq!(parent_or_cwd(Path::new("out.json")), Path::new("."));
        assert_eq!(parent_or_cwd(Path::new("a/out.json")), Path::new("a"));
    }

    #[cfg(unix)]
    #[test]
    fn exdev_detected() {
        assert!(is_cross_device(&io::Error::from_raw_os_error(libc::EXDEV)));
        assert!(!is_cross_device(&io::Error::from_raw_os_error(libc::EACCES)));
        assert!(!is_cross_device(&io::Error::other("x")));
    }
}
