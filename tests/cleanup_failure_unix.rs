#![cfg(unix)]
use atomic_replace::{AtomicReplacer, Diagnostics, ReplaceError, ReplaceOptions, WriteMode};
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    cleanup_failures: Mutex<Vec<(PathBuf, io::ErrorKind)>>,
}

impl Diagnostics for Recorder {
    fn cleanup_failed(&self, staging: &Path, error: &io::Error) {
        self.cleanup_failures.lock().unwrap().push((staging.to_path_buf(), error.kind()));
    }

    fn staging_retained(&self, _staging: &Path, _target: &Path, _error: &io::Error) {}
}

#[test]
fn cleanup_failure_is_reported_but_original_error_returned() {
    // Skip on root: root can unlink in 0555 directories, which defeats the premise.
    unsafe {
        if libc::geteuid() == 0 {
            eprintln!("skipping: running as root");
            return;
        }
    }

    let td = tempdir().unwrap();
    let dir = td.path().join("locked");
    fs::create_dir(&dir).unwrap();
    let target = dir.join("state.txt");
    fs::write(&target, "old").unwrap();

    let recorder = Arc::new(Recorder::default());
    let replacer = AtomicReplacer::new(ReplaceOptions::default().shared_diagnostics(recorder.clone()));

    let mut staging_seen = PathBuf::new();
    let res: Result<(), ReplaceError> = replacer.write_with(&target, WriteMode::Text, None, |s| {
        staging_seen = s.staging_path().to_path_buf();
        let _ = s.write_all(b"new");
        // Removing the staging file will now fail with EACCES.
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();
        Err(ReplaceError::Write {
            staging: s.staging_path().to_path_buf(),
            source: io::Error::other("disk on fire"),
        })
    });

    fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

    match res {
        Err(ReplaceError::Write { source, .. }) => assert_eq!(source.to_string(), "disk on fire"),
        other => panic!("expected the closure's error, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");

    let failures = recorder.cleanup_failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, staging_seen);
    assert_eq!(failures[0].1, io::ErrorKind::PermissionDenied);
    assert!(staging_seen.exists(), "orphan stays until swept");
}
