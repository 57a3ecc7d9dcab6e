use atomic_replace::{is_staging_name, AtomicReplacer, ReplaceError, WriteMode};
use std::fs;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tempfile::tempdir;

fn no_staging_left(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().flatten().all(|e| !is_staging_name(&e.file_name()))
}

#[derive(Debug)]
enum JobError {
    Replace(ReplaceError),
    Interrupted,
}

impl From<ReplaceError> for JobError {
    fn from(e: ReplaceError) -> Self {
        JobError::Replace(e)
    }
}

#[test]
fn failing_closure_keeps_old_content_and_returns_its_error() {
    let td = tempdir().unwrap();
    let target = td.path().join("state.txt");
    fs::write(&target, "old").unwrap();

    let res: Result<(), JobError> = AtomicReplacer::default().write_with(&target, WriteMode::Text, None, |s| {
        s.write_all(b"partial new cont").map_err(|e| JobError::Replace(ReplaceError::Write {
            staging: s.staging_path().to_path_buf(),
            source: e,
        }))?;
        Err(JobError::Interrupted)
    });

    assert!(matches!(res, Err(JobError::Interrupted)));
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    assert!(no_staging_left(td.path()));
}

#[test]
fn failing_closure_on_new_target_creates_nothing() {
    let td = tempdir().unwrap();
    let target = td.path().join("never.txt");
    let res: Result<(), ReplaceError> = AtomicReplacer::default().write_with(&target, WriteMode::Binary, None, |s| {
        Err(ReplaceError::Write {
            staging: s.staging_path().to_path_buf(),
            source: io::Error::other("producer gave up"),
        })
    });
    assert!(matches!(res, Err(ReplaceError::Write { .. })));
    assert!(!target.exists());
    assert!(no_staging_left(td.path()));
}

#[test]
fn panic_inside_closure_aborts() {
    let td = tempdir().unwrap();
    let target = td.path().join("p.txt");
    fs::write(&target, "old").unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: Result<(), ReplaceError> = AtomicReplacer::default().write_with(&target, WriteMode::Text, None, |s| {
            let _ = s.write_all(b"half");
            panic!("producer crashed");
        });
    }));

    assert!(outcome.is_err());
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    assert!(no_staging_left(td.path()));
}

#[test]
fn dropping_an_uncommitted_session_aborts() {
    let td = tempdir().unwrap();
    let target = td.path().join("d.txt");
    fs::write(&target, "old").unwrap();
    {
        let mut s = AtomicReplacer::default().begin(&target, WriteMode::Text, None).unwrap();
        s.write_text("replacement that never lands").unwrap();
    }
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    assert!(no_staging_left(td.path()));
}
