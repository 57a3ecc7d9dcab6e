use atomic_replace::{is_staging_name, AtomicReplacer};
use rayon::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn parallel_writes_to_different_targets_are_independent() {
    let td = tempdir().unwrap();
    let r = AtomicReplacer::default();

    (0..64).into_par_iter().for_each(|i| {
        let target = td.path().join(format!("f{i}.txt"));
        r.write_text(&target, &format!("content {i}"), None).unwrap();
    });

    for i in 0..64 {
        let got = fs::read_to_string(td.path().join(format!("f{i}.txt"))).unwrap();
        assert_eq!(got, format!("content {i}"));
    }
    assert!(fs::read_dir(td.path()).unwrap().flatten().all(|e| !is_staging_name(&e.file_name())));
}

#[test]
fn racing_writers_on_one_target_leave_one_complete_version() {
    let td = tempdir().unwrap();
    let target = td.path().join("shared.txt");
    let r = AtomicReplacer::default();
    let payload = |i: usize| format!("{i}:").repeat(4096);

    (0..16).into_par_iter().for_each(|i| {
        r.write_text(&target, &payload(i), None).unwrap();
    });

    let got = fs::read_to_string(&target).unwrap();
    assert!((0..16).any(|i| got == payload(i)), "target holds a mixed or truncated write");
    assert!(fs::read_dir(td.path()).unwrap().flatten().all(|e| !is_staging_name(&e.file_name())));
}
