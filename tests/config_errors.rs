use atomic_replace::{AtomicReplacer, ConfigError, Encoding, ReplaceError, WriteMode};
use std::str::FromStr;
use tempfile::tempdir;

#[test]
fn binary_with_encoding_rejected_before_touching_disk() {
    let td = tempdir().unwrap();
    let dir = td.path().join("not_yet");
    let target = dir.join("x.bin");

    let err = AtomicReplacer::default()
        .begin(&target, WriteMode::Binary, Some(Encoding::Utf8))
        .unwrap_err();

    assert!(matches!(err, ReplaceError::Config(ConfigError::EncodingWithBinary(ref e)) if e == "utf-8"));
    assert_eq!(err.code(), 2);
    assert!(!dir.exists(), "parent directory must not be created");
}

#[test]
fn binary_without_encoding_is_fine() {
    let td = tempdir().unwrap();
    let s = AtomicReplacer::default().begin(td.path().join("ok.bin"), WriteMode::Binary, None).unwrap();
    assert_eq!(s.encoding(), None);
    s.abort();
}

#[test]
fn text_mode_defaults_to_utf8() {
    let td = tempdir().unwrap();
    let s = AtomicReplacer::default().begin(td.path().join("ok.txt"), WriteMode::Text, None).unwrap();
    assert_eq!(s.encoding(), Some(Encoding::Utf8));
    s.abort();
}

#[test]
fn mode_strings_parse() {
    assert_eq!(WriteMode::from_str("w").unwrap(), WriteMode::Text);
    assert_eq!(WriteMode::from_str("wt").unwrap(), WriteMode::Text);
    assert_eq!(WriteMode::from_str("wb").unwrap(), WriteMode::Binary);
    assert!(matches!(WriteMode::from_str("a+"), Err(ConfigError::UnknownMode(_))));
}

#[test]
fn encoding_names_parse() {
    assert_eq!(Encoding::from_str("UTF-8").unwrap(), Encoding::Utf8);
    assert_eq!(Encoding::from_str("utf_16_le").unwrap(), Encoding::Utf16Le);
    assert_eq!(Encoding::from_str("ISO-8859-1").unwrap(), Encoding::Latin1);
    assert!(matches!(Encoding::from_str("ebcdic"), Err(ConfigError::UnknownEncoding(_))));
}

#[test]
fn target_without_file_name_is_invalid() {
    let td = tempdir().unwrap();
    let err = AtomicReplacer::default()
        .begin(td.path().join(".."), WriteMode::Text, None)
        .unwrap_err();
    assert!(matches!(err, ReplaceError::Config(ConfigError::InvalidTarget(_))));
}
