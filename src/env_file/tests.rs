// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use tempfile::TempDir;

use super::patch::{EnvPatch, PatchOptions};
use super::{EnvDocument, SetOutcome, load, save};
use crate::error::{EnvFileError, TunnelError};

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_keeps_order() {
    let doc = EnvDocument::parse("FOO=bar\nBAZ=qux\nA=1\n");
    let keys: Vec<_> = doc.keys().collect();
    assert_eq!(keys, ["FOO", "BAZ", "A"]);
    assert_eq!(doc.skipped_lines(), 0);
}

#[test]
fn test_parse_splits_on_first_equals() {
    let doc = EnvDocument::parse("DSN=postgres://u:p@h/db?sslmode=require\n");
    assert_eq!(doc.get("DSN"), Some("postgres://u:p@h/db?sslmode=require"));
}

#[test]
fn test_parse_keeps_quotes_literal() {
    let doc = EnvDocument::parse("SERVER_URL=\"https://old.example/\"\nNAME='x'\n");
    assert_eq!(doc.get("SERVER_URL"), Some("\"https://old.example/\""));
    assert_eq!(doc.get("NAME"), Some("'x'"));
}

#[test]
fn test_parse_skips_malformed_lines() {
    let doc = EnvDocument::parse("\nFOO=bar\nnot a pair\n=novalue\n# COMMENT=1\n  \nBAZ=\n");
    let entries: Vec<_> = doc.iter().collect();
    assert_eq!(entries, [("FOO", "bar"), ("BAZ", "")]);
    assert_eq!(doc.skipped_lines(), 5);
}

#[test]
fn test_parse_handles_crlf() {
    let doc = EnvDocument::parse("FOO=bar\r\nBAZ=qux\r\n");
    assert_eq!(doc.get("FOO"), Some("bar"));
    assert_eq!(doc.render(), "FOO=bar\nBAZ=qux\n");

    let unterminated = EnvDocument::parse("FOO=bar\r");
    assert_eq!(unterminated.get("FOO"), Some("bar"));
}

#[test]
fn test_parse_duplicate_key_keeps_first_position_last_value() {
    let doc = EnvDocument::parse("A=1\nB=2\nA=3\n");
    let entries: Vec<_> = doc.iter().collect();
    assert_eq!(entries, [("A", "3"), ("B", "2")]);
}

#[test]
fn test_parse_trims_key_but_not_value() {
    let doc = EnvDocument::parse("  KEY =  spaced value \n");
    assert_eq!(doc.get("KEY"), Some("  spaced value "));
}

// =============================================================================
// Set
// =============================================================================

#[test]
fn test_set_new_key_appends() {
    let mut doc = EnvDocument::parse("FOO=bar\nBAZ=qux");
    let outcome = doc.set("SERVER_URL", "https://x.example/");

    assert_eq!(outcome, SetOutcome::Inserted);
    assert_eq!(doc.render(), "FOO=bar\nBAZ=qux\nSERVER_URL=https://x.example/\n");
}

#[test]
fn test_set_existing_key_keeps_position() {
    let mut doc = EnvDocument::parse("SERVER_URL=old\nFOO=bar");
    let outcome = doc.set("SERVER_URL", "https://y.example/");

    assert_eq!(outcome, SetOutcome::Updated);
    assert_eq!(doc.render(), "SERVER_URL=https://y.example/\nFOO=bar\n");
}

#[test]
fn test_set_same_value_is_unchanged() {
    let mut doc = EnvDocument::parse("FOO=bar\n");
    assert_eq!(doc.set("FOO", "bar"), SetOutcome::Unchanged);
    assert_eq!(doc.len(), 1);
}

#[test]
fn test_set_leaves_other_keys_alone() {
    let before = EnvDocument::parse("A=1\nB=2\nC=3\n");
    let mut after = before.clone();
    after.set("B", "two");

    assert_eq!(after.len(), before.len());
    for key in ["A", "C"] {
        assert_eq!(after.get(key), before.get(key), "{key} should be untouched");
    }
    assert_eq!(after.get("B"), Some("two"));
    assert!(!after.contains_key("D"));
}

#[test]
fn test_from_iter_dedups_keys() {
    let doc: EnvDocument = [("A", "1"), ("B", "2"), ("A", "9")].into_iter().collect();
    assert_eq!(doc.render(), "A=9\nB=2\n");
}

// =============================================================================
// Load / Save
// =============================================================================

#[test]
fn test_load_missing_file_is_empty() {
    let dir = temp_dir();
    let doc = load(&dir.path().join(".env")).expect("missing file should not fail");
    assert!(doc.is_empty());
}

#[test]
fn test_load_directory_is_read_error() {
    let dir = temp_dir();
    let err = load(dir.path()).expect_err("a directory is not an env file");
    assert!(matches!(err, EnvFileError::Read { .. }));
}

#[test]
fn test_save_creates_missing_file() {
    let dir = temp_dir();
    let path = dir.path().join(".env");

    let mut doc = load(&path).unwrap();
    doc.set("SERVER_URL", "https://z.example/");
    save(&doc, &path).unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "SERVER_URL=https://z.example/\n"
    );
}

#[test]
fn test_save_replaces_content() {
    let dir = temp_dir();
    let path = dir.path().join(".env");
    std::fs::write(&path, "A=1\nB=2\nC=3\nD=4\n").unwrap();

    let doc: EnvDocument = [("A", "1")].into_iter().collect();
    save(&doc, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "A=1\n");
}

#[test]
fn test_load_save_round_trip_is_stable() {
    let dir = temp_dir();
    let path = dir.path().join(".env");
    let content = "FOO=bar\nSERVER_URL=\"https://q.example/\"\nEMPTY=\n";
    std::fs::write(&path, content).unwrap();

    let doc = load(&path).unwrap();
    save(&doc, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_save_missing_parent_is_write_error() {
    let dir = temp_dir();
    let path = dir.path().join("nope").join(".env");

    let err = save(&EnvDocument::new(), &path).expect_err("parent does not exist");
    assert!(matches!(err, EnvFileError::Write { .. }));
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn test_save_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt as _;

    let dir = temp_dir();
    let path = dir.path().join(".env");
    std::fs::write(&path, "A=1\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

    let mut doc = load(&path).unwrap();
    doc.set("B", "2");
    save(&doc, &path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}

#[cfg(unix)]
#[test]
fn test_save_new_file_follows_umask() {
    use std::os::unix::fs::PermissionsExt as _;

    let dir = temp_dir();
    let reference = dir.path().join("reference");
    std::fs::write(&reference, "").unwrap();
    let path = dir.path().join(".env");

    save(&EnvDocument::new(), &path).unwrap();

    let created = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    let expected = std::fs::metadata(&reference).unwrap().permissions().mode() & 0o777;
    assert_eq!(created, expected);
}

#[cfg(unix)]
#[test]
fn test_save_writes_through_symlink() {
    let dir = temp_dir();
    let real = dir.path().join("real.env");
    let link = dir.path().join(".env");
    std::fs::write(&real, "FOO=bar\n").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let mut doc = load(&link).unwrap();
    doc.set("SERVER_URL", "https://s.example/");
    save(&doc, &link).unwrap();

    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(
        std::fs::read_to_string(&real).unwrap(),
        "FOO=bar\nSERVER_URL=https://s.example/\n"
    );
}

// =============================================================================
// Patch
// =============================================================================

#[test]
fn test_patch_server_url_gets_trailing_slash() {
    let patch = EnvPatch::for_url("https://abc.loca.lt", &PatchOptions::default()).unwrap();
    let entries: Vec<_> = patch.iter().collect();
    assert_eq!(entries, [("SERVER_URL", "https://abc.loca.lt/")]);
}

#[test]
fn test_patch_no_double_slash() {
    let patch = EnvPatch::for_url("https://abc.loca.lt/", &PatchOptions::default()).unwrap();
    let entries: Vec<_> = patch.iter().collect();
    assert_eq!(entries, [("SERVER_URL", "https://abc.loca.lt/")]);
}

#[test]
fn test_patch_with_nginx_host() {
    let options = PatchOptions::builder()
        .nginx_host_key("NGINX_HOST")
        .build();
    let patch = EnvPatch::for_url("http://abc.loca.lt", &options).unwrap();
    let entries: Vec<_> = patch.iter().collect();
    assert_eq!(
        entries,
        [
            ("SERVER_URL", "http://abc.loca.lt/"),
            ("NGINX_HOST", "abc.loca.lt")
        ]
    );
}

#[test]
fn test_patch_custom_key_without_slash() {
    let options = PatchOptions::builder()
        .server_url_key("PUBLIC_URL")
        .trailing_slash(false)
        .build();
    let patch = EnvPatch::for_url("https://abc.loca.lt", &options).unwrap();
    let entries: Vec<_> = patch.iter().collect();
    assert_eq!(entries, [("PUBLIC_URL", "https://abc.loca.lt")]);
}

#[test]
fn test_patch_rejects_non_http_url() {
    for url in ["ftp://abc", "abc.loca.lt", "https://", ""] {
        let err = EnvPatch::for_url(url, &PatchOptions::default()).unwrap_err();
        assert!(matches!(err, TunnelError::InvalidUrl(_)), "{url:?}");
    }
}

#[test]
fn test_patch_apply_preserves_unrelated_keys() {
    let mut doc = EnvDocument::parse("SERVER_URL=old\nFOO=bar\n");
    let options = PatchOptions::builder()
        .nginx_host_key("NGINX_HOST")
        .build();
    EnvPatch::for_url("https://y.example", &options)
        .unwrap()
        .apply(&mut doc);

    assert_eq!(
        doc.render(),
        "SERVER_URL=https://y.example/\nFOO=bar\nNGINX_HOST=y.example\n"
    );
}
