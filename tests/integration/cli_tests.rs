use clap::Parser;
use memfs::cli::{Cli, Commands, OutputFormat, StoreBackend};
use memfs::error::ExitCode;
use memfs::key::CacheKey;
use memfs::loader::LoadError;
use memfs::store::{CacheStore, SqliteStore};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Arguments that keep the run away from user configuration.
fn base_args(dir: &Path) -> Vec<String> {
    vec![
        "memfs".to_string(),
        "--quiet".to_string(),
        "--config".to_string(),
        dir.join("absent.toml").to_string_lossy().into_owned(),
        "--database".to_string(),
        dir.join("memfs.db").to_string_lossy().into_owned(),
    ]
}

fn cli(dir: &Path, extra: &[&str]) -> Cli {
    let mut args = base_args(dir);
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_parse_load_command() {
    let cli = Cli::try_parse_from([
        "memfs", "--pool", "web", "load", "-r", "-o", "json", "/a.php", "/b.php",
    ])
    .unwrap();

    assert_eq!(cli.pool.as_deref(), Some("web"));
    match cli.command {
        Commands::Load(args) => {
            assert_eq!(args.identifiers, ["/a.php", "/b.php"]);
            assert!(args.required);
            assert_eq!(args.output, OutputFormat::Json);
        }
        other => panic!("Expected load command, got {:?}", other),
    }
}

#[test]
fn test_parse_requires_identifiers() {
    assert!(Cli::try_parse_from(["memfs", "load"]).is_err());
    assert!(Cli::try_parse_from(["memfs", "flush"]).is_err());
}

#[test]
fn test_parse_backend() {
    let cli = Cli::try_parse_from(["memfs", "--backend", "memory", "flush-all"]).unwrap();
    assert_eq!(cli.backend, Some(StoreBackend::Memory));
}

#[test]
fn test_run_load_populates_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.php");
    fs::write(&path, "<?php a();").unwrap();
    let id = path.to_string_lossy().into_owned();

    let code = memfs::run_app(cli(dir.path(), &["--pool", "cli", "load", &id])).unwrap();
    assert_eq!(code, ExitCode::Success);

    let store = SqliteStore::open(&dir.path().join("memfs.db"), "cli").unwrap();
    assert_eq!(
        store.get(&CacheKey::derive(&id)).unwrap(),
        Some(b"<?php a();\n?>\n".to_vec())
    );
}

#[test]
fn test_run_partial_load_exit_code() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.php");
    fs::write(&path, "<?php a(); ?>").unwrap();
    let id = path.to_string_lossy().into_owned();
    let missing = dir.path().join("missing.php").to_string_lossy().into_owned();

    let code = memfs::run_app(cli(
        dir.path(),
        &["--backend", "memory", "load", "-o", "json", &id, &missing],
    ))
    .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
}

#[test]
fn test_run_required_missing_maps_to_exit_code() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.php").to_string_lossy().into_owned();

    let err = memfs::run_app(cli(dir.path(), &["--backend", "memory", "load", "-r", &missing]))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LoadError>(),
        Some(LoadError::ResourceUnavailable { .. })
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::ResourceUnavailable);
}

#[test]
fn test_run_once_and_flush() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.php");
    fs::write(&path, "<?php a(); ?>").unwrap();
    let id = path.to_string_lossy().into_owned();
    let db = dir.path().join("memfs.db");

    assert_eq!(
        memfs::run_app(cli(dir.path(), &["once", &id])).unwrap(),
        ExitCode::Success
    );
    assert_eq!(
        memfs::run_app(cli(dir.path(), &["once", &id])).unwrap(),
        ExitCode::Success
    );
    let key = CacheKey::derive(&id);
    assert!(SqliteStore::open(&db, "memfs").unwrap().exists(&key).unwrap());

    memfs::run_app(cli(dir.path(), &["flush", &id])).unwrap();
    assert!(!SqliteStore::open(&db, "memfs").unwrap().exists(&key).unwrap());
}

#[test]
fn test_run_key_needs_no_store() {
    let dir = tempdir().unwrap();
    let code = memfs::run_app(cli(dir.path(), &["key", "/a.php", "http://x/y"])).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!dir.path().join("memfs.db").exists());
}
