use memfs::key::CacheKey;
use memfs::loader::{LoadError, Loader};
use memfs::store::{CacheStore, MemoryStore};
use std::fs;
use tempfile::tempdir;

use super::support::CountingStore;

#[test]
fn test_once_loads_uncached_identifier() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("boot.php");
    fs::write(&path, "<?php boot();").unwrap();
    let id = path.to_string_lossy().into_owned();

    let loader = Loader::new(MemoryStore::new());
    let outcome = loader.once(&id, true).unwrap().unwrap();

    assert_eq!(outcome.resources[0].content, "<?php boot();\n?>\n");
    assert!(loader.store().exists(&CacheKey::derive(&id)).unwrap());
}

#[test]
fn test_once_on_cached_identifier_does_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("boot.php");
    fs::write(&path, "<?php boot(); ?>").unwrap();
    let id = path.to_string_lossy().into_owned();

    let loader = Loader::new(CountingStore::default());
    loader.load(&[&id], true).unwrap();
    let multi_gets = loader.store().multi_gets();
    let sets = loader.store().sets();

    // Removing the source proves nothing is read
    fs::remove_file(&path).unwrap();
    assert!(loader.once(&id, true).unwrap().is_none());

    assert_eq!(loader.store().sets(), sets);
    assert_eq!(loader.store().multi_gets(), multi_gets);
    assert_eq!(loader.store().gets(), 1);
    assert_eq!(
        loader.store().get(&CacheKey::derive(&id)).unwrap(),
        Some(b"<?php boot(); ?>".to_vec())
    );
}

#[test]
fn test_once_on_uncached_identifier_writes_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("boot.php");
    fs::write(&path, "<?php boot();").unwrap();
    let id = path.to_string_lossy().into_owned();

    let loader = Loader::new(CountingStore::default());
    assert!(loader.once(&id, true).unwrap().is_some());
    assert_eq!(loader.store().multi_gets(), 1);
    assert_eq!(loader.store().sets(), 1);
}

#[test]
fn test_once_missing_required_fails() {
    let dir = tempdir().unwrap();
    let id = dir.path().join("nope.php").to_string_lossy().into_owned();

    let loader = Loader::new(MemoryStore::new());
    assert!(matches!(
        loader.once(&id, true),
        Err(LoadError::ResourceUnavailable { .. })
    ));

    let outcome = loader.once(&id, false).unwrap().unwrap();
    assert!(outcome.is_empty());
    assert_eq!(outcome.skipped.len(), 1);
}

#[test]
fn test_once_rejects_empty_identifier() {
    let loader = Loader::new(MemoryStore::new());
    assert!(matches!(
        loader.once("", false),
        Err(LoadError::EmptyIdentifier)
    ));
}

#[test]
fn test_flush_forces_refetch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("page.php");
    fs::write(&path, "<?php v1();").unwrap();
    let id = path.to_string_lossy().into_owned();

    let loader = Loader::new(MemoryStore::new());
    loader.load(&[&id], true).unwrap();

    fs::write(&path, "<?php v2();").unwrap();
    loader.flush(&[&id]).unwrap();

    let outcome = loader.load(&[&id], true).unwrap();
    assert_eq!(outcome.resources[0].content, "<?php v2();\n?>\n");
}

#[test]
fn test_flush_unknown_identifier_is_ok() {
    let loader = Loader::new(MemoryStore::new());
    loader.flush(&["/never/loaded.php"]).unwrap();
    assert!(loader.store().is_empty().unwrap());
}

#[test]
fn test_flush_all_empties_pool() {
    let dir = tempdir().unwrap();
    let ids: Vec<String> = (0..3)
        .map(|i| {
            let path = dir.path().join(format!("{i}.php"));
            fs::write(&path, "<? x ?>").unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect();

    let loader = Loader::new(MemoryStore::new());
    loader.load(&ids, true).unwrap();
    assert_eq!(loader.store().len().unwrap(), 3);

    loader.flush_all().unwrap();
    assert!(loader.store().is_empty().unwrap());
}
