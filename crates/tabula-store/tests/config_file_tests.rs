// Integration tests for file-backed stores opened from configuration

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{numeric, NumericObject};
use tabula_core::StorageObject;
use tabula_store::{JournalMode, StorageLayer, StoreConfig};
use tempfile::TempDir;

#[test]
fn test_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::at_path(dir.path().join("store.db"));

    let key = {
        let layer = StorageLayer::open(&config).unwrap();
        layer.create_table::<NumericObject>().unwrap();
        let mut objects = vec![numeric(true, 11, 1.25, Some(3))];
        layer.save(&mut objects).unwrap();
        objects[0].primary_key().get().unwrap()
    };

    let layer = StorageLayer::open(&config).unwrap();
    let loaded: NumericObject = layer.fetch_by_primary_key(key).unwrap().unwrap();
    assert_eq!(loaded.my_integer, 11);
    assert_eq!(loaded.integer_object, Some(3));
}

#[test]
fn test_open_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("configured.db");
    let config_path = dir.path().join("tabula.toml");
    std::fs::write(
        &config_path,
        format!(
            "path = {:?}\njournal_mode = \"delete\"\nbusy_timeout_ms = 250\n",
            db_path.to_string_lossy()
        ),
    )
    .unwrap();

    let config = StoreConfig::load(&config_path).unwrap();
    assert_eq!(config.journal_mode, JournalMode::Delete);

    let layer = StorageLayer::open(&config).unwrap();
    layer.create_table::<NumericObject>().unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_missing_config_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = StoreConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, tabula_core::TabulaError::Config { .. }));
}
