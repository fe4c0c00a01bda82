use std::fs;

use heartbound_core::settings::{KEY_AUTOMATIC_RELOADING, SETTINGS_FILE_NAME, SettingsStore};
use tempfile::TempDir;

#[test]
fn first_default_sticks() {
    let temp = TempDir::new().expect("temp dir");
    let mut store = SettingsStore::open(temp.path().join(SETTINGS_FILE_NAME));

    assert_eq!(store.get("missing_key", "fallback"), "fallback");
    assert_eq!(store.get("missing_key", "other"), "fallback");
}

#[test]
fn set_and_remove_rewrite_file_in_insertion_order() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join(SETTINGS_FILE_NAME);
    let mut store = SettingsStore::open(&path);

    store.set("b", "2");
    store.set("a", "1");
    store.set("c", "3");
    store.set("b", "20");
    assert_eq!(fs::read_to_string(&path).expect("read"), "b=20\na=1\nc=3\n");

    store.remove("a");
    assert_eq!(fs::read_to_string(&path).expect("read"), "b=20\nc=3\n");

    store.remove("absent");
    assert_eq!(store.len(), 2);
}

#[test]
fn reopen_restores_values() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join(SETTINGS_FILE_NAME);
    {
        let mut store = SettingsStore::open(&path);
        store.set_bool(KEY_AUTOMATIC_RELOADING, false);
        store.set("last_save_path", "C:/Users/me/save.thor");
        store.close();
    }

    let mut store = SettingsStore::open(&path);
    assert!(!store.get_bool(KEY_AUTOMATIC_RELOADING, true));
    assert_eq!(store.get("last_save_path", ""), "C:/Users/me/save.thor");
}

#[test]
fn malformed_lines_are_ignored() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join(SETTINGS_FILE_NAME);
    fs::write(&path, "no separator here\nkey=value\n\n=x\n").expect("write");

    let store = SettingsStore::open(&path);
    let pairs: Vec<(&str, &str)> = store.iter().map(|(k, v)| (k, v.as_str())).collect();
    assert_eq!(pairs, vec![("key", "value")]);
}

#[test]
fn unwritable_location_keeps_working_in_memory() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("missing").join(SETTINGS_FILE_NAME);
    let mut store = SettingsStore::open(&path);

    store.set("k", "v");
    assert_eq!(store.get("k", "default"), "v");
    assert!(!path.exists());
}

#[test]
fn keys_and_values_that_would_split_lines_are_not_stored() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join(SETTINGS_FILE_NAME);
    {
        let mut store = SettingsStore::open(&path);
        store.set("a=b", "c");
        store.set("x", "1\ninjected=2");
        store.set("y", "2\r");
        store.set("theme", "dark");
        assert_eq!(store.get("a=b", "MISSING"), "MISSING");
        assert_eq!(store.get("z", "3\ninjected=4"), "3\ninjected=4");
        assert_eq!(store.len(), 1);
        store.close();
    }

    let store = SettingsStore::open(&path);
    let pairs: Vec<(&str, &str)> = store.iter().map(|(k, v)| (k, v.as_str())).collect();
    assert_eq!(pairs, vec![("theme", "dark")]);
    assert_eq!(fs::read_to_string(&path).expect("read"), "theme=dark\n");
}
