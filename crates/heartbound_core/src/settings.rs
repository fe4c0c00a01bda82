//! Persistent editor preferences.
//!
//! The backing file holds one `key=value` pair per line, in insertion order.
//! Every successful `set`/`remove` rewrites the whole file. Nothing here is
//! allowed to interrupt the session: I/O problems are logged and the store
//! keeps working from memory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs_util::write_text_atomic;
use crate::keyed_table::{Iter, KeyedTable};
use crate::paths::default_config_dir;

pub const SETTINGS_FILE_NAME: &str = "editor.cfg";
pub const SETTINGS_BUCKETS: usize = 101;
pub const SETTINGS_LINE_BOUND: usize = 1024;
pub const SETTINGS_MAX_ENTRIES: usize = 10_000;

pub const KEY_AUTOMATIC_RELOADING: &str = "automatic_reloading";
pub const KEY_LAST_SAVE_PATH: &str = "last_save_path";

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    table: KeyedTable<String>,
}

impl SettingsStore {
    /// Load `path` if it exists. A missing or unreadable file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut table = KeyedTable::new(SETTINGS_BUCKETS, SETTINGS_LINE_BOUND);

        match fs::read(&path) {
            Ok(bytes) => load_entries(&mut table, &String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not read settings {}: {e}", path.display()),
        }
        debug!(path = %path.display(), entries = table.len(), "settings loaded");

        Self { path, table }
    }

    /// Open `editor.cfg` inside `dir`, creating the directory first.
    pub fn open_in_dir(dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(dir) {
            warn!("could not create settings directory {}: {e}", dir.display());
        }
        Self::open(dir.join(SETTINGS_FILE_NAME))
    }

    /// Open the store in the user's configuration directory, or in the
    /// working directory when no home directory is known.
    pub fn open_default() -> Self {
        match default_config_dir() {
            Some(dir) => Self::open_in_dir(&dir),
            None => Self::open(SETTINGS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Stored value for `key`; on a miss `default` is stored and returned.
    /// A pair the file format cannot hold is returned but not stored.
    pub fn get(&mut self, key: &str, default: &str) -> String {
        if let Some(value) = self.table.get(key) {
            return value.clone();
        }
        if let Err(reason) = check_pair(key, default) {
            warn!("not remembering setting {key:?}: {reason}");
            return default.to_string();
        }
        if let Err(e) = self.table.insert(key, default.to_string()) {
            warn!("could not remember default for setting {key}: {e}");
        }
        default.to_string()
    }

    /// Stored value for `key`, without creating it.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.table.get(key).map(String::as_str)
    }

    pub fn get_bool(&mut self, key: &str, default: bool) -> bool {
        match self.get(key, bool_str(default)).as_str() {
            "true" => true,
            "false" => false,
            _ => default,
        }
    }

    /// Store `value` and rewrite the file. Keys containing `=` or a line
    /// break, and values containing a line break, are skipped.
    pub fn set(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        if let Err(reason) = check_pair(key, value) {
            warn!("not storing setting {key:?}: {reason}");
            return;
        }
        match self.table.insert(key, value.to_string()) {
            Ok(_) => self.flush(),
            Err(e) => warn!("could not store setting {key}: {e}"),
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, bool_str(value));
    }

    pub fn remove(&mut self, key: &str) {
        if self.table.remove(key).is_some() {
            self.flush();
        }
    }

    pub fn iter(&self) -> Iter<'_, String> {
        self.table.iter()
    }

    /// Rewrite the backing file from the table.
    pub fn flush(&self) {
        let mut text = String::new();
        for (key, value) in &self.table {
            text.push_str(key);
            text.push('=');
            text.push_str(value);
            text.push('\n');
        }
        if let Err(e) = write_text_atomic(&self.path, &text) {
            warn!("could not write settings {}: {e}", self.path.display());
        }
    }

    pub fn close(mut self) {
        self.flush();
        self.table.clear();
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Whether `key=value` survives a write and reload as the same pair.
fn check_pair(key: &str, value: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("empty key");
    }
    if key.contains(['=', '\n', '\r']) {
        return Err("key contains '=' or a line break");
    }
    if value.contains(['\n', '\r']) {
        return Err("value contains a line break");
    }
    if key.len() + value.len() + 1 >= SETTINGS_LINE_BOUND {
        return Err("line too long");
    }
    Ok(())
}

fn load_entries(table: &mut KeyedTable<String>, contents: &str) {
    for (number, line) in contents.lines().enumerate().map(|(i, l)| (i + 1, l)) {
        if table.len() >= SETTINGS_MAX_ENTRIES {
            warn!("settings file exceeds {SETTINGS_MAX_ENTRIES} entries; ignoring the rest");
            break;
        }
        if line.len() >= SETTINGS_LINE_BOUND {
            warn!("skipping settings line {number}: longer than {SETTINGS_LINE_BOUND} bytes");
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!("skipping settings line {number}: no '=' separator");
            continue;
        };
        let value = value.trim_end_matches('\r');
        if key.is_empty() || value.is_empty() {
            warn!("skipping settings line {number}: empty key or value");
            continue;
        }
        if table.contains_key(key) {
            debug!("skipping settings line {number}: {key} already set");
            continue;
        }
        if let Err(e) = table.insert(key, value.to_string()) {
            warn!("stopped loading settings: {e}");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn parses_key_value_lines_and_skips_malformed() {
        let mut table = KeyedTable::new(SETTINGS_BUCKETS, SETTINGS_LINE_BOUND);
        load_entries(
            &mut table,
            "theme=dark\nnot a pair\n=orphan\nempty=\nurl=a=b\r\ntheme=light\n",
        );

        let pairs: Vec<_> = table.iter().map(|(k, v)| (k, v.as_str())).collect();
        assert_eq!(pairs, vec![("theme", "dark"), ("url", "a=b")]);
    }

    #[test]
    fn open_in_dir_creates_directory() {
        let temp = TempDir::new().expect("temp");
        let dir = temp.path().join("nested").join("config");
        let mut store = SettingsStore::open_in_dir(&dir);
        assert!(dir.is_dir());

        store.set("k", "v");
        assert_eq!(
            fs::read_to_string(dir.join(SETTINGS_FILE_NAME)).expect("read"),
            "k=v\n"
        );
    }

    #[test]
    fn bool_settings_fall_back_on_garbage() {
        let temp = TempDir::new().expect("temp");
        let mut store = SettingsStore::open(temp.path().join(SETTINGS_FILE_NAME));
        store.set("flag", "maybe");
        assert!(store.get_bool("flag", true));
        assert!(!store.get_bool("flag", false));

        store.set_bool("flag", false);
        assert!(!store.get_bool("flag", true));
    }

    #[test]
    fn pairs_that_break_the_line_format_are_refused() {
        assert!(check_pair("theme", "dark=ish").is_ok());
        assert!(check_pair("a=b", "c").is_err());
        assert!(check_pair("x", "1\ninjected=2").is_err());
        assert!(check_pair("x\r", "1").is_err());
        assert!(check_pair("x", "1\r").is_err());
        assert!(check_pair("", "1").is_err());
        assert!(check_pair("k", &"v".repeat(SETTINGS_LINE_BOUND)).is_err());
    }
}
