use std::env;
use std::path::{Path, PathBuf};

pub const LIB_DIR_ENV: &str = "HEARTBOUND_LIB_DIR";
pub const CONFIG_DIR_NAME: &str = "heartbound-save-editor";
pub const SAVE_FOLDER: &str = "Heartbound";
pub const SAVE_FILE_NAME: &str = "heartbound_save8.thor";

/// Resource tables shipped with this crate.
pub fn bundled_lib_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources").join("lib")
}

/// Explicit override first, then `HEARTBOUND_LIB_DIR`, then the bundled tables.
pub fn resolve_lib_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match env::var_os(LIB_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => bundled_lib_dir(),
    }
}

/// `$XDG_CONFIG_HOME/heartbound-save-editor`, or `$HOME/.config/...`.
pub fn default_config_dir() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(CONFIG_DIR_NAME));
    }
    env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}

/// Where the game keeps its save on Windows.
pub fn default_save_path() -> Option<PathBuf> {
    env::var_os("LocalAppData")
        .filter(|v| !v.is_empty())
        .map(|root| PathBuf::from(root).join(SAVE_FOLDER).join(SAVE_FILE_NAME))
}
