// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the WKCACHE_HOME environment variable for isolation.
// When WKCACHE_HOME is set, config and data live under that directory.
// When unset, config uses ~/.wkcache/ and data uses XDG_DATA_HOME/wkcache.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the WKCACHE_HOME override, if set.
fn wkcache_home() -> Option<PathBuf> {
    std::env::var_os("WKCACHE_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory when none is known.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $WKCACHE_HOME/ or ~/.wkcache/
pub fn config_dir() -> PathBuf {
    if let Some(home) = wkcache_home() {
        return home;
    }
    dirs_home().join(".wkcache")
}

/// Data directory: $WKCACHE_HOME/data/ or ~/.local/share/wkcache/
pub fn data_dir() -> PathBuf {
    if let Some(home) = wkcache_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "wkcache") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Persistent cache database
pub fn cache_db_path() -> PathBuf {
    data_dir().join("cache.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
