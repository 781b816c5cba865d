//! Environment-sourced defaults: API key, download directory and cache path.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable holding the default API key.
pub const API_KEY_ENV: &str = "WALLHAVEN_API_KEY";

/// Environment variable holding the default download base directory.
pub const BASE_DIR_ENV: &str = "WALLHAVEN_DIR";

/// Environment variable overriding the cache file location.
pub const CACHE_FILE_ENV: &str = "WALLFETCH_CACHE_FILE";

/// Cache file name inside the cache directory.
const CACHE_FILE_NAME: &str = "wallhaven_cache.bin";

/// Application directory under the user cache home.
const APP_DIR_NAME: &str = "wallfetch";

/// Resolves the API key: explicit value, then `WALLHAVEN_API_KEY`.
#[must_use]
pub fn resolve_api_key(explicit: Option<String>) -> Option<String> {
    explicit
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(|| env_var_non_empty(API_KEY_ENV))
}

/// Resolves the download base directory: explicit value, then
/// `WALLHAVEN_DIR`, then the current directory.
#[must_use]
pub fn resolve_base_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env_var_non_empty_os(BASE_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolves the cache file path.
///
/// Priority:
/// 1. explicit value
/// 2. `$WALLFETCH_CACHE_FILE`
/// 3. `$XDG_CACHE_HOME/wallfetch/wallhaven_cache.bin`
/// 4. `$HOME/.cache/wallfetch/wallhaven_cache.bin`
/// 5. `./.cache/wallfetch/wallhaven_cache.bin`
#[must_use]
pub fn resolve_cache_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit.or_else(|| env_var_non_empty_os(CACHE_FILE_ENV).map(PathBuf::from))
    {
        return path;
    }

    let cache_home = env_var_non_empty_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| env_var_non_empty_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".").join(".cache"));

    cache_home.join(APP_DIR_NAME).join(CACHE_FILE_NAME)
}

fn env_var_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}
