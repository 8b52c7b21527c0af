use crate::consts::{APP_NAME, PARENT_STORE_ENV_VAR, STORE_ENV_VAR};
use std::path::PathBuf;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  let userprofile = std::env::var("USERPROFILE").expect("USERPROFILE not set");
  PathBuf::from(userprofile)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  let home = std::env::var("HOME").expect("HOME not set");
  PathBuf::from(home)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  let appdata = std::env::var("APPDATA").expect("APPDATA not set");
  PathBuf::from(appdata).join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Returns the directory for cache files for the application
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  let local_appdata = std::env::var("LOCALAPPDATA").expect("LOCALAPPDATA not set");
  PathBuf::from(local_appdata).join(APP_NAME).join("Cache")
}

/// Returns the directory for cache files for the application
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Returns the dependency store root.
///
/// `KILN_STORE` overrides the default of `<data_dir>/store`.
pub fn store_dir() -> PathBuf {
  if let Ok(path) = std::env::var(STORE_ENV_VAR) {
    return PathBuf::from(path);
  }

  data_dir().join("store")
}

/// Returns the read-only parent store, if one is configured.
///
/// A parent store is consulted on cache miss before building; CI setups
/// point this at a shared, pre-warmed store.
pub fn parent_store_dir() -> Option<PathBuf> {
  std::env::var(PARENT_STORE_ENV_VAR).ok().map(PathBuf::from)
}
