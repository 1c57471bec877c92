//! Data-root resolution and environment settings.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `GEOEL_DATA_DIR` | Root directory; one sub-directory per dataset below it | home directory |
//! | `GEOEL_CACHE_SIZE` | Maximum open tiles per dataset, `0` = unbounded | unbounded |
//! | `GEOEL_SRTM1` | Use SRTM1 for the finest zoom levels (`true`/`1`) | false |
//! | `GEOEL_DOWNLOAD_SOURCE` | Named source: `ardupilot` | none |
//! | `GEOEL_DOWNLOAD_URL_<DATASET>` | URL template for one dataset, e.g. `GEOEL_DOWNLOAD_URL_GLOBE` | none |
//!
//! The download variables are only read with the `download` feature.

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::dataset::Dataset;

pub const DATA_DIR_ENV: &str = "GEOEL_DATA_DIR";
pub const CACHE_SIZE_ENV: &str = "GEOEL_CACHE_SIZE";
pub const SRTM1_ENV: &str = "GEOEL_SRTM1";
pub const DOWNLOAD_SOURCE_ENV: &str = "GEOEL_DOWNLOAD_SOURCE";

/// Name of the URL template variable for `dataset`.
pub fn download_url_env(dataset: Dataset) -> String {
    format!("GEOEL_DOWNLOAD_URL_{}", dataset.name())
}

/// Pick the directory all dataset directories live under.
///
/// The configured path wins when it is non-empty and exists. Otherwise the
/// user's home directory is used (`HOME`, then `USERPROFILE`), and the
/// current directory as a last resort.
pub fn resolve_data_root(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
        if path.is_dir() {
            return path.to_path_buf();
        }
        warn!(path = %path.display(), "Configured data directory does not exist, using home directory");
    }
    home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// The user's home directory from the environment.
pub fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(env::var_os)
        .find(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Read a boolean flag: `1`, `true` and `yes` (any case) are true.
pub fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Read an unsigned integer, ignoring values that do not parse.
pub fn env_u64(name: &str) -> Option<u64> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(variable = name, %value, "Ignoring non-numeric value");
            None
        }
    }
}

/// Read a non-empty string.
pub fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    /// Set `vars` for the duration of `f`, then restore the previous values.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let saved: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var_os(k))).collect();
        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        f();
        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_configured_root_used_when_present() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_data_root(Some(dir.path())), dir.path());
    }

    #[test]
    #[serial]
    fn test_missing_root_falls_back_to_home() {
        let home = TempDir::new().unwrap();
        let home_str = home.path().to_str().unwrap();
        with_env(&[("HOME", Some(home_str)), ("USERPROFILE", None)], || {
            let missing = home.path().join("does-not-exist");
            assert_eq!(resolve_data_root(Some(&missing)), home.path());
            assert_eq!(resolve_data_root(Some(Path::new(""))), home.path());
            assert_eq!(resolve_data_root(None), home.path());
        });
    }

    #[test]
    #[serial]
    fn test_userprofile_then_current_dir() {
        with_env(
            &[("HOME", None), ("USERPROFILE", Some("/users/someone"))],
            || assert_eq!(resolve_data_root(None), PathBuf::from("/users/someone")),
        );
        with_env(&[("HOME", Some("")), ("USERPROFILE", None)], || {
            assert_eq!(resolve_data_root(None), PathBuf::from("."))
        });
    }

    #[test]
    #[serial]
    fn test_env_parsing() {
        with_env(
            &[
                ("GEOEL_TEST_FLAG", Some("TRUE")),
                ("GEOEL_TEST_NUM", Some(" 42 ")),
                ("GEOEL_TEST_BAD", Some("lots")),
                ("GEOEL_TEST_EMPTY", Some("  ")),
            ],
            || {
                assert!(env_flag("GEOEL_TEST_FLAG"));
                assert!(!env_flag("GEOEL_TEST_NUM"));
                assert!(!env_flag("GEOEL_TEST_UNSET"));
                assert_eq!(env_u64("GEOEL_TEST_NUM"), Some(42));
                assert_eq!(env_u64("GEOEL_TEST_BAD"), None);
                assert_eq!(env_string("GEOEL_TEST_EMPTY"), None);
                assert_eq!(env_string("GEOEL_TEST_NUM").as_deref(), Some(" 42 "));
            },
        );
    }

    #[test]
    fn test_download_url_env() {
        assert_eq!(download_url_env(Dataset::Globe), "GEOEL_DOWNLOAD_URL_GLOBE");
        assert_eq!(download_url_env(Dataset::Srtm3), "GEOEL_DOWNLOAD_URL_SRTM3");
    }
}
