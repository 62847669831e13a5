//! Filesystem locations for config and log files.
//!
//! Everything lives under one `.mammoguard` folder in the OS config
//! directory. Setting `MAMMOGUARD_CONFIG_HOME` points the whole tree
//! somewhere else for portable installs.

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Folder kept under the OS config root.
pub const APP_DIR_NAME: &str = ".mammoguard";

/// Environment override for the base directory.
pub const CONFIG_HOME_ENV: &str = "MAMMOGUARD_CONFIG_HOME";

/// Failure to resolve or create an application directory.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No OS config directory and no override set.
    #[error("No config directory available on this system")]
    NoBaseDir,
    /// Directory could not be created.
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Root directory for config and logs, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(resolve_base()?.join(APP_DIR_NAME))
}

/// `logs/` under the app root, created on first use.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

fn resolve_base() -> Result<PathBuf, AppDirError> {
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        return Ok(PathBuf::from(path));
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(AppDirError::NoBaseDir)
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let base = tempdir().unwrap();
        let wanted = base.path().join(APP_DIR_NAME).join("logs");
        let created = ensure_dir(wanted.clone()).unwrap();
        assert_eq!(created, wanted);
        assert!(created.is_dir());
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let base = tempdir().unwrap();
        let wanted = base.path().join(APP_DIR_NAME);
        ensure_dir(wanted.clone()).unwrap();
        assert!(ensure_dir(wanted).is_ok());
    }

    #[test]
    fn ensure_dir_reports_the_failing_path() {
        let base = tempdir().unwrap();
        let blocker = base.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let wanted = blocker.join("nested");
        let err = ensure_dir(wanted.clone()).unwrap_err();
        let AppDirError::CreateDir { path, .. } = err else {
            panic!("expected CreateDir, got {err:?}");
        };
        assert_eq!(path, wanted);
    }
}
