//! Platform-specific paths for configuration and calibration files.
//!
//! - **User config**: `~/.config/resona/` (Linux), `~/Library/Application Support/resona/` (macOS), `%APPDATA%\resona\` (Windows)
//! - **Capture config**: `<user config>/capture.toml`
//! - **Calibration files**: `<user config>/calibration/`
//!
//! # Example
//!
//! ```rust,no_run
//! use resona_config::{CaptureConfig, paths};
//!
//! let config = CaptureConfig::load(paths::default_config_path()).unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "resona";

/// File name of the capture configuration.
const CONFIG_FILE: &str = "capture.toml";

/// Subdirectory name for calibration files.
const CALIBRATION_SUBDIR: &str = "calibration";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the capture configuration file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Directory searched for calibration files referenced by identifier.
pub fn calibration_dir() -> PathBuf {
    user_config_dir().join(CALIBRATION_SUBDIR)
}

/// Create `dir` if it does not exist.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    Ok(())
}

/// Ensure the user config directory exists and return it.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Calibration files (`.txt`, `.cal`, `.frd`) in `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_calibration_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "txt" | "cal" | "frd"))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn paths_share_app_dir() {
        let base = user_config_dir();
        assert!(base.ends_with(APP_NAME));
        assert_eq!(default_config_path(), base.join("capture.toml"));
        assert_eq!(calibration_dir(), base.join("calibration"));
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn lists_only_calibration_files() {
        let temp = TempDir::new().unwrap();
        for name in ["b.txt", "a.CAL", "notes.md", "c.frd"] {
            std::fs::write(temp.path().join(name), "").unwrap();
        }
        let names: Vec<_> = list_calibration_files(temp.path())
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, ["a.CAL", "b.txt", "c.frd"]);
    }

    #[test]
    fn missing_dir_lists_nothing() {
        assert!(list_calibration_files(Path::new("/nonexistent/resona")).is_empty());
    }
}
