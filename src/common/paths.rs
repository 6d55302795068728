//! Configuration file locations
//!
//! Project file: `./app-harness.toml`
//! User file, via the directories crate:
//! - Linux: `~/.config/app-harness/config.toml`
//! - macOS: `~/Library/Application Support/app-harness/config.toml`
//! - Windows: `%APPDATA%\app-harness\config.toml`

use std::path::PathBuf;

/// Name used for the per-user config directory
const APP_NAME: &str = "app-harness";

/// File name of the project-level configuration
pub const PROJECT_CONFIG_FILE: &str = "app-harness.toml";

/// Path of the project configuration file in the working directory
pub fn project_config_path() -> PathBuf {
    PathBuf::from(PROJECT_CONFIG_FILE)
}

/// Get the per-user configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the per-user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_config_path_is_relative() {
        let path = project_config_path();
        assert!(path.is_relative());
        assert_eq!(path.file_name().unwrap(), PROJECT_CONFIG_FILE);
    }

    #[test]
    fn test_config_path_file_name() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }
}
