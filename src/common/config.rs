//! Configuration file handling
//!
//! `app-harness.toml` in the working directory takes precedence over the
//! per-user file. Command-line options override both.

use serde::Deserialize;
use std::path::Path;

use super::paths::{config_path, project_config_path};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Port for the live server collaborator
    #[serde(default)]
    pub liveserver_port: Option<u16>,

    /// Reject tests that use unregistered markers
    #[serde(default)]
    pub strict_markers: bool,

    /// Extra marker registrations, `name(args): description`
    #[serde(default)]
    pub markers: Vec<String>,
}

impl HarnessConfig {
    /// Load configuration from the project file, then the user file
    ///
    /// Returns default configuration if neither exists
    pub fn load() -> Result<Self> {
        let project = project_config_path();
        if project.exists() {
            return Self::load_from(&project);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Loaded harness configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app-harness.toml");
        std::fs::write(
            &path,
            "liveserver_port = 5005\nstrict_markers = true\nmarkers = [\"slow: marks slow tests\"]\n",
        )
        .unwrap();

        let config = HarnessConfig::load_from(&path).unwrap();
        assert_eq!(config.liveserver_port, Some(5005));
        assert!(config.strict_markers);
        assert_eq!(config.markers, vec!["slow: marks slow tests".to_string()]);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app-harness.toml");
        std::fs::write(&path, "").unwrap();

        assert_eq!(HarnessConfig::load_from(&path).unwrap(), HarnessConfig::default());
    }

    #[test]
    fn test_invalid_port_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app-harness.toml");
        std::fs::write(&path, "liveserver_port = 70000\n").unwrap();

        assert!(matches!(
            HarnessConfig::load_from(&path),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = HarnessConfig::load_from(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
