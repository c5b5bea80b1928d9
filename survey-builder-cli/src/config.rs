//! Configuration file loading for survey-builder.
//!
//! Discovers and loads `survey-builder.toml` from the working directory.
//! Command-line flags take precedence over file settings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use fs_err as fs;
use serde::Deserialize;
use survey_builder::upload::DEFAULT_MAX_SIZE;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "survey-builder.toml";

/// Top-level configuration from survey-builder.toml.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub export: ExportConfig,
    pub upload: UploadConfig,
    pub ui: UiConfig,
}

/// Export section of the config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the export file is written to.
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

/// Upload section of the config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Size limit in bytes for file questions that set no `maxSize`.
    pub default_max_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            default_max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Terminal presentation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub colorful: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { colorful: true }
    }
}

/// Discover the survey-builder.toml config file in `dir`.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path.display());
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path.display());
        None
    }
}

/// Load and parse a config file.
pub fn load_config(path: &Path) -> anyhow::Result<BuilderConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path.display()))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<BuilderConfig> {
    let config: BuilderConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config file if given, else the one in `dir`, else defaults.
pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<BuilderConfig> {
    match explicit {
        Some(path) => load_config(path),
        None => match discover_config(dir) {
            Some(path) => load_config(&path),
            None => Ok(BuilderConfig::default()),
        },
    }
}

/// Settings after applying command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub export_dir: PathBuf,
    pub default_max_size: u64,
    pub colorful: bool,
}

impl BuilderConfig {
    /// Apply command-line overrides. Flags that were not given keep the
    /// file's value.
    pub fn merge(self, out_dir: Option<PathBuf>, plain: bool) -> Settings {
        Settings {
            export_dir: out_dir.unwrap_or(self.export.dir),
            default_max_size: self.upload.default_max_size,
            colorful: self.ui.colorful && !plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, BuilderConfig::default());
        assert_eq!(config.upload.default_max_size, 5 * 1024 * 1024);
        assert!(config.ui.colorful);
    }

    #[test]
    fn sections_are_read() {
        let config = parse_config(
            r#"
[export]
dir = "out"

[upload]
default_max_size = 1024

[ui]
colorful = false
"#,
        )
        .unwrap();

        assert_eq!(config.export.dir, PathBuf::from("out"));
        assert_eq!(config.upload.default_max_size, 1024);
        assert!(!config.ui.colorful);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = parse_config("[export\ndir = 1").unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn flags_override_file() {
        let config = parse_config("[export]\ndir = \"from-file\"").unwrap();
        let settings = config.clone().merge(Some(PathBuf::from("from-flag")), true);
        assert_eq!(settings.export_dir, PathBuf::from("from-flag"));
        assert!(!settings.colorful);

        let settings = config.merge(None, false);
        assert_eq!(settings.export_dir, PathBuf::from("from-file"));
        assert!(settings.colorful);
    }

    #[test]
    fn discovers_file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover_config(dir.path()), None);

        fs::write(dir.path().join(CONFIG_FILE_NAME), "[ui]\ncolorful = false\n").unwrap();
        let config = load_or_default(None, dir.path()).unwrap();
        assert!(!config.ui.colorful);
    }
}
