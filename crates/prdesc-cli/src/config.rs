//! Configuration resolution
//!
//! Settings are merged from, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User config (`<config dir>/prdesc/config.toml`)
//! 3. Repository config (`.prdesc.toml` in the working directory), or the
//!    file passed with `--config`
//! 4. Environment variables and command-line flags (handled by clap)

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use prdesc_sections::{DEFAULT_TOOL, validate_tool};
use prdesc_store::RetryPolicy;

use crate::error::{CliError, Result};

/// Repository config file name
pub const REPO_CONFIG_FILE: &str = ".prdesc.toml";

/// Default directory of the file store, relative to the working directory
pub const DEFAULT_STORE_DIR: &str = ".prdesc/documents";

/// One configuration file. Every key is optional so files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Tool identity written into the header line
    pub tool: Option<String>,
    /// Directory of the file store; relative paths are resolved against the
    /// directory holding the config file
    pub store: Option<PathBuf>,
    /// Retry policy for store operations
    pub retry: Option<RetryPolicy>,
}

impl ConfigFile {
    /// Parse a config file from TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut file = Self::parse(&content).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let (Some(store), Some(dir)) = (file.store.as_ref(), path.parent()) {
            if store.is_relative() {
                file.store = Some(dir.join(store));
            }
        }
        Ok(file)
    }

    /// Overlay `other` on top of `self`
    fn merge(self, other: ConfigFile) -> ConfigFile {
        ConfigFile {
            tool: other.tool.or(self.tool),
            store: other.store.or(self.store),
            retry: other.retry.or(self.retry),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub tool: Option<String>,
    pub store: Option<PathBuf>,
}

/// The effective configuration after merging all sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub tool: String,
    pub store: PathBuf,
    pub retry: RetryPolicy,
}

/// Loads and merges configuration files
pub struct ConfigResolver {
    /// Working directory; holds the repository config and anchors the
    /// default store
    cwd: PathBuf,

    /// Config file passed explicitly; replaces the repository config
    explicit: Option<PathBuf>,

    /// Override for the user config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    user_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            explicit: None,
            user_config_dir_override: None,
        }
    }

    /// Use `path` instead of the repository config file
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Use a custom user config directory
    pub fn with_user_config_dir(mut self, dir: PathBuf) -> Self {
        self.user_config_dir_override = Some(dir);
        self
    }

    fn user_config_path(&self) -> Option<PathBuf> {
        let dir = match &self.user_config_dir_override {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()?.join("prdesc"),
        };
        Some(dir.join("config.toml"))
    }

    /// Merge every layer and apply `overrides`
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if a present file cannot be read or parsed,
    /// or if an explicitly requested file does not exist, and
    /// `CliError::Patch` if the tool identity cannot be written as a header.
    pub fn resolve(&self, overrides: &Overrides) -> Result<ResolvedConfig> {
        let mut merged = ConfigFile::default();

        if let Some(path) = self.user_config_path().filter(|p| p.is_file()) {
            debug!(path = %path.display(), "Loading user config");
            merged = merged.merge(ConfigFile::load(&path)?);
        }

        match &self.explicit {
            Some(path) => {
                let path = self.cwd.join(path);
                debug!(path = %path.display(), "Loading explicit config");
                merged = merged.merge(ConfigFile::load(&path)?);
            }
            None => {
                let path = self.cwd.join(REPO_CONFIG_FILE);
                if path.is_file() {
                    debug!(path = %path.display(), "Loading repository config");
                    merged = merged.merge(ConfigFile::load(&path)?);
                }
            }
        }

        let tool = overrides
            .tool
            .clone()
            .or(merged.tool)
            .unwrap_or_else(|| DEFAULT_TOOL.to_string());
        validate_tool(&tool)?;

        let store = overrides
            .store
            .as_ref()
            .map(|p| self.cwd.join(p))
            .or(merged.store)
            .unwrap_or_else(|| self.cwd.join(DEFAULT_STORE_DIR));

        Ok(ResolvedConfig {
            tool,
            store,
            retry: merged.retry.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(dir: &TempDir) -> ConfigResolver {
        ConfigResolver::new(dir.path()).with_user_config_dir(dir.path().join("user"))
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = resolver(&dir).resolve(&Overrides::default()).unwrap();

        assert_eq!(config.tool, "prdesc");
        assert_eq!(config.store, dir.path().join(DEFAULT_STORE_DIR));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_repository_config_overrides_user_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("user")).unwrap();
        fs::write(
            dir.path().join("user/config.toml"),
            "tool = \"user-bot\"\nstore = \"/srv/descriptions\"\n",
        )
        .unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "tool = \"repo-bot\"\n").unwrap();

        let config = resolver(&dir).resolve(&Overrides::default()).unwrap();
        assert_eq!(config.tool, "repo-bot");
        assert_eq!(config.store, PathBuf::from("/srv/descriptions"));
    }

    #[test]
    fn test_flags_override_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "tool = \"repo-bot\"\n").unwrap();

        let overrides = Overrides {
            tool: Some("flag-bot".to_string()),
            store: Some(PathBuf::from("out")),
        };
        let config = resolver(&dir).resolve(&overrides).unwrap();
        assert_eq!(config.tool, "flag-bot");
        assert_eq!(config.store, dir.path().join("out"));
    }

    #[test]
    fn test_relative_store_resolved_against_config_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("conf/prdesc.toml"), "store = \"docs\"\n").unwrap();

        let config = resolver(&dir)
            .with_explicit(Some(PathBuf::from("conf/prdesc.toml")))
            .resolve(&Overrides::default())
            .unwrap();
        assert_eq!(config.store, dir.path().join("conf/docs"));
    }

    #[test]
    fn test_multiline_tool_from_config_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "tool = \"bot\\nv2\"\n").unwrap();

        let err = resolver(&dir).resolve(&Overrides::default()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Patch(prdesc_sections::Error::InvalidTool { .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_tool_flag_rejected() {
        let dir = TempDir::new().unwrap();
        let overrides = Overrides {
            tool: Some(String::new()),
            store: None,
        };
        assert!(resolver(&dir).resolve(&overrides).is_err());
    }

    #[test]
    fn test_retry_section() {
        let file = ConfigFile::parse("[retry]\nmax_elapsed_ms = 0\n").unwrap();
        assert_eq!(file.retry.unwrap().max_elapsed_ms, 0);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "colour = \"blue\"\n").unwrap();

        let err = resolver(&dir).resolve(&Overrides::default()).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = resolver(&dir)
            .with_explicit(Some(PathBuf::from("nope.toml")))
            .resolve(&Overrides::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
