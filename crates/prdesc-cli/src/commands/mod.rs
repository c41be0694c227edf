//! Command implementations for prdesc-cli

pub mod list;
pub mod patch;
pub mod render;
pub mod show;

pub use list::run_list;
pub use patch::{PatchOptions, run_patch};
pub use render::run_render;
pub use show::run_show;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use prdesc_sections::Patcher;
use prdesc_store::{FileStore, SectionUpdater};

use crate::cli::{ContentArgs, TargetArgs};
use crate::config::{ConfigResolver, Overrides, ResolvedConfig};
use crate::error::{CliError, Result};

/// Where a command runs and which config files it reads
#[derive(Debug, Clone)]
pub struct Context {
    pub cwd: PathBuf,
    pub config_file: Option<PathBuf>,
    /// Replaces the platform user config directory (used for testing)
    pub user_config_dir: Option<PathBuf>,
}

impl Context {
    pub fn new(cwd: PathBuf, config_file: Option<PathBuf>) -> Self {
        Self {
            cwd,
            config_file,
            user_config_dir: None,
        }
    }

    pub fn resolve_config(&self, overrides: &Overrides) -> Result<ResolvedConfig> {
        let mut resolver =
            ConfigResolver::new(&self.cwd).with_explicit(self.config_file.clone());
        if let Some(dir) = &self.user_config_dir {
            resolver = resolver.with_user_config_dir(dir.clone());
        }
        resolver.resolve(overrides)
    }

    /// Build an updater over the configured file store
    pub fn updater(
        &self,
        target: &TargetArgs,
        tool: Option<&str>,
    ) -> Result<SectionUpdater<FileStore>> {
        let config = self.resolve_config(&Overrides {
            tool: tool.map(str::to_string),
            store: target.store.clone(),
        })?;
        tracing::debug!(store = %config.store.display(), tool = %config.tool, "Resolved configuration");
        Ok(
            SectionUpdater::new(FileStore::new(config.store), Patcher::new(config.tool))
                .with_retry(config.retry),
        )
    }
}

/// Read section content from the flag, a file, or stdin
pub fn read_content(args: &ContentArgs, stdin_allowed: bool) -> Result<String> {
    if let Some(content) = &args.content {
        return Ok(content.clone());
    }
    if let Some(path) = &args.content_file {
        return fs::read_to_string(path).map_err(|e| {
            CliError::user(format!("cannot read content file {}: {e}", path.display()))
        });
    }
    if !stdin_allowed {
        return Err(CliError::user(
            "no content given: use --content or --content-file",
        ));
    }
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_content_prefers_flag() {
        let args = ContentArgs {
            content: Some("inline".to_string()),
            content_file: None,
        };
        assert_eq!(read_content(&args, false).unwrap(), "inline");
    }

    #[test]
    fn test_read_content_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.md");
        fs::write(&path, "from file\n").unwrap();

        let args = ContentArgs {
            content: None,
            content_file: Some(path),
        };
        assert_eq!(read_content(&args, false).unwrap(), "from file\n");
    }

    #[test]
    fn test_read_content_requires_source_without_stdin() {
        let args = ContentArgs {
            content: None,
            content_file: None,
        };
        assert!(matches!(
            read_content(&args, false),
            Err(CliError::User { .. })
        ));
    }
}
