//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// prdesc - Keep named sections of a pull request description up to date
#[derive(Parser, Debug)]
#[command(name = "prdesc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of .prdesc.toml
    #[arg(long, global = true, env = "PRDESC_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Where section content comes from
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ContentArgs {
    /// Section content
    #[arg(short, long, env = "PRDESC_CONTENT", conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read section content from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

/// Which stored description to operate on
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TargetArgs {
    /// Description to update (e.g. a pull request number).
    /// Falls back to GITHUB_EVENT_PATH, then GITHUB_REF.
    #[arg(long = "pr", env = "PRDESC_PR")]
    pub pr: Option<String>,

    /// Directory of the description store
    #[arg(long, env = "PRDESC_STORE")]
    pub store: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Insert or replace a section in a stored description
    ///
    /// Content is read from --content, --content-file, or stdin.
    ///
    /// Examples:
    ///   prdesc patch -s coverage -c "93%" --pr 12
    ///   cargo test 2>&1 | prdesc patch -s tests
    ///   prdesc patch -s lint -c clean --dry-run
    Patch {
        /// Section identifier
        #[arg(short, long, env = "PRDESC_SECTION")]
        section: String,

        #[command(flatten)]
        content: ContentArgs,

        #[command(flatten)]
        target: TargetArgs,

        /// Tool identity written into the header line
        #[arg(long, env = "PRDESC_TOOL")]
        tool: Option<String>,

        /// Show the change without writing it
        #[arg(long)]
        dry_run: bool,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,

        /// Append step outputs (was-update, changed, document) to this file
        #[arg(long, env = "GITHUB_OUTPUT")]
        output_file: Option<PathBuf>,
    },

    /// Patch a description read from a file or stdin and print the result
    ///
    /// Nothing is stored; useful in pipelines that manage the description
    /// themselves.
    Render {
        /// Section identifier
        #[arg(short, long, env = "PRDESC_SECTION")]
        section: String,

        #[command(flatten)]
        content: ContentArgs,

        /// Description file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Tool identity written into the header line
        #[arg(long, env = "PRDESC_TOOL")]
        tool: Option<String>,
    },

    /// Print the content of one section
    Show {
        /// Section identifier
        #[arg(short, long, env = "PRDESC_SECTION")]
        section: String,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the sections of a stored description
    List {
        #[command(flatten)]
        target: TargetArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_patch() {
        let cli = Cli::try_parse_from([
            "prdesc", "patch", "-s", "coverage", "-c", "93%", "--pr", "12", "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Patch {
                section,
                content,
                target,
                dry_run,
                ..
            } => {
                assert_eq!(section, "coverage");
                assert_eq!(content.content.as_deref(), Some("93%"));
                assert_eq!(target.pr.as_deref(), Some("12"));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_content_and_content_file_conflict() {
        let result = Cli::try_parse_from([
            "prdesc",
            "render",
            "-s",
            "a",
            "-c",
            "x",
            "--content-file",
            "f.txt",
        ]);
        assert!(result.is_err());
    }
}
