//! prdesc CLI
//!
//! Keeps tool-owned sections of a pull request description up to date
//! without touching the text around them.

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, TargetArgs};
use commands::{Context, PatchOptions};
use error::Result;
use prdesc_store::TargetChain;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }

    let ctx = Context::new(std::env::current_dir()?, cli.config);
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Patch {
            section,
            content,
            target,
            tool,
            dry_run,
            json,
            output_file,
        } => {
            let options = PatchOptions {
                section,
                content: commands::read_content(&content, true)?,
                target,
                tool,
                dry_run,
                json,
                output_file,
            };
            let chain = target_chain(&options.target);
            commands::run_patch(ctx, &options, &chain).map(|_| ())
        }
        Commands::Render {
            section,
            content,
            input,
            tool,
        } => {
            // stdin carries the description when no input file is given
            let content = commands::read_content(&content, input.is_some())?;
            commands::run_render(ctx, &section, &content, input.as_deref(), tool.as_deref())
        }
        Commands::Show { section, target } => {
            let chain = target_chain(&target);
            commands::run_show(ctx, &section, &target, &chain)
        }
        Commands::List { target, json } => {
            let chain = target_chain(&target);
            commands::run_list(ctx, &target, &chain, json)
        }
    }
}

fn target_chain(target: &TargetArgs) -> TargetChain {
    TargetChain::from_env(target.pr.clone())
}
