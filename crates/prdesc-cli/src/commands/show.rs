//! Show command implementation

use prdesc_store::TargetChain;

use super::Context;
use crate::cli::TargetArgs;
use crate::error::{CliError, Result};

/// Run the show command, printing the section content
pub fn run_show(ctx: &Context, section: &str, target: &TargetArgs, chain: &TargetChain) -> Result<()> {
    let updater = ctx.updater(target, None)?;
    let id = chain.resolve()?;

    match updater.section(&id, section)? {
        Some(found) => {
            println!("{}", found.content);
            Ok(())
        }
        None => Err(CliError::user(format!(
            "section '{section}' not found in description {id}"
        ))),
    }
}
