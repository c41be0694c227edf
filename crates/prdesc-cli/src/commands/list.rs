//! List command implementation

use colored::Colorize;

use prdesc_store::TargetChain;

use super::Context;
use crate::cli::TargetArgs;
use crate::error::Result;

/// Run the list command
pub fn run_list(ctx: &Context, target: &TargetArgs, chain: &TargetChain, json: bool) -> Result<()> {
    let updater = ctx.updater(target, None)?;
    let id = chain.resolve()?;
    let sections = updater.sections(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    if sections.is_empty() {
        println!("{} (use {} to add one)", "No sections".dimmed(), "prdesc patch".cyan());
        return Ok(());
    }

    println!("{} {}", "Sections of".bold(), id.to_string().cyan());
    for section in &sections {
        let lines = section.content.lines().count();
        println!(
            "  {} {} {}",
            "+".green(),
            section.id.cyan(),
            format!("(lines {}-{}, {} content line(s))", section.start_line, section.end_line, lines)
                .dimmed()
        );
    }
    Ok(())
}
