//! Patch command implementation

use colored::Colorize;
use std::path::PathBuf;

use prdesc_store::{ApplyReport, PatchRequest, TargetChain};

use super::Context;
use crate::cli::TargetArgs;
use crate::error::Result;
use crate::output;

/// Options of the patch command
#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub section: String,
    pub content: String,
    pub target: TargetArgs,
    pub tool: Option<String>,
    pub dry_run: bool,
    pub json: bool,
    pub output_file: Option<PathBuf>,
}

/// Run the patch command against the description named by `chain`
pub fn run_patch(ctx: &Context, options: &PatchOptions, chain: &TargetChain) -> Result<ApplyReport> {
    let updater = ctx.updater(&options.target, options.tool.as_deref())?;
    let request =
        PatchRequest::new(&options.section, &options.content).dry_run(options.dry_run);
    let report = updater.apply_to(chain, &request)?;

    if let Some(path) = &options.output_file {
        output::append_outputs(path, &output::report_outputs(&report))?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    if options.dry_run {
        if report.changed {
            print!(
                "{}",
                output::unified_diff(&format!("{}.md", report.document), &report.before, &report.after)
            );
        }
        println!("{} nothing written", "Dry run:".yellow().bold());
    }
    print_summary(&report);

    Ok(report)
}

fn print_summary(report: &ApplyReport) {
    let section = report.section.cyan();
    let document = report.document.to_string().cyan();
    if !report.changed {
        println!("{} Section {} in {} already up to date", "=".dimmed(), section, document);
    } else if report.was_update {
        println!("{} Updated section {} in {}", "~".yellow(), section, document);
    } else {
        println!("{} Added section {} to {}", "+".green(), section, document);
    }
    if report.duplicates > 0 {
        println!(
            "{} {} more section(s) named {} left untouched",
            "!".yellow().bold(),
            report.duplicates,
            section
        );
    }
}
