//! Render command implementation

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use prdesc_sections::Patcher;

use super::Context;
use crate::config::Overrides;
use crate::error::{CliError, Result};

/// Patch a description from `input` (or stdin) and return the result
pub fn render(
    ctx: &Context,
    section: &str,
    content: &str,
    input: Option<&Path>,
    tool: Option<&str>,
) -> Result<String> {
    let config = ctx.resolve_config(&Overrides {
        tool: tool.map(str::to_string),
        store: None,
    })?;

    let document = match input {
        Some(path) => fs::read_to_string(ctx.cwd.join(path)).map_err(|e| {
            CliError::user(format!("cannot read description {}: {e}", path.display()))
        })?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let outcome = Patcher::new(config.tool).patch(&document, section, content)?;
    tracing::debug!(
        section,
        was_update = outcome.was_update,
        changed = outcome.changed,
        "Rendered description"
    );
    Ok(outcome.document)
}

/// Run the render command, printing the patched description to stdout
pub fn run_render(
    ctx: &Context,
    section: &str,
    content: &str,
    input: Option<&Path>,
    tool: Option<&str>,
) -> Result<()> {
    let document = render(ctx, section, content, input, tool)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(document.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
