//! Step outputs for CI runners
//!
//! Results are appended to the file named by `GITHUB_OUTPUT` (or
//! `--output-file`) as `key=value` lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use prdesc_store::ApplyReport;
use similar::TextDiff;

use crate::error::Result;

/// Key/value pairs describing an applied patch.
pub fn report_outputs(report: &ApplyReport) -> Vec<(&'static str, String)> {
    vec![
        ("was-update", report.was_update.to_string()),
        ("changed", report.changed.to_string()),
        ("document", report.document.to_string()),
    ]
}

/// Append `key=value` lines to an output file, creating it if needed.
pub fn append_outputs(path: &Path, outputs: &[(&str, String)]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (key, value) in outputs {
        writeln!(file, "{key}={value}")?;
    }
    Ok(())
}

/// Unified diff of a description before and after a patch.
pub fn unified_diff(name: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}
