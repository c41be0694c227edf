//! Marker line formats.
//!
//! A managed description looks like:
//! ```text
//! <!-- This is an auto-generated comment: created by prdesc -->
//!
//! <!-- coverage -->
//! content here
//! <!-- end: coverage -->
//! ```
//! The formats are matched byte-for-byte, so changing them breaks every
//! description written by earlier versions.

use crate::error::{Error, Result};

/// Prefix carried by the end marker of every section.
pub const END_TAG: &str = "end:";

const HEADER_TEXT: &str = "This is an auto-generated comment: created by";
const OPEN: &str = "<!--";
const CLOSE: &str = "-->";

/// Creates the header line identifying a description managed by `tool`.
pub fn header_marker(tool: &str) -> String {
    format!("<!-- {} {} -->", HEADER_TEXT, tool)
}

/// Creates the opening marker for a section.
pub fn start_marker(id: &str) -> String {
    format!("<!-- {} -->", id)
}

/// Creates the closing marker for a section.
pub fn end_marker(id: &str) -> String {
    format!("<!-- {} {} -->", END_TAG, id)
}

/// Checks that `id` round-trips through the marker syntax unambiguously.
///
/// # Errors
/// Returns `Error::InvalidIdentifier` if the identifier is empty, has
/// surrounding whitespace, spans lines, contains a comment delimiter, or
/// starts with the end tag or the header text (its start marker would read
/// as an end marker or a header).
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_identifier(id, "identifier is empty"));
    }
    if id.trim() != id {
        return Err(Error::invalid_identifier(
            id,
            "identifier has leading or trailing whitespace",
        ));
    }
    if id.contains(['\n', '\r']) {
        return Err(Error::invalid_identifier(id, "identifier contains a line break"));
    }
    if id.contains(OPEN) || id.contains(CLOSE) {
        return Err(Error::invalid_identifier(
            id,
            "identifier contains an HTML comment delimiter",
        ));
    }
    if id.starts_with(END_TAG) {
        return Err(Error::invalid_identifier(
            id,
            format!("identifier starts with the reserved '{}' tag", END_TAG),
        ));
    }
    if id.starts_with(HEADER_TEXT) {
        return Err(Error::invalid_identifier(
            id,
            "identifier would be read as the header line",
        ));
    }
    Ok(())
}

/// Checks that `tool` yields a single-line header that reads back as one.
///
/// # Errors
/// Returns `Error::InvalidTool` if the tool identity is empty, has
/// surrounding whitespace, spans lines, or contains a comment delimiter.
pub fn validate_tool(tool: &str) -> Result<()> {
    if tool.is_empty() {
        return Err(Error::invalid_tool(tool, "tool identity is empty"));
    }
    if tool.trim() != tool {
        return Err(Error::invalid_tool(
            tool,
            "tool identity has leading or trailing whitespace",
        ));
    }
    if tool.contains(['\n', '\r']) {
        return Err(Error::invalid_tool(tool, "tool identity contains a line break"));
    }
    if tool.contains(OPEN) || tool.contains(CLOSE) {
        return Err(Error::invalid_tool(
            tool,
            "tool identity contains an HTML comment delimiter",
        ));
    }
    Ok(())
}

/// What a single line of a document means to the patcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerLine<'a> {
    Start(&'a str),
    End(&'a str),
}

/// Classifies a line (without its terminator) as a section marker.
///
/// Any `<!-- x -->` line is a potential start marker; whether it is one is
/// decided by the caller comparing identifiers. A trailing `\r` is ignored.
pub(crate) fn classify(line: &str) -> Option<MarkerLine<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let inner = line.strip_prefix("<!-- ")?.strip_suffix(" -->")?;
    if inner.is_empty() || inner.contains(CLOSE) {
        return None;
    }
    match inner.strip_prefix(END_TAG) {
        Some(rest) => rest.strip_prefix(' ').map(MarkerLine::End),
        None => Some(MarkerLine::Start(inner)),
    }
}

/// Checks whether `line` is exactly `marker`, tolerating a trailing `\r`.
pub(crate) fn line_is(line: &str, marker: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == marker
}
