//! Section patching.
//!
//! Replaces the content of an existing section in place, or appends a new
//! section (adding the header line first if the description lacks it).
//! Text outside the targeted marker pair is never touched.

use tracing::{debug, warn};

use crate::error::{Error, MalformedKind, Result};
use crate::marker;
use crate::parser::{self, has_header};

/// Tool identity written into the header when none is configured.
pub const DEFAULT_TOOL: &str = "prdesc";

/// Result of a single patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The patched description.
    pub document: String,
    /// `true` if an existing section was replaced, `false` if one was appended.
    pub was_update: bool,
    /// Whether the header line was added by this patch.
    pub header_inserted: bool,
    /// Whether `document` differs from the input.
    pub changed: bool,
    /// Number of complete marker pairs for the identifier after the one that
    /// was updated.
    pub duplicates: usize,
}

impl PatchOutcome {
    /// Splits into the new description and the update flag.
    pub fn into_parts(self) -> (String, bool) {
        (self.document, self.was_update)
    }
}

/// Applies section patches on behalf of one tool identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patcher {
    tool: String,
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl Patcher {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// The header line this patcher inserts.
    pub fn header(&self) -> String {
        marker::header_marker(&self.tool)
    }

    /// Inserts or replaces section `id` in `document`.
    ///
    /// # Errors
    /// Returns `Error::InvalidTool` if the tool identity cannot be written as
    /// a header line, `Error::InvalidIdentifier` if `id` cannot be expressed
    /// as a marker, and `Error::MalformedSection` if the markers for `id` are
    /// not strictly paired or a line of `content` would read as a marker or
    /// header line. The input is never modified.
    ///
    /// # Example
    /// ```
    /// use prdesc_sections::Patcher;
    ///
    /// let patcher = Patcher::new("ci-bot");
    /// let first = patcher.patch("Fixes #12", "coverage", "93%").unwrap();
    /// assert!(!first.was_update);
    ///
    /// let second = patcher.patch(&first.document, "coverage", "95%").unwrap();
    /// assert!(second.was_update);
    /// assert!(second.document.starts_with("<!-- This is an auto-generated comment"));
    /// assert!(second.document.contains("Fixes #12"));
    /// assert!(second.document.contains("95%"));
    /// ```
    pub fn patch(&self, document: &str, id: &str, content: &str) -> Result<PatchOutcome> {
        marker::validate_tool(&self.tool)?;
        marker::validate_identifier(id)?;
        check_content(id, content)?;

        let scan = parser::scan(document, id)?;
        let body = section_body(content);

        if let Some(span) = scan.first {
            if scan.duplicates > 0 {
                warn!(
                    section = id,
                    duplicates = scan.duplicates,
                    "Description holds more than one section with this identifier; updating the first"
                );
            }
            debug!(
                section = id,
                start_line = span.start_line,
                end_line = span.end_line,
                "Replacing section content"
            );

            let mut patched =
                String::with_capacity(document.len() - span.content.len() + body.len());
            patched.push_str(&document[..span.content.start]);
            patched.push_str(&body);
            patched.push_str(&document[span.content.end..]);

            let changed = patched != document;
            return Ok(PatchOutcome {
                document: patched,
                was_update: true,
                header_inserted: false,
                changed,
                duplicates: scan.duplicates,
            });
        }

        let header_inserted = !has_header(document, &self.tool);
        let block = format_section(id, &body);
        let header = self.header();

        let mut patched = String::with_capacity(header.len() + document.len() + block.len() + 4);
        if header_inserted {
            debug!(tool = %self.tool, "Inserting header");
            patched.push_str(&header);
            if !document.is_empty() {
                patched.push_str("\n\n");
            }
        }
        patched.push_str(document);
        push_separator(&mut patched);
        patched.push_str(&block);

        debug!(section = id, "Appending new section");
        Ok(PatchOutcome {
            document: patched,
            was_update: false,
            header_inserted,
            changed: true,
            duplicates: 0,
        })
    }
}

/// Patches with the default tool identity.
///
/// See [`Patcher::patch`].
pub fn patch(document: &str, id: &str, content: &str) -> Result<PatchOutcome> {
    Patcher::default().patch(document, id, content)
}

/// Content as it sits between the marker lines: line-terminated, or empty.
fn section_body(content: &str) -> String {
    if content.is_empty() || content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{}\n", content)
    }
}

fn format_section(id: &str, body: &str) -> String {
    format!(
        "{}\n{}{}\n",
        marker::start_marker(id),
        body,
        marker::end_marker(id)
    )
}

/// Ensures one blank line between existing text and an appended block.
fn push_separator(text: &mut String) {
    if text.is_empty() || text.ends_with("\n\n") || text.ends_with("\n\r\n") {
        return;
    }
    if text.ends_with('\n') {
        text.push('\n');
    } else {
        text.push_str("\n\n");
    }
}

/// Rejects content holding any line the scanner would read as a marker.
///
/// Header lines have the start marker shape, so they are covered too.
fn check_content(id: &str, content: &str) -> Result<()> {
    match parser::lines(content).find(|line| marker::classify(line.text).is_some()) {
        Some(line) => Err(Error::malformed(id, MalformedKind::MarkerInContent, line.number)),
        None => Ok(()),
    }
}
