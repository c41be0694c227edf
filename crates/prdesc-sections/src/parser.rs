//! Section parsing.
//!
//! Recognises sections by scanning a description line by line for marker
//! lines:
//! ```text
//! <!-- coverage -->
//! content here
//! <!-- end: coverage -->
//! ```

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::error::{Error, MalformedKind, Result};
use crate::marker::{self, MarkerLine};

/// A parsed section with its identifier, content, and position information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// The identifier carried by the marker lines.
    pub id: String,
    /// The content between the marker lines, without its final line break.
    pub content: String,
    /// The 1-based line number of the start marker.
    pub start_line: usize,
    /// The 1-based line number of the end marker.
    pub end_line: usize,
}

/// One line of a document, located by byte offsets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Text without the `\n` terminator (a `\r` may remain).
    pub text: &'a str,
    /// Offset of the first byte of the line.
    pub start: usize,
    /// Offset just past the line terminator.
    pub next: usize,
}

pub(crate) fn lines(document: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    document
        .split_inclusive('\n')
        .enumerate()
        .map(move |(idx, raw)| {
            let start = offset;
            offset += raw.len();
            Line {
                number: idx + 1,
                text: raw.strip_suffix('\n').unwrap_or(raw),
                start,
                next: offset,
            }
        })
}

/// Byte layout of one marker pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SectionSpan {
    pub start_line: usize,
    pub end_line: usize,
    /// Everything strictly between the two marker lines.
    pub content: Range<usize>,
}

/// Result of scanning a document for one identifier.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub first: Option<SectionSpan>,
    /// Complete pairs after the first one.
    pub duplicates: usize,
}

/// Walks every marker line of `id`, requiring strict start/end alternation.
pub(crate) fn scan(document: &str, id: &str) -> Result<Scan> {
    let mut result = Scan::default();
    let mut open: Option<Line<'_>> = None;

    for line in lines(document) {
        match marker::classify(line.text) {
            Some(MarkerLine::Start(found)) if found == id => {
                if open.is_some() {
                    return Err(Error::malformed(id, MalformedKind::NestedStart, line.number));
                }
                open = Some(line);
            }
            Some(MarkerLine::End(found)) if found == id => {
                let Some(start) = open.take() else {
                    return Err(Error::malformed(id, MalformedKind::UnmatchedEnd, line.number));
                };
                if result.first.is_none() {
                    result.first = Some(SectionSpan {
                        start_line: start.number,
                        end_line: line.number,
                        content: start.next..line.start,
                    });
                } else {
                    result.duplicates += 1;
                }
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        return Err(Error::malformed(id, MalformedKind::MissingEnd, start.number));
    }

    Ok(result)
}

fn section_content(raw: &str) -> String {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    raw.strip_suffix('\r').unwrap_or(raw).to_string()
}

/// Parses all well-formed sections from the given document.
///
/// Identifiers whose markers are not strictly paired are skipped; use
/// [`find_section`] to get the pairing error for a specific identifier.
///
/// # Returns
/// A vector of all parsed sections, in order of appearance.
///
/// # Example
/// ```
/// use prdesc_sections::parser::parse_sections;
///
/// let document = "intro\n<!-- coverage -->\n93%\n<!-- end: coverage -->\n";
///
/// let sections = parse_sections(document);
/// assert_eq!(sections.len(), 1);
/// assert_eq!(sections[0].id, "coverage");
/// assert_eq!(sections[0].content, "93%");
/// ```
pub fn parse_sections(document: &str) -> Vec<Section> {
    let mut open: HashMap<&str, Line<'_>> = HashMap::new();
    let mut broken: HashSet<&str> = HashSet::new();
    let mut sections = Vec::new();

    for line in lines(document) {
        match marker::classify(line.text) {
            Some(MarkerLine::Start(id)) => {
                if open.insert(id, line).is_some() {
                    broken.insert(id);
                }
            }
            Some(MarkerLine::End(id)) => {
                let Some(start) = open.remove(id) else {
                    broken.insert(id);
                    continue;
                };
                if broken.contains(id) {
                    continue;
                }
                sections.push(Section {
                    id: id.to_string(),
                    content: section_content(&document[start.next..line.start]),
                    start_line: start.number,
                    end_line: line.number,
                });
            }
            None => {}
        }
    }

    sections.sort_by_key(|s| s.start_line);
    sections
}

/// Finds the first section with the given identifier.
///
/// # Returns
/// The section if found, or `None` if no marker pair with that identifier
/// exists.
///
/// # Errors
/// Returns `Error::InvalidIdentifier` for an unusable identifier and
/// `Error::MalformedSection` if the identifier's markers are not paired.
///
/// # Example
/// ```
/// use prdesc_sections::parser::find_section;
///
/// let document = "<!-- coverage -->\n93%\n<!-- end: coverage -->";
///
/// let section = find_section(document, "coverage").unwrap();
/// assert_eq!(section.unwrap().content, "93%");
/// ```
pub fn find_section(document: &str, id: &str) -> Result<Option<Section>> {
    marker::validate_identifier(id)?;
    let found = scan(document, id)?.first.map(|span| Section {
        id: id.to_string(),
        content: section_content(&document[span.content.clone()]),
        start_line: span.start_line,
        end_line: span.end_line,
    });
    Ok(found)
}

/// Checks whether the header line of `tool` is present.
pub fn has_header(document: &str, tool: &str) -> bool {
    let header = marker::header_marker(tool);
    lines(document).any(|line| marker::line_is(line.text, &header))
}
