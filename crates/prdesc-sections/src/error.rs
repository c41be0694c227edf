//! Error types for prdesc-sections

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// How the marker pairing of a section is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// A start marker with no end marker after it.
    MissingEnd,
    /// An end marker with no start marker before it.
    UnmatchedEnd,
    /// A second start marker before the first one was closed.
    NestedStart,
    /// The new content contains a line that reads as a marker or header.
    MarkerInContent,
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MalformedKind::MissingEnd => "start marker has no matching end marker",
            MalformedKind::UnmatchedEnd => "end marker has no matching start marker",
            MalformedKind::NestedStart => "start marker repeated before the section was closed",
            MalformedKind::MarkerInContent => "content contains a marker or header line",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Malformed section '{id}' at line {line}: {kind}")]
    MalformedSection {
        id: String,
        kind: MalformedKind,
        /// 1-based line of the offending marker (line within the content for
        /// `MarkerInContent`).
        line: usize,
    },

    #[error("Invalid section identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: String },

    #[error("Invalid tool identity {tool:?}: {reason}")]
    InvalidTool { tool: String, reason: String },
}

impl Error {
    pub(crate) fn malformed(id: &str, kind: MalformedKind, line: usize) -> Self {
        Self::MalformedSection {
            id: id.to_string(),
            kind,
            line,
        }
    }

    pub(crate) fn invalid_tool(tool: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTool {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_identifier(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
