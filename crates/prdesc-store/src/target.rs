//! Target resolution
//!
//! Decides which description to update from an ordered chain of sources:
//! an explicit override first, then whatever the surrounding CI run tells
//! us. The first source that yields an identifier wins.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::document::DocumentId;
use crate::error::{Error, Result};

/// Environment variable naming the webhook event payload file.
pub const EVENT_PATH_VAR: &str = "GITHUB_EVENT_PATH";
/// Environment variable holding the ref that triggered the run.
pub const REF_VAR: &str = "GITHUB_REF";

/// Matches `refs/pull/<number>/merge` and `refs/pull/<number>/head`.
static PULL_REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^refs/pull/([0-9]+)/(?:merge|head)$").expect("Invalid pull ref regex")
});

/// One place a document identifier may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// Identifier supplied by the caller. An invalid value is an error, not
    /// a reason to fall through.
    Explicit(String),
    /// A JSON webhook event payload file.
    EventPayload(PathBuf),
    /// A git ref such as `refs/pull/12/merge`.
    GitRef(String),
}

impl TargetSource {
    fn describe(&self) -> String {
        match self {
            TargetSource::Explicit(_) => "explicit override".to_string(),
            TargetSource::EventPayload(path) => format!("event payload {}", path.display()),
            TargetSource::GitRef(git_ref) => format!("git ref {git_ref}"),
        }
    }

    /// Returns `Ok(None)` when this source has nothing to say.
    fn resolve(&self) -> Result<Option<DocumentId>> {
        match self {
            TargetSource::Explicit(id) => DocumentId::new(id.trim()).map(Some),
            TargetSource::EventPayload(path) => read_event_payload(path),
            TargetSource::GitRef(git_ref) => Ok(PULL_REF_PATTERN
                .captures(git_ref)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .map(DocumentId::from)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NumberRef {
    number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    number: Option<u64>,
    /// Present only when the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

/// The parts of a webhook event that can name a pull request.
#[derive(Debug, Deserialize)]
struct EventPayload {
    number: Option<u64>,
    pull_request: Option<NumberRef>,
    issue: Option<IssueRef>,
}

impl EventPayload {
    fn pull_request_number(&self) -> Option<u64> {
        if let Some(number) = self.pull_request.as_ref().and_then(|pr| pr.number) {
            return Some(number);
        }
        if let Some(issue) = &self.issue {
            if issue.pull_request.is_some() {
                return issue.number;
            }
            return None;
        }
        self.number
    }
}

fn read_event_payload(path: &Path) -> Result<Option<DocumentId>> {
    let text = fs::read_to_string(path).map_err(|e| Error::EventPayload {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let payload: EventPayload = serde_json::from_str(&text).map_err(|e| Error::EventPayload {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(payload.pull_request_number().map(DocumentId::from))
}

/// An ordered fallback chain of [`TargetSource`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetChain {
    sources: Vec<TargetSource>,
}

impl TargetChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; sources are tried in insertion order.
    pub fn with(mut self, source: TargetSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Append a source only when a value is present.
    pub fn with_optional(self, source: Option<TargetSource>) -> Self {
        match source {
            Some(source) => self.with(source),
            None => self,
        }
    }

    /// Build the usual chain: explicit override, then the event payload and
    /// ref from the CI environment, using `lookup` to read variables.
    pub fn from_lookup(explicit: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self::new()
            .with_optional(non_empty(explicit).map(TargetSource::Explicit))
            .with_optional(
                non_empty(lookup(EVENT_PATH_VAR)).map(|p| TargetSource::EventPayload(p.into())),
            )
            .with_optional(non_empty(lookup(REF_VAR)).map(TargetSource::GitRef))
    }

    /// [`TargetChain::from_lookup`] over the process environment.
    pub fn from_env(explicit: Option<String>) -> Self {
        Self::from_lookup(explicit, |name| std::env::var(name).ok())
    }

    pub fn sources(&self) -> &[TargetSource] {
        &self.sources
    }

    /// Resolve to the first identifier any source yields.
    ///
    /// # Errors
    /// Returns `Error::TargetUnresolved` when every source is exhausted, and
    /// propagates unreadable payloads or an invalid explicit identifier.
    pub fn resolve(&self) -> Result<DocumentId> {
        for source in &self.sources {
            if let Some(id) = source.resolve()? {
                debug!(source = %source.describe(), document = %id, "Resolved target document");
                return Ok(id);
            }
            debug!(source = %source.describe(), "Source did not name a document");
        }

        let tried = if self.sources.is_empty() {
            "no sources configured".to_string()
        } else {
            self.sources
                .iter()
                .map(TargetSource::describe)
                .collect::<Vec<_>>()
                .join(", ")
        };
        Err(Error::TargetUnresolved { tried })
    }
}
