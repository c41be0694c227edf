//! Document identifiers

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Identifies one description in a store, e.g. a pull request number.
///
/// Restricted to `[A-Za-z0-9._-]`, not starting with `.`, so it is usable as
/// a file name on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidDocumentId {
                id,
                reason: "identifier is empty".to_string(),
            });
        }
        if id.starts_with('.') {
            return Err(Error::InvalidDocumentId {
                id,
                reason: "identifier starts with '.'".to_string(),
            });
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(Error::InvalidDocumentId {
                reason: format!("character {bad:?} is not allowed"),
                id,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for DocumentId {
    fn from(number: u64) -> Self {
        Self(number.to_string())
    }
}

impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
