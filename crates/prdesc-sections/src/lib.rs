//! Section-scoped patching of pull request descriptions.
//!
//! A description is free-form text shared with human editors. This crate
//! manages named sections inside it, each delimited by HTML comment marker
//! lines, and leaves every byte outside the targeted markers unchanged:
//!
//! ```text
//! <!-- This is an auto-generated comment: created by prdesc -->
//!
//! Text written by a human.
//!
//! <!-- coverage -->
//! Line coverage: 93%
//! <!-- end: coverage -->
//! ```
//!
//! Everything here is a pure function over text. Fetching and storing the
//! description, and serialising concurrent writers, belong to the caller
//! (see the `prdesc-store` crate).

pub mod error;
pub mod marker;
pub mod parser;
pub mod patcher;

pub use error::{Error, MalformedKind, Result};
pub use marker::{end_marker, header_marker, start_marker, validate_identifier, validate_tool};
pub use parser::{Section, find_section, has_header, parse_sections};
pub use patcher::{DEFAULT_TOOL, PatchOutcome, Patcher, patch};
