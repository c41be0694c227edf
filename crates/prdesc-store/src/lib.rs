//! Description stores for prdesc.
//!
//! Wraps the pure patcher from `prdesc-sections` in a read-modify-write
//! cycle:
//!
//! 1. resolve which description to update ([`TargetChain`])
//! 2. lock it, read it, patch it, write it back if it changed
//!    ([`SectionUpdater`] over a [`DocumentStore`])
//! 3. report whether an existing section was replaced ([`ApplyReport`])
//!
//! Errors from the patcher are passed through as [`Error::Patch`] so callers
//! can tell bad input from a bad environment.

pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;
pub mod target;
pub mod updater;

pub use document::DocumentId;
pub use error::{Error, Result};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{DocumentStore, StoreLock};
pub use target::{TargetChain, TargetSource};
pub use updater::{ApplyReport, PatchRequest, RetryPolicy, SectionUpdater};
