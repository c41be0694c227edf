//! The document store seam

use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::document::DocumentId;
use crate::error::Result;

/// Where descriptions are fetched from and written back to.
///
/// Implementations only move text; patching and the read-modify-write
/// ordering are handled by [`crate::SectionUpdater`].
pub trait DocumentStore {
    /// Fetch the current description. A description that does not exist yet
    /// reads as empty text.
    fn read(&self, id: &DocumentId) -> Result<String>;

    /// Replace the description with `body`.
    fn write(&self, id: &DocumentId, body: &str) -> Result<()>;

    /// Exclude other processes from the document until the returned lock is
    /// dropped. Stores owned by a single process return `None`.
    fn lock(&self, _id: &DocumentId) -> Result<Option<StoreLock>> {
        Ok(None)
    }

    /// Short name used in log output.
    fn name(&self) -> &'static str;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn read(&self, id: &DocumentId) -> Result<String> {
        (**self).read(id)
    }

    fn write(&self, id: &DocumentId, body: &str) -> Result<()> {
        (**self).write(id, body)
    }

    fn lock(&self, id: &DocumentId) -> Result<Option<StoreLock>> {
        (**self).lock(id)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// An advisory exclusive lock on a lock file, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    pub(crate) fn new(file: File, path: PathBuf) -> Self {
        Self { file, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well.
        let _ = FileExt::unlock(&self.file);
    }
}
