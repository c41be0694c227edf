//! Filesystem-backed description store
//!
//! Layout under the root directory:
//! ```text
//! <root>/<id>.md      description text
//! <root>/.<id>.lock   advisory lock serialising writers across processes
//! ```

use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::document::DocumentId;
use crate::error::{Error, Result};
use crate::store::{DocumentStore, StoreLock};

/// Stores each description as a markdown file in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the description.
    pub fn document_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(format!("{id}.md"))
    }

    fn lock_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join(format!(".{id}.lock"))
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io(&self.root, e))
    }
}

impl DocumentStore for FileStore {
    fn read(&self, id: &DocumentId) -> Result<String> {
        let path = self.document_path(id);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No description yet, starting empty");
                Ok(String::new())
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Writes to a temp file in the same directory, then renames it over the
    /// description so readers never see a partial write.
    fn write(&self, id: &DocumentId, body: &str) -> Result<()> {
        self.ensure_root()?;
        let path = self.document_path(id);
        let temp_path = self
            .root
            .join(format!(".{id}.md.{}.tmp", std::process::id()));

        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(body.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        drop(temp_file);

        fs::rename(&temp_path, &path).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), bytes = body.len(), "Wrote description");
        Ok(())
    }

    fn lock(&self, id: &DocumentId) -> Result<Option<StoreLock>> {
        self.ensure_root()?;
        let path = self.lock_path(id);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        // Blocks while another process holds the lock.
        file.lock_exclusive()
            .map_err(|source| Error::LockFailed {
                path: path.clone(),
                source,
            })?;
        Ok(Some(StoreLock::new(file, path)))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_document_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.read(&DocumentId::from(1)).unwrap(), "");
    }

    #[test]
    fn test_write_creates_root_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/docs"));
        let id = DocumentId::from(7);

        store.write(&id, "body\n").unwrap();

        assert_eq!(store.read(&id).unwrap(), "body\n");
        let names: Vec<_> = fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["7.md".to_string()]);
    }

    #[test]
    fn test_lock_creates_hidden_lock_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = DocumentId::from(3);

        let lock = store.lock(&id).unwrap().unwrap();
        assert!(lock.path().ends_with(".3.lock"));
        assert!(lock.path().exists());
    }
}
