//! In-memory description store

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::document::DocumentId;
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// Keeps descriptions in a map. Useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<DocumentId, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a description.
    pub fn with_document(self, id: DocumentId, body: impl Into<String>) -> Self {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(id, body.into());
        }
        self
    }

    /// Current text of a description, if it was ever written or seeded.
    pub fn get(&self, id: &DocumentId) -> Option<String> {
        self.documents.lock().ok()?.get(id).cloned()
    }

    /// Number of successful `write` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, id: &DocumentId) -> Result<String> {
        let documents = self.documents.lock().map_err(|_| Error::LockPoisoned {
            id: id.to_string(),
        })?;
        Ok(documents.get(id).cloned().unwrap_or_default())
    }

    fn write(&self, id: &DocumentId, body: &str) -> Result<()> {
        let mut documents = self.documents.lock().map_err(|_| Error::LockPoisoned {
            id: id.to_string(),
        })?;
        documents.insert(id.clone(), body.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
