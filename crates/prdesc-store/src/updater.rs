//! The read-modify-write cycle
//!
//! `SectionUpdater` is the only place that combines a store with the
//! patcher. Per document it holds an in-process lock and, when the store
//! provides one, a cross-process lock for the whole cycle, so two writers
//! patching different sections of the same description never lose each
//! other's update.

use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use prdesc_sections::{Patcher, Section, parse_sections};

use crate::document::DocumentId;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::target::TargetChain;

/// How transient store failures are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub initial_interval_ms: u64,
    /// Upper bound on the delay between retries, in milliseconds.
    pub max_interval_ms: u64,
    /// Give up once this much time has passed, in milliseconds. Zero disables
    /// retrying.
    pub max_elapsed_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval_ms: 100,
            max_interval_ms: 2_000,
            max_elapsed_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs every operation exactly once.
    pub fn none() -> Self {
        Self {
            max_elapsed_ms: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_interval_ms))
            .with_max_interval(Duration::from_millis(self.max_interval_ms))
            .with_max_elapsed_time(Some(Duration::from_millis(self.max_elapsed_ms)))
            .build()
    }
}

/// A request to set the content of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub section: String,
    pub content: String,
    /// Compute the result without writing it back.
    pub dry_run: bool,
}

impl PatchRequest {
    pub fn new(section: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            content: content.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// What one read-modify-write cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub document: DocumentId,
    pub section: String,
    /// `true` if an existing section was replaced, `false` if one was appended.
    pub was_update: bool,
    pub header_inserted: bool,
    /// Whether the patched text differs from what was read.
    pub changed: bool,
    /// Whether the patched text was written back.
    pub written: bool,
    pub duplicates: usize,
    #[serde(skip)]
    pub before: String,
    #[serde(skip)]
    pub after: String,
}

/// Serialises the read-modify-write cycle per document and applies patches.
#[derive(Debug)]
pub struct SectionUpdater<S> {
    store: S,
    patcher: Patcher,
    retry: RetryPolicy,
    locks: Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

impl<S: DocumentStore> SectionUpdater<S> {
    pub fn new(store: S, patcher: Patcher) -> Self {
        Self {
            store,
            patcher,
            retry: RetryPolicy::default(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn patcher(&self) -> &Patcher {
        &self.patcher
    }

    /// Resolve the target through `chain`, then [`SectionUpdater::apply`].
    pub fn apply_to(&self, chain: &TargetChain, request: &PatchRequest) -> Result<ApplyReport> {
        let id = chain.resolve()?;
        self.apply(&id, request)
    }

    /// Read the description, patch one section, and write the result back
    /// if it changed.
    ///
    /// # Errors
    /// Patch errors are returned as `Error::Patch` without retrying and
    /// without writing. Transient store errors are retried according to the
    /// retry policy before being returned.
    pub fn apply(&self, id: &DocumentId, request: &PatchRequest) -> Result<ApplyReport> {
        let slot = self.slot(id)?;
        let result = self.apply_locked(&slot, id, request);
        drop(slot);
        self.release(id);
        result
    }

    fn apply_locked(
        &self,
        slot: &Mutex<()>,
        id: &DocumentId,
        request: &PatchRequest,
    ) -> Result<ApplyReport> {
        let _local = slot.lock().map_err(|_| Error::LockPoisoned { id: id.to_string() })?;
        let _shared = self.store.lock(id)?;

        let before = self.retrying("read", || self.store.read(id))?;
        let outcome = self
            .patcher
            .patch(&before, &request.section, &request.content)?;

        let written = outcome.changed && !request.dry_run;
        if written {
            self.retrying("write", || self.store.write(id, &outcome.document))?;
            info!(
                document = %id,
                section = %request.section,
                was_update = outcome.was_update,
                store = self.store.name(),
                "Updated description"
            );
        } else {
            debug!(
                document = %id,
                section = %request.section,
                changed = outcome.changed,
                dry_run = request.dry_run,
                "Description not written"
            );
        }

        Ok(ApplyReport {
            document: id.clone(),
            section: request.section.clone(),
            was_update: outcome.was_update,
            header_inserted: outcome.header_inserted,
            changed: outcome.changed,
            written,
            duplicates: outcome.duplicates,
            before,
            after: outcome.document,
        })
    }

    /// Current text of a description.
    pub fn read(&self, id: &DocumentId) -> Result<String> {
        self.retrying("read", || self.store.read(id))
    }

    /// All well-formed sections of a description.
    pub fn sections(&self, id: &DocumentId) -> Result<Vec<Section>> {
        Ok(parse_sections(&self.read(id)?))
    }

    /// One section of a description, if present.
    pub fn section(&self, id: &DocumentId, section: &str) -> Result<Option<Section>> {
        Ok(prdesc_sections::find_section(&self.read(id)?, section)?)
    }

    fn slot(&self, id: &DocumentId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| Error::LockPoisoned { id: id.to_string() })?;
        Ok(Arc::clone(locks.entry(id.clone()).or_default()))
    }

    /// Forget the slot of `id` once no writer holds it any more.
    fn release(&self, id: &DocumentId) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            locks.remove(id);
        }
    }

    fn retrying<T>(&self, operation: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        if self.retry.max_elapsed_ms == 0 {
            return op();
        }

        backoff::retry_notify(
            self.retry.backoff(),
            || {
                op().map_err(|e| {
                    if e.is_transient() {
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            },
            |err: Error, wait: Duration| {
                warn!(
                    operation,
                    store = self.store.name(),
                    error = %err,
                    retry_in = ?wait,
                    "Transient store failure, retrying"
                );
            },
        )
        .map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn updater() -> SectionUpdater<MemoryStore> {
        SectionUpdater::new(MemoryStore::new(), Patcher::default()).with_retry(RetryPolicy::none())
    }

    #[test]
    fn test_apply_appends_then_updates() {
        let updater = updater();
        let id = DocumentId::from(1);

        let first = updater.apply(&id, &PatchRequest::new("a", "X")).unwrap();
        assert!(!first.was_update);
        assert!(first.written);
        assert!(first.header_inserted);

        let second = updater.apply(&id, &PatchRequest::new("a", "Y")).unwrap();
        assert!(second.was_update);
        assert_eq!(second.before, first.after);
        assert_eq!(updater.store().write_count(), 2);
    }

    #[test]
    fn test_unchanged_document_is_not_written() {
        let updater = updater();
        let id = DocumentId::from(1);

        updater.apply(&id, &PatchRequest::new("a", "X")).unwrap();
        let again = updater.apply(&id, &PatchRequest::new("a", "X")).unwrap();

        assert!(again.was_update);
        assert!(!again.changed);
        assert!(!again.written);
        assert_eq!(updater.store().write_count(), 1);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let updater = updater();
        let id = DocumentId::from(1);

        let report = updater
            .apply(&id, &PatchRequest::new("a", "X").dry_run(true))
            .unwrap();

        assert!(report.changed);
        assert!(!report.written);
        assert_eq!(updater.store().write_count(), 0);
        assert!(report.after.contains("<!-- a -->"));
    }

    #[test]
    fn test_same_slot_for_same_document() {
        let updater = updater();
        let a = updater.slot(&DocumentId::from(1)).unwrap();
        let b = updater.slot(&DocumentId::from(1)).unwrap();
        let c = updater.slot(&DocumentId::from(2)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_slots_are_released_after_apply() {
        let updater = updater();
        for number in 0..50 {
            updater
                .apply(&DocumentId::from(number), &PatchRequest::new("a", "X"))
                .unwrap();
        }
        assert!(updater.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_slot_in_use_is_kept() {
        let updater = updater();
        let id = DocumentId::from(1);
        let held = updater.slot(&id).unwrap();

        updater.apply(&id, &PatchRequest::new("a", "X")).unwrap();
        assert!(updater.locks.lock().unwrap().contains_key(&id));

        drop(held);
        updater.release(&id);
        assert!(updater.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_slot_released_after_failed_apply() {
        let updater = updater();
        let id = DocumentId::from(1);
        assert!(updater.apply(&id, &PatchRequest::new("end: a", "X")).is_err());
        assert!(updater.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_retry_policy_deserializes_with_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_elapsed_ms": 50}"#).unwrap();
        assert_eq!(policy.max_elapsed_ms, 50);
        assert_eq!(policy.initial_interval_ms, 100);
    }
}
