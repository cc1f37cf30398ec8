//! Test document store — in-memory `DocumentCollection` with failure
//! injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;

use convoca_core::documents::{Aggregate, DocumentCollection};
use convoca_core::error::DomainError;

#[derive(Debug)]
struct Inner<A> {
    documents: Mutex<HashMap<ObjectId, A>>,
    removed: Mutex<Vec<ObjectId>>,
    fail_insert: AtomicBool,
    fail_save: AtomicBool,
}

/// An in-memory document collection keyed by object id, with switchable
/// failure modes for the insert and save paths.
#[derive(Debug, Clone)]
pub struct InMemoryDocuments<A> {
    inner: Arc<Inner<A>>,
}

impl<A: Aggregate> Default for InMemoryDocuments<A> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                documents: Mutex::new(HashMap::new()),
                removed: Mutex::new(Vec::new()),
                fail_insert: AtomicBool::new(false),
                fail_save: AtomicBool::new(false),
            }),
        }
    }
}

impl<A: Aggregate> InMemoryDocuments<A> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail.
    pub fn set_fail_insert(&self, fail: bool) {
        self.inner.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent save fail.
    pub fn set_fail_save(&self, fail: bool) {
        self.inner.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Returns a snapshot of the stored aggregate, if present.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<A> {
        self.inner.documents.lock().unwrap().get(&id).cloned()
    }

    /// Returns the number of stored documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.documents.lock().unwrap().len()
    }

    /// Returns whether the collection is empty.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the ids passed to `remove`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn removed(&self) -> Vec<ObjectId> {
        self.inner.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl<A: Aggregate> DocumentCollection<A> for InMemoryDocuments<A> {
    async fn insert(&self, aggregate: &A) -> Result<ObjectId, DomainError> {
        if self.inner.fail_insert.load(Ordering::SeqCst) {
            return Err(DomainError::StoreUnavailable("insert refused".into()));
        }
        let id = ObjectId::new();
        let mut stored = aggregate.clone();
        stored.set_document_id(id);
        self.inner.documents.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn find(&self, id: ObjectId) -> Result<Option<A>, DomainError> {
        Ok(self.inner.documents.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ledger_id(&self, ledger_id: i64) -> Result<Option<A>, DomainError> {
        Ok(self
            .inner
            .documents
            .lock()
            .unwrap()
            .values()
            .find(|aggregate| aggregate.ledger_id() == ledger_id)
            .cloned())
    }

    async fn save(&self, aggregate: &mut A) -> Result<(), DomainError> {
        if self.inner.fail_save.load(Ordering::SeqCst) {
            return Err(DomainError::StoreUnavailable("save refused".into()));
        }
        aggregate.recompute_metrics();
        let id = aggregate
            .document_id()
            .ok_or_else(|| DomainError::NotFound("document".into()))?;
        let mut documents = self.inner.documents.lock().unwrap();
        if !documents.contains_key(&id) {
            return Err(DomainError::NotFound("document".into()));
        }
        documents.insert(id, aggregate.clone());
        Ok(())
    }

    async fn remove(&self, id: ObjectId) -> Result<(), DomainError> {
        self.inner.documents.lock().unwrap().remove(&id);
        self.inner.removed.lock().unwrap().push(id);
        Ok(())
    }
}
