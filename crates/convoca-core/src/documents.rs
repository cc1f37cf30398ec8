//! Document-store abstraction.
//!
//! The document store holds the full aggregate — rich metadata, embedded
//! membership lists, image blobs, metrics and the state-history log — and is
//! the primary read path. The ledger keeps only a loosely-synchronized copy
//! for relational joins.

use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DomainError;

/// A document-store aggregate root.
pub trait Aggregate:
    Clone + Send + Sync + Serialize + DeserializeOwned + Unpin + 'static
{
    /// Collection name the aggregate lives in.
    const COLLECTION: &'static str;

    /// Document field holding the ledger id (uniquely indexed).
    const LEDGER_ID_FIELD: &'static str;

    /// Document id, absent until first persisted.
    fn document_id(&self) -> Option<ObjectId>;

    /// Records the id assigned at insert time.
    fn set_document_id(&mut self, id: ObjectId);

    /// The ledger row this aggregate mirrors (1:1, immutable after create).
    fn ledger_id(&self) -> i64;

    /// Records the ledger id assigned inside the create transaction.
    fn set_ledger_id(&mut self, id: i64);

    /// Whether the aggregate is live (soft-delete flag).
    fn is_active(&self) -> bool;

    /// Re-derives all computed metrics from the embedded collections.
    ///
    /// Metrics are never trusted as independently-stored truth; stores call
    /// this before every write as a guard against drift.
    fn recompute_metrics(&mut self);
}

/// Persistence seam for one aggregate type.
#[async_trait]
pub trait DocumentCollection<A: Aggregate>: Send + Sync {
    /// Inserts a new aggregate and returns its assigned document id.
    async fn insert(&self, aggregate: &A) -> Result<ObjectId, DomainError>;

    /// Loads an aggregate by document id.
    async fn find(&self, id: ObjectId) -> Result<Option<A>, DomainError>;

    /// Loads an aggregate by its ledger id.
    async fn find_by_ledger_id(&self, ledger_id: i64) -> Result<Option<A>, DomainError>;

    /// Saves a mutated aggregate, recomputing its metrics first.
    ///
    /// Last-writer-wins; callers serialize mutations per aggregate through
    /// [`crate::locks::AggregateLocks`].
    async fn save(&self, aggregate: &mut A) -> Result<(), DomainError>;

    /// Hard-removes a document. Only the dual-write coordinator's
    /// compensation path uses this; normal deletion is a soft-delete save.
    async fn remove(&self, id: ObjectId) -> Result<(), DomainError>;
}
