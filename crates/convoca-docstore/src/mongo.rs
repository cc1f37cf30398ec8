//! MongoDB implementation of the `DocumentCollection` trait.
//!
//! One generic wrapper serves both aggregate types; the collection name and
//! the uniquely-indexed ledger-id field come from the `Aggregate` trait.

use async_trait::async_trait;
use bson::oid::ObjectId;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use convoca_core::documents::{Aggregate, DocumentCollection};
use convoca_core::error::DomainError;

fn store_err(err: mongodb::error::Error) -> DomainError {
    DomainError::StoreUnavailable(err.to_string())
}

/// MongoDB-backed document collection for one aggregate type.
#[derive(Debug, Clone)]
pub struct MongoCollection<A: Send + Sync> {
    collection: Collection<A>,
}

impl<A: Aggregate> MongoCollection<A> {
    /// Creates a wrapper over the aggregate's collection in `database`.
    #[must_use]
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(A::COLLECTION),
        }
    }

    /// Ensures the unique index on the ledger-id field exists. Called once
    /// at startup.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoreUnavailable` if index creation fails.
    pub async fn ensure_indexes(&self) -> Result<(), DomainError> {
        let index = IndexModel::builder()
            .keys(doc! { A::LEDGER_ID_FIELD: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection
            .create_index(index)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl<A: Aggregate> DocumentCollection<A> for MongoCollection<A> {
    async fn insert(&self, aggregate: &A) -> Result<ObjectId, DomainError> {
        let result = self
            .collection
            .insert_one(aggregate)
            .await
            .map_err(store_err)?;
        result.inserted_id.as_object_id().ok_or_else(|| {
            DomainError::StoreUnavailable("document store returned a non-object id".into())
        })
    }

    async fn find(&self, id: ObjectId) -> Result<Option<A>, DomainError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(store_err)
    }

    async fn find_by_ledger_id(&self, ledger_id: i64) -> Result<Option<A>, DomainError> {
        self.collection
            .find_one(doc! { A::LEDGER_ID_FIELD: ledger_id })
            .await
            .map_err(store_err)
    }

    async fn save(&self, aggregate: &mut A) -> Result<(), DomainError> {
        aggregate.recompute_metrics();
        let id = aggregate
            .document_id()
            .ok_or_else(|| DomainError::NotFound("document".into()))?;
        let result = self
            .collection
            .replace_one(doc! { "_id": id }, &*aggregate)
            .await
            .map_err(store_err)?;
        if result.matched_count == 0 {
            return Err(DomainError::NotFound("document".into()));
        }
        Ok(())
    }

    async fn remove(&self, id: ObjectId) -> Result<(), DomainError> {
        self.collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
