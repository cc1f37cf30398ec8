//! Dual-write coordinator.
//!
//! Makes a single logical write appear atomic across the ledger and the
//! document store, which do not share a transaction manager:
//!
//! - **create/delete**: the ledger statements run first inside an open
//!   transaction, the document write happens next, and the transaction
//!   commits last. A document-side failure rolls the transaction back, so
//!   the operation is fully absent from both stores. A failure of the commit
//!   itself triggers a compensating document write before surfacing.
//! - **update**: the document (primary read path) is saved first; the ledger
//!   row is mirrored afterward best-effort, with failures logged and
//!   swallowed. This asymmetry is deliberate and must be preserved.

use std::future::Future;

use bson::oid::ObjectId;

use crate::error::DomainError;
use crate::ledger::LedgerTxn;

/// Runs the strict create protocol: document insert between the already-run
/// ledger statements and the commit.
///
/// `insert_document` persists the aggregate and yields its document id;
/// `remove_document` is the compensation invoked when the commit fails after
/// a successful document write.
///
/// # Errors
///
/// Returns `DomainError::DualWriteFailure` when either side fails; in every
/// failure case the operation is absent from both stores (compensation
/// failures are logged and leave an orphan document behind).
pub async fn create<I, R, Rf>(
    txn: Box<dyn LedgerTxn>,
    insert_document: I,
    remove_document: R,
) -> Result<ObjectId, DomainError>
where
    I: Future<Output = Result<ObjectId, DomainError>> + Send,
    R: FnOnce(ObjectId) -> Rf + Send,
    Rf: Future<Output = Result<(), DomainError>> + Send,
{
    let document_id = match insert_document.await {
        Ok(id) => id,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "ledger rollback failed after document write failure");
            }
            return Err(DomainError::DualWriteFailure(format!(
                "document write failed: {err}"
            )));
        }
    };

    commit(txn, || remove_document(document_id)).await?;
    Ok(document_id)
}

/// Commits an open ledger transaction, running `compensate` against the
/// document store if the commit fails.
///
/// # Errors
///
/// Returns `DomainError::DualWriteFailure` if the commit fails, after the
/// compensation has run (or its failure has been logged).
pub async fn commit<C, Cf>(txn: Box<dyn LedgerTxn>, compensate: C) -> Result<(), DomainError>
where
    C: FnOnce() -> Cf + Send,
    Cf: Future<Output = Result<(), DomainError>> + Send,
{
    if let Err(commit_err) = txn.commit().await {
        if let Err(comp_err) = compensate().await {
            tracing::error!(
                error = %comp_err,
                "document compensation failed after ledger commit failure; orphan document left behind"
            );
        }
        return Err(DomainError::DualWriteFailure(format!(
            "ledger commit failed: {commit_err}"
        )));
    }
    Ok(())
}

/// Awaits a best-effort ledger mirror, logging and swallowing any failure.
///
/// The document store remains authoritative; callers observe success for the
/// primary write despite a stale mirror.
pub async fn mirror<F>(operation: F, what: &str)
where
    F: Future<Output = Result<(), DomainError>> + Send,
{
    if let Err(err) = operation.await {
        tracing::warn!(error = %err, "{what} mirror failed; ledger copy is stale");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct ProbeTxn {
        fail_commit: bool,
        committed: Arc<AtomicBool>,
        rolled_back: Arc<AtomicBool>,
    }

    #[async_trait]
    impl LedgerTxn for ProbeTxn {
        async fn commit(self: Box<Self>) -> Result<(), DomainError> {
            if self.fail_commit {
                return Err(DomainError::StoreUnavailable("commit refused".into()));
            }
            self.committed.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
            self.rolled_back.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn probe(fail_commit: bool) -> (Box<ProbeTxn>, Arc<AtomicBool>, Arc<AtomicBool>) {
        let committed = Arc::new(AtomicBool::new(false));
        let rolled_back = Arc::new(AtomicBool::new(false));
        let txn = Box::new(ProbeTxn {
            fail_commit,
            committed: Arc::clone(&committed),
            rolled_back: Arc::clone(&rolled_back),
        });
        (txn, committed, rolled_back)
    }

    #[tokio::test]
    async fn test_create_commits_after_successful_document_write() {
        let (txn, committed, rolled_back) = probe(false);
        let expected = ObjectId::new();

        let result = create(txn, async { Ok(expected) }, |_| async { Ok(()) }).await;

        assert_eq!(result.unwrap(), expected);
        assert!(committed.load(Ordering::SeqCst));
        assert!(!rolled_back.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_document_write_fails() {
        let (txn, committed, rolled_back) = probe(false);
        let compensated = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&compensated);

        let result = create(
            txn,
            async { Err(DomainError::StoreUnavailable("mongo down".into())) },
            |_| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(DomainError::DualWriteFailure(_))));
        assert!(rolled_back.load(Ordering::SeqCst));
        assert!(!committed.load(Ordering::SeqCst));
        assert!(!compensated.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_create_compensates_document_when_commit_fails() {
        let (txn, _, rolled_back) = probe(true);
        let removed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&removed);
        let inserted = ObjectId::new();

        let result = create(txn, async { Ok(inserted) }, move |id| {
            let flag = Arc::clone(&flag);
            async move {
                assert_eq!(id, inserted);
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(DomainError::DualWriteFailure(_))));
        assert!(removed.load(Ordering::SeqCst));
        assert!(!rolled_back.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_mirror_swallows_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        mirror(
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::StoreUnavailable("ledger down".into()))
            },
            "event",
        )
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
