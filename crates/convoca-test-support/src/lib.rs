//! Shared test fakes and utilities for the Convoca backend.

mod clock;
mod documents;
mod ledger;

pub use clock::FixedClock;
pub use documents::InMemoryDocuments;
pub use ledger::{InMemoryLedger, LedgerWrite};
