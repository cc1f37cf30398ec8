//! PostgreSQL implementation of the Convoca ledger.

pub mod pg_ledger;

pub use pg_ledger::PgLedger;
