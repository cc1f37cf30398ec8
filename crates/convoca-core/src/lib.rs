//! Convoca Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that both bounded
//! contexts (events and mega-events) depend on: the error taxonomy, the
//! clock and actor abstractions, the ledger and document-store seams, the
//! dual-write coordinator and the per-aggregate serialization locks. It
//! contains no infrastructure code.

pub mod actor;
pub mod category;
pub mod clock;
pub mod documents;
pub mod dual_write;
pub mod error;
pub mod history;
pub mod image;
pub mod ledger;
pub mod location;
pub mod locks;
pub mod membership;
