//! Shared application state.

use std::sync::Arc;

use convoca_core::clock::Clock;
use convoca_core::documents::DocumentCollection;
use convoca_core::ledger::Ledger;
use convoca_core::locks::AggregateLocks;
use convoca_events::domain::aggregate::Event;
use convoca_mega_events::domain::aggregate::MegaEvent;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Relational ledger.
    pub ledger: Arc<dyn Ledger>,
    /// Event document collection.
    pub events: Arc<dyn DocumentCollection<Event>>,
    /// Mega-event document collection.
    pub mega_events: Arc<dyn DocumentCollection<MegaEvent>>,
    /// Per-aggregate serialization locks.
    pub locks: Arc<AggregateLocks>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn Ledger>,
        events: Arc<dyn DocumentCollection<Event>>,
        mega_events: Arc<dyn DocumentCollection<MegaEvent>>,
    ) -> Self {
        Self {
            clock,
            ledger,
            events,
            mega_events,
            locks: Arc::new(AggregateLocks::new()),
        }
    }
}
