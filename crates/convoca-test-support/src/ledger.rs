//! Test ledger — in-memory `Ledger` implementation with failure injection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use convoca_core::error::DomainError;
use convoca_core::ledger::{
    EventMirror, Ledger, LedgerTxn, MegaEventMirror, NewEventRow, NewMegaEventRow, OrganizerRow,
    ParticipantRow, SponsorRow,
};

/// One recorded ledger write, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerWrite {
    /// An event core row was inserted.
    EventInserted {
        /// Assigned event id.
        event_id: i64,
        /// Owning NGO.
        ngo_id: i64,
    },
    /// An event sponsor join row was inserted.
    EventSponsorInserted {
        /// Event id.
        event_id: i64,
        /// Sponsoring company.
        company_id: i64,
    },
    /// An event promoter join row was inserted.
    EventPromoterInserted {
        /// Event id.
        event_id: i64,
        /// Promoting company.
        company_id: i64,
    },
    /// An event's rows were deleted.
    EventDeleted {
        /// Event id.
        event_id: i64,
    },
    /// The mutable event columns were mirrored.
    EventMirrored {
        /// Event id.
        event_id: i64,
    },
    /// The event status column was mirrored.
    EventStatusMirrored {
        /// Event id.
        event_id: i64,
        /// Mirrored status tag.
        status: String,
    },
    /// An event participant join row was inserted.
    EventParticipantInserted {
        /// Event id.
        event_id: i64,
        /// Registered member.
        member_id: i64,
    },
    /// An event participant's attendance flag was set.
    EventAttendanceSet {
        /// Event id.
        event_id: i64,
        /// Member.
        member_id: i64,
        /// Attendance flag.
        attended: bool,
    },
    /// A mega-event core row was inserted.
    MegaEventInserted {
        /// Assigned mega-event id.
        mega_event_id: i64,
        /// Principal organizing NGO.
        principal_ngo_id: i64,
    },
    /// A mega-event organizer row was inserted.
    MegaEventOrganizerInserted {
        /// Mega-event id.
        mega_event_id: i64,
        /// Organizing NGO.
        ngo_id: i64,
        /// Role tag.
        role: String,
    },
    /// A mega-event sponsor pledge row was inserted.
    MegaEventSponsorInserted {
        /// Mega-event id.
        mega_event_id: i64,
        /// Sponsoring company.
        company_id: i64,
    },
    /// A mega-event's rows were deleted.
    MegaEventDeleted {
        /// Mega-event id.
        mega_event_id: i64,
    },
    /// The mutable mega-event columns were mirrored.
    MegaEventMirrored {
        /// Mega-event id.
        mega_event_id: i64,
    },
    /// The mega-event status column was mirrored.
    MegaEventStatusMirrored {
        /// Mega-event id.
        mega_event_id: i64,
        /// Mirrored status tag.
        status: String,
    },
    /// A mega-event participant join row was inserted.
    MegaEventParticipantInserted {
        /// Mega-event id.
        mega_event_id: i64,
        /// Registered member.
        member_id: i64,
    },
    /// A mega-event participant's attendance flag was set.
    MegaEventAttendanceSet {
        /// Mega-event id.
        mega_event_id: i64,
        /// Member.
        member_id: i64,
        /// Attendance flag.
        attended: bool,
    },
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicI64,
    ngos: Mutex<HashSet<i64>>,
    companies: Mutex<HashSet<i64>>,
    members: Mutex<HashSet<i64>>,
    committed: Mutex<Vec<LedgerWrite>>,
    mirrored: Mutex<Vec<LedgerWrite>>,
    fail_commit: AtomicBool,
    fail_mirrors: AtomicBool,
}

/// An in-memory ledger that records committed transactional writes and
/// best-effort mirror writes separately, with switchable failure modes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<Inner>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active NGO account.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_ngo(&self, user_id: i64) {
        self.inner.ngos.lock().unwrap().insert(user_id);
    }

    /// Registers a company account.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_company(&self, company_id: i64) {
        self.inner.companies.lock().unwrap().insert(company_id);
    }

    /// Registers an external member.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_member(&self, member_id: i64) {
        self.inner.members.lock().unwrap().insert(member_id);
    }

    /// Makes every subsequent transaction commit fail.
    pub fn set_fail_commit(&self, fail: bool) {
        self.inner.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent best-effort mirror write fail.
    pub fn set_fail_mirrors(&self, fail: bool) {
        self.inner.fail_mirrors.store(fail, Ordering::SeqCst);
    }

    /// Returns a snapshot of all committed transactional writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn committed(&self) -> Vec<LedgerWrite> {
        self.inner.committed.lock().unwrap().clone()
    }

    /// Returns a snapshot of all best-effort mirror writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn mirrored(&self) -> Vec<LedgerWrite> {
        self.inner.mirrored.lock().unwrap().clone()
    }

    fn next_id(&self) -> i64 {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn mirror(&self, write: LedgerWrite) -> Result<(), DomainError> {
        if self.inner.fail_mirrors.load(Ordering::SeqCst) {
            return Err(DomainError::StoreUnavailable("mirror refused".into()));
        }
        self.inner.mirrored.lock().unwrap().push(write);
        Ok(())
    }
}

/// A staged in-memory transaction; rows land in the ledger on commit.
#[derive(Debug)]
struct InMemoryTxn {
    inner: Arc<Inner>,
    staged: Vec<LedgerWrite>,
}

#[async_trait]
impl LedgerTxn for InMemoryTxn {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        if self.inner.fail_commit.load(Ordering::SeqCst) {
            return Err(DomainError::StoreUnavailable("commit refused".into()));
        }
        self.inner.committed.lock().unwrap().extend(self.staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn is_active_ngo(&self, user_id: i64) -> Result<bool, DomainError> {
        Ok(self.inner.ngos.lock().unwrap().contains(&user_id))
    }

    async fn company_exists(&self, company_id: i64) -> Result<bool, DomainError> {
        Ok(self.inner.companies.lock().unwrap().contains(&company_id))
    }

    async fn member_exists(&self, member_id: i64) -> Result<bool, DomainError> {
        Ok(self.inner.members.lock().unwrap().contains(&member_id))
    }

    async fn insert_event(
        &self,
        row: &NewEventRow,
    ) -> Result<(i64, Box<dyn LedgerTxn>), DomainError> {
        let event_id = self.next_id();
        let mut staged = vec![LedgerWrite::EventInserted {
            event_id,
            ngo_id: row.ngo_id,
        }];
        staged.extend(row.sponsor_company_ids.iter().map(|&company_id| {
            LedgerWrite::EventSponsorInserted {
                event_id,
                company_id,
            }
        }));
        staged.extend(row.promoter_company_ids.iter().map(|&company_id| {
            LedgerWrite::EventPromoterInserted {
                event_id,
                company_id,
            }
        }));
        Ok((
            event_id,
            Box::new(InMemoryTxn {
                inner: Arc::clone(&self.inner),
                staged,
            }),
        ))
    }

    async fn insert_mega_event(
        &self,
        row: &NewMegaEventRow,
    ) -> Result<(i64, Box<dyn LedgerTxn>), DomainError> {
        let mega_event_id = self.next_id();
        let mut staged = vec![
            LedgerWrite::MegaEventInserted {
                mega_event_id,
                principal_ngo_id: row.principal_ngo_id,
            },
            LedgerWrite::MegaEventOrganizerInserted {
                mega_event_id,
                ngo_id: row.principal_ngo_id,
                role: "principal_coordinator".to_owned(),
            },
        ];
        staged.extend(
            row.sponsors
                .iter()
                .map(|sponsor| LedgerWrite::MegaEventSponsorInserted {
                    mega_event_id,
                    company_id: sponsor.company_id,
                }),
        );
        Ok((
            mega_event_id,
            Box::new(InMemoryTxn {
                inner: Arc::clone(&self.inner),
                staged,
            }),
        ))
    }

    async fn delete_event(&self, event_id: i64) -> Result<Box<dyn LedgerTxn>, DomainError> {
        Ok(Box::new(InMemoryTxn {
            inner: Arc::clone(&self.inner),
            staged: vec![LedgerWrite::EventDeleted { event_id }],
        }))
    }

    async fn delete_mega_event(
        &self,
        mega_event_id: i64,
    ) -> Result<Box<dyn LedgerTxn>, DomainError> {
        Ok(Box::new(InMemoryTxn {
            inner: Arc::clone(&self.inner),
            staged: vec![LedgerWrite::MegaEventDeleted { mega_event_id }],
        }))
    }

    async fn mirror_event(&self, event_id: i64, _row: &EventMirror) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::EventMirrored { event_id })
    }

    async fn mirror_mega_event(
        &self,
        mega_event_id: i64,
        _row: &MegaEventMirror,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::MegaEventMirrored { mega_event_id })
    }

    async fn mirror_event_status(&self, event_id: i64, status: &str) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::EventStatusMirrored {
            event_id,
            status: status.to_owned(),
        })
    }

    async fn mirror_mega_event_status(
        &self,
        mega_event_id: i64,
        status: &str,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::MegaEventStatusMirrored {
            mega_event_id,
            status: status.to_owned(),
        })
    }

    async fn insert_event_participant(
        &self,
        event_id: i64,
        row: &ParticipantRow,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::EventParticipantInserted {
            event_id,
            member_id: row.member_id,
        })
    }

    async fn insert_mega_event_participant(
        &self,
        mega_event_id: i64,
        row: &ParticipantRow,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::MegaEventParticipantInserted {
            mega_event_id,
            member_id: row.member_id,
        })
    }

    async fn set_event_attendance(
        &self,
        event_id: i64,
        member_id: i64,
        attended: bool,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::EventAttendanceSet {
            event_id,
            member_id,
            attended,
        })
    }

    async fn set_mega_event_attendance(
        &self,
        mega_event_id: i64,
        member_id: i64,
        attended: bool,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::MegaEventAttendanceSet {
            mega_event_id,
            member_id,
            attended,
        })
    }

    async fn insert_event_sponsor(
        &self,
        event_id: i64,
        company_id: i64,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::EventSponsorInserted {
            event_id,
            company_id,
        })
    }

    async fn insert_mega_event_sponsor(
        &self,
        mega_event_id: i64,
        row: &SponsorRow,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::MegaEventSponsorInserted {
            mega_event_id,
            company_id: row.company_id,
        })
    }

    async fn insert_mega_event_organizer(
        &self,
        mega_event_id: i64,
        row: &OrganizerRow,
    ) -> Result<(), DomainError> {
        self.mirror(LedgerWrite::MegaEventOrganizerInserted {
            mega_event_id,
            ngo_id: row.ngo_id,
            role: row.role.clone(),
        })
    }
}
