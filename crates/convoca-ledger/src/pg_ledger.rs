//! `PostgreSQL` implementation of the `Ledger` trait.
//!
//! Queries are runtime-checked. The pool is process-wide with a bounded
//! acquire timeout; pool exhaustion surfaces as `StoreUnavailable`.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::{Postgres, Row as _, Transaction};

use convoca_core::error::DomainError;
use convoca_core::ledger::{
    EventMirror, Ledger, LedgerTxn, MegaEventMirror, NewEventRow, NewMegaEventRow, OrganizerRow,
    ParticipantRow, SponsorRow,
};

fn store_err(err: sqlx::Error) -> DomainError {
    DomainError::StoreUnavailable(err.to_string())
}

/// PostgreSQL-backed ledger.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Creates a new `PgLedger` on a shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// An open Postgres transaction handed to the dual-write coordinator.
struct PgLedgerTxn {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTxn for PgLedgerTxn {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(store_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.rollback().await.map_err(store_err)
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn is_active_ngo(&self, user_id: i64) -> Result<bool, DomainError> {
        let row = sqlx::query(
            "SELECT 1 FROM users WHERE user_id = $1 AND user_type = 'ngo' AND active",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.is_some())
    }

    async fn company_exists(&self, company_id: i64) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1 FROM companies WHERE company_id = $1")
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.is_some())
    }

    async fn member_exists(&self, member_id: i64) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1 FROM external_members WHERE member_id = $1")
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.is_some())
    }

    async fn insert_event(
        &self,
        new: &NewEventRow,
    ) -> Result<(i64, Box<dyn LedgerTxn>), DomainError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let inserted = sqlx::query(
            "INSERT INTO events (title, description, starts_at, ends_at, location, event_kind, status, ngo_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING event_id",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(&new.location_address)
        .bind(&new.event_kind)
        .bind(&new.status)
        .bind(new.ngo_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;
        let event_id: i64 = inserted.get("event_id");

        for &company_id in &new.sponsor_company_ids {
            sqlx::query("INSERT INTO event_sponsors (event_id, company_id) VALUES ($1, $2)")
                .bind(event_id)
                .bind(company_id)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        }
        for &company_id in &new.promoter_company_ids {
            sqlx::query("INSERT INTO event_promoters (event_id, company_id) VALUES ($1, $2)")
                .bind(event_id)
                .bind(company_id)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        }

        Ok((event_id, Box::new(PgLedgerTxn { tx })))
    }

    async fn insert_mega_event(
        &self,
        new: &NewMegaEventRow,
    ) -> Result<(i64, Box<dyn LedgerTxn>), DomainError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let inserted = sqlx::query(
            "INSERT INTO mega_events (title, description, starts_at, ends_at, location, status, principal_ngo_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING mega_event_id",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .bind(&new.location_address)
        .bind(&new.status)
        .bind(new.principal_ngo_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;
        let mega_event_id: i64 = inserted.get("mega_event_id");

        sqlx::query(
            "INSERT INTO mega_event_organizers (mega_event_id, ngo_id, organizer_role, active) \
             VALUES ($1, $2, 'principal_coordinator', TRUE)",
        )
        .bind(mega_event_id)
        .bind(new.principal_ngo_id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        for sponsor in &new.sponsors {
            sqlx::query(
                "INSERT INTO mega_event_sponsors (mega_event_id, company_id, tier, amount, pledge_status) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(mega_event_id)
            .bind(sponsor.company_id)
            .bind(&sponsor.tier)
            .bind(sponsor.amount)
            .bind(&sponsor.status)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        Ok((mega_event_id, Box::new(PgLedgerTxn { tx })))
    }

    async fn delete_event(&self, event_id: i64) -> Result<Box<dyn LedgerTxn>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        // Child rows first, core row last.
        for statement in [
            "DELETE FROM event_sponsors WHERE event_id = $1",
            "DELETE FROM event_promoters WHERE event_id = $1",
            "DELETE FROM event_participants WHERE event_id = $1",
            "DELETE FROM events WHERE event_id = $1",
        ] {
            sqlx::query(statement)
                .bind(event_id)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        }
        Ok(Box::new(PgLedgerTxn { tx }))
    }

    async fn delete_mega_event(
        &self,
        mega_event_id: i64,
    ) -> Result<Box<dyn LedgerTxn>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        for statement in [
            "DELETE FROM mega_event_sponsors WHERE mega_event_id = $1",
            "DELETE FROM mega_event_organizers WHERE mega_event_id = $1",
            "DELETE FROM mega_event_participants WHERE mega_event_id = $1",
            "DELETE FROM mega_events WHERE mega_event_id = $1",
        ] {
            sqlx::query(statement)
                .bind(mega_event_id)
                .execute(&mut *tx)
                .await
                .map_err(store_err)?;
        }
        Ok(Box::new(PgLedgerTxn { tx }))
    }

    async fn mirror_event(&self, event_id: i64, row: &EventMirror) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE events SET title = $2, description = $3, starts_at = $4, ends_at = $5, \
             location = $6, event_kind = $7, updated_at = NOW() \
             WHERE event_id = $1",
        )
        .bind(event_id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(row.starts_at)
        .bind(row.ends_at)
        .bind(&row.location_address)
        .bind(&row.event_kind)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn mirror_mega_event(
        &self,
        mega_event_id: i64,
        row: &MegaEventMirror,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE mega_events SET title = $2, description = $3, starts_at = $4, ends_at = $5, \
             location = $6, updated_at = NOW() \
             WHERE mega_event_id = $1",
        )
        .bind(mega_event_id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(row.starts_at)
        .bind(row.ends_at)
        .bind(&row.location_address)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn mirror_event_status(&self, event_id: i64, status: &str) -> Result<(), DomainError> {
        sqlx::query("UPDATE events SET status = $2, updated_at = NOW() WHERE event_id = $1")
            .bind(event_id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn mirror_mega_event_status(
        &self,
        mega_event_id: i64,
        status: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE mega_events SET status = $2, updated_at = NOW() WHERE mega_event_id = $1",
        )
        .bind(mega_event_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_event_participant(
        &self,
        event_id: i64,
        row: &ParticipantRow,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO event_participants (event_id, member_id, participant_kind, participation_status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (event_id, member_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(row.member_id)
        .bind(&row.kind)
        .bind(&row.status)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_mega_event_participant(
        &self,
        mega_event_id: i64,
        row: &ParticipantRow,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO mega_event_participants (mega_event_id, member_id, participant_kind, participation_status) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (mega_event_id, member_id) DO NOTHING",
        )
        .bind(mega_event_id)
        .bind(row.member_id)
        .bind(&row.kind)
        .bind(&row.status)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn set_event_attendance(
        &self,
        event_id: i64,
        member_id: i64,
        attended: bool,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE event_participants SET attended = $3 WHERE event_id = $1 AND member_id = $2",
        )
        .bind(event_id)
        .bind(member_id)
        .bind(attended)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn set_mega_event_attendance(
        &self,
        mega_event_id: i64,
        member_id: i64,
        attended: bool,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE mega_event_participants SET attended = $3 \
             WHERE mega_event_id = $1 AND member_id = $2",
        )
        .bind(mega_event_id)
        .bind(member_id)
        .bind(attended)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_event_sponsor(
        &self,
        event_id: i64,
        company_id: i64,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO event_sponsors (event_id, company_id) VALUES ($1, $2) \
             ON CONFLICT (event_id, company_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(company_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_mega_event_sponsor(
        &self,
        mega_event_id: i64,
        row: &SponsorRow,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO mega_event_sponsors (mega_event_id, company_id, tier, amount, pledge_status) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (mega_event_id, company_id) DO NOTHING",
        )
        .bind(mega_event_id)
        .bind(row.company_id)
        .bind(&row.tier)
        .bind(row.amount)
        .bind(&row.status)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_mega_event_organizer(
        &self,
        mega_event_id: i64,
        row: &OrganizerRow,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO mega_event_organizers (mega_event_id, ngo_id, organizer_role, active) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (mega_event_id, ngo_id) DO NOTHING",
        )
        .bind(mega_event_id)
        .bind(row.ngo_id)
        .bind(&row.role)
        .bind(row.active)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}
