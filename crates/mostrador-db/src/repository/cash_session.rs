//! # Cash Session Repository
//!
//! Open-to-close periods of cash-drawer accounting.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (no session) ──open()──► OPEN ──close()──► CLOSED                     │
//! │        ▲                    │                                           │
//! │        │                    │ open() again → CashSessionAlreadyOpen     │
//! │        └────────────────────┘ close() again → CashSessionClosed         │
//! │                                                                         │
//! │  open_slot column:   OPEN = 1    CLOSED = NULL                          │
//! │  UNIQUE(open_slot) makes "at most one open session" a storage fact:     │
//! │  a racing second open fails on insert even if both passed the           │
//! │  pre-check.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::validation::{validate_balance_cents, validate_required};
use mostrador_core::{CashSession, CoreError, Money};

const OPEN_SLOT_COLUMN: &str = "cash_sessions.open_slot";

const SESSION_COLUMNS: &str = r#"
    id, business_date, opened_at, opening_balance_cents,
    closing_balance_cents, closed_at, operator_id
"#;

/// Repository for cash session operations.
#[derive(Debug, Clone)]
pub struct CashSessionRepository {
    pool: SqlitePool,
}

impl CashSessionRepository {
    /// Creates a new CashSessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashSessionRepository { pool }
    }

    /// Opens a new cash session.
    ///
    /// ## Errors
    /// - `Validation` - negative opening balance or missing operator
    /// - `CashSessionAlreadyOpen` - another session has no closing balance
    pub async fn open(
        &self,
        business_date: NaiveDate,
        opening_balance: Money,
        operator_id: &str,
    ) -> DbResult<CashSession> {
        validate_balance_cents("opening_balance", opening_balance.cents())?;
        validate_required("operator_id", operator_id)?;

        let mut conn = self.pool.acquire().await?;

        if current_in(&mut conn).await?.is_some() {
            return Err(CoreError::CashSessionAlreadyOpen.into());
        }

        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            business_date,
            opened_at: Utc::now(),
            opening_balance_cents: opening_balance.cents(),
            closing_balance_cents: None,
            closed_at: None,
            operator_id: operator_id.to_string(),
        };

        debug!(id = %session.id, date = %business_date, "Opening cash session");

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, business_date, opened_at, opening_balance_cents,
                closing_balance_cents, closed_at, operator_id, open_slot
            ) VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, 1)
            "#,
        )
        .bind(&session.id)
        .bind(session.business_date)
        .bind(session.opened_at)
        .bind(session.opening_balance_cents)
        .bind(&session.operator_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on(OPEN_SLOT_COLUMN) => {
                DbError::Domain(CoreError::CashSessionAlreadyOpen)
            }
            err => err,
        })?;

        info!(
            session_id = %session.id,
            opening = %opening_balance,
            operator_id = %operator_id,
            "Cash session opened"
        );

        Ok(session)
    }

    /// Closes a session with the counted closing balance.
    ///
    /// ## Errors
    /// - `NotFound` - no such session
    /// - `CashSessionClosed` - the session was already closed
    pub async fn close(&self, session_id: &str, closing_balance: Money) -> DbResult<CashSession> {
        validate_balance_cents("closing_balance", closing_balance.cents())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let session = fetch_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("CashSession", session_id))?;

        if !session.is_open() {
            return Err(CoreError::CashSessionClosed(session_id.to_string()).into());
        }

        let closed_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions
            SET closing_balance_cents = ?2, closed_at = ?3, open_slot = NULL
            WHERE id = ?1 AND open_slot = 1
            "#,
        )
        .bind(session_id)
        .bind(closing_balance.cents())
        .bind(closed_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CashSessionClosed(session_id.to_string()).into());
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            session_id = %session_id,
            closing = %closing_balance,
            "Cash session closed"
        );

        Ok(CashSession {
            closing_balance_cents: Some(closing_balance.cents()),
            closed_at: Some(closed_at),
            ..session
        })
    }

    /// The session with no closing balance, if any.
    pub async fn current(&self) -> DbResult<Option<CashSession>> {
        let mut conn = self.pool.acquire().await?;
        current_in(&mut conn).await
    }

    /// The most recently dated session regardless of state.
    pub async fn last(&self) -> DbResult<Option<CashSession>> {
        let sql = format!(
            "SELECT {} FROM cash_sessions ORDER BY business_date DESC, opened_at DESC, rowid DESC LIMIT 1",
            SESSION_COLUMNS
        );

        let session = sqlx::query_as::<_, CashSession>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get(&self, session_id: &str) -> DbResult<CashSession> {
        let mut conn = self.pool.acquire().await?;
        fetch_session(&mut conn, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("CashSession", session_id))
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

pub(crate) async fn fetch_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Option<CashSession>> {
    let sql = format!("SELECT {} FROM cash_sessions WHERE id = ?1", SESSION_COLUMNS);

    let session = sqlx::query_as::<_, CashSession>(&sql)
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

pub(crate) async fn current_in(conn: &mut SqliteConnection) -> DbResult<Option<CashSession>> {
    let sql = format!("SELECT {} FROM cash_sessions WHERE open_slot = 1", SESSION_COLUMNS);

    let session = sqlx::query_as::<_, CashSession>(&sql)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(session)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use mostrador_core::ErrorKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_open_close_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cash_sessions();

        assert!(repo.current().await.unwrap().is_none());
        assert!(repo.last().await.unwrap().is_none());

        let session = repo.open(today(), Money::from_cents(100_000), "op-1").await.unwrap();
        assert!(session.is_open());
        assert_eq!(repo.current().await.unwrap().unwrap().id, session.id);

        let closed = repo.close(&session.id, Money::from_cents(99_500)).await.unwrap();
        assert!(!closed.is_open());
        assert!(closed.closed_at.is_some());

        assert!(repo.current().await.unwrap().is_none());
        let last = repo.last().await.unwrap().unwrap();
        assert_eq!(last.id, session.id);
        assert_eq!(last.closing_balance(), Some(Money::from_cents(99_500)));
    }

    #[tokio::test]
    async fn test_second_open_conflicts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cash_sessions();

        repo.open(today(), Money::zero(), "op-1").await.unwrap();
        let err = repo.open(today(), Money::zero(), "op-2").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CashSessionAlreadyOpen)));
    }

    #[tokio::test]
    async fn test_storage_rejects_second_open_slot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.cash_sessions()
            .open(today(), Money::zero(), "op-1")
            .await
            .unwrap();

        // Bypass the pre-check: the unique index must still refuse
        let err = sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, business_date, opened_at, opening_balance_cents, operator_id, open_slot
            ) VALUES ('raw', '2026-03-10', '2026-03-10T09:00:00Z', 0, 'op-2', 1)
            "#,
        )
        .execute(db.pool())
        .await
        .map_err(DbError::from)
        .unwrap_err();

        assert!(err.is_unique_violation_on(OPEN_SLOT_COLUMN));
    }

    #[tokio::test]
    async fn test_close_errors() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.cash_sessions();

        let err = repo.close("missing", Money::zero()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let session = repo.open(today(), Money::zero(), "op-1").await.unwrap();
        repo.close(&session.id, Money::zero()).await.unwrap();

        let err = repo.close(&session.id, Money::zero()).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CashSessionClosed(_))));

        // Closing does not block a new open
        repo.open(today(), Money::zero(), "op-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_negative_balance_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .cash_sessions()
            .open(today(), Money::from_cents(-1), "op-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }
}
