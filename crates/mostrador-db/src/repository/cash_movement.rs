//! # Cash Movement Repository
//!
//! Append-only ledger of drawer entries, one per cash effect.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Writers                               Ledger                           │
//! │  ───────                               ──────                           │
//! │  sale payment (cash/card/qr/transfer) ─┐                                │
//! │  payment status change (in / out) ─────┼──► cash_movements (INSERT only)│
//! │  manual entry (record) ────────────────┘          │                     │
//! │                                                   ▼                     │
//! │                                 detail() = session + entries + totals   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::cash_session::fetch_session;
use mostrador_core::reconcile::CashSessionDetail;
use mostrador_core::validation::{validate_amount_cents, validate_description};
use mostrador_core::{CashMovement, CoreError, Money, MovementDirection};

/// Repository for the cash movement ledger.
#[derive(Debug, Clone)]
pub struct CashMovementRepository {
    pool: SqlitePool,
}

impl CashMovementRepository {
    /// Creates a new CashMovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashMovementRepository { pool }
    }

    /// Records a manual entry (float top-up, expense, withdrawal).
    ///
    /// ## Errors
    /// - `Validation` - amount not positive, description too long
    /// - `NotFound` - no such session
    /// - `CashSessionClosed` - the session no longer takes entries
    pub async fn record(
        &self,
        session_id: &str,
        direction: MovementDirection,
        amount: Money,
        description: &str,
        payment_id: Option<&str>,
    ) -> DbResult<CashMovement> {
        validate_amount_cents("amount", amount.cents())?;
        validate_description("description", description)?;

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

        let movement =
            insert_movement_in(&mut tx, session_id, payment_id, direction, amount, description)
                .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            session_id = %session_id,
            direction = direction.as_str(),
            amount = %amount,
            "Manual cash movement recorded"
        );

        Ok(movement)
    }

    /// Lists a session's entries, newest first.
    pub async fn list(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let mut conn = self.pool.acquire().await?;

        if fetch_session(&mut conn, session_id).await?.is_none() {
            return Err(DbError::not_found("CashSession", session_id));
        }

        list_in(&mut conn, session_id).await
    }

    /// Session, entries and reconciliation totals.
    pub async fn detail(&self, session_id: &str) -> DbResult<CashSessionDetail> {
        let mut conn = self.pool.acquire().await?;

        let session = fetch_session(&mut conn, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("CashSession", session_id))?;
        let movements = list_in(&mut conn, session_id).await?;

        Ok(CashSessionDetail::new(session, movements))
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

/// Appends one entry. Callers are responsible for the session being open.
pub(crate) async fn insert_movement_in(
    conn: &mut SqliteConnection,
    session_id: &str,
    payment_id: Option<&str>,
    direction: MovementDirection,
    amount: Money,
    description: &str,
) -> DbResult<CashMovement> {
    let movement = CashMovement {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        payment_id: payment_id.map(str::to_string),
        direction,
        amount_cents: amount.cents(),
        description: description.to_string(),
        created_at: Utc::now(),
    };

    debug!(
        session_id = %session_id,
        payment_id = ?payment_id,
        direction = direction.as_str(),
        amount = %amount,
        "Inserting cash movement"
    );

    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, session_id, payment_id, direction, amount_cents, description, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.session_id)
    .bind(&movement.payment_id)
    .bind(movement.direction)
    .bind(movement.amount_cents)
    .bind(&movement.description)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(movement)
}

async fn list_in(conn: &mut SqliteConnection, session_id: &str) -> DbResult<Vec<CashMovement>> {
    let movements = sqlx::query_as::<_, CashMovement>(
        r#"
        SELECT id, session_id, payment_id, direction, amount_cents, description, created_at
        FROM cash_movements
        WHERE session_id = ?1
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(movements)
}

// =============================================================================
// Unit Tests
// =============================================================================
