//! # Payment Repository
//!
//! Payment processing at sale time and payment status transitions.
//!
//! ## Payment Processing (inside the sale transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PaymentRequest                                                         │
//! │       │                                                                 │
//! │       ├── credit_account ──► client exists? debtor? limit?              │
//! │       │                      insert Payment + CreditAccount             │
//! │       │                      (no drawer entry)                          │
//! │       │                                                                 │
//! │       └── cash/card/qr/transfer ──► insert Payment                      │
//! │                                     processed + session open            │
//! │                                       → one `in` CashMovement           │
//! │                                     processed + no session              │
//! │                                       → warn!, skip the movement        │
//! │                                     pending → no drawer effect yet      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Transitions
//! Compensating entries come from [`mostrador_core::payment_flow`]; this
//! module only persists them together with the new status.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::cash_movement::insert_movement_in;
use crate::repository::cash_session::current_in;
use crate::repository::credit_account::{check_credit_in, open_account_in};
use mostrador_core::payment_flow::{cash_effects, transition_description};
use mostrador_core::{
    CashMovement, CashSession, CoreError, CreditAccount, MovementDirection, Payment,
    PaymentRequest, PaymentStatus, PaymentTransition, PaymentType, ValidationError,
};

const PAYMENT_COLUMNS: &str = r#"
    id, sale_id, payment_type, amount_cents, status, client_id, created_at, updated_at
"#;

/// What processing one payment wrote.
#[derive(Debug, Clone)]
pub struct ProcessedPayment {
    pub payment: Payment,
    pub movement: Option<CashMovement>,
    pub credit_account: Option<CreditAccount>,
}

/// Repository for payment operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by ID.
    pub async fn get(&self, payment_id: &str) -> DbResult<Payment> {
        let mut conn = self.pool.acquire().await?;
        fetch_payment(&mut conn, payment_id)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", payment_id))
    }

    /// Lists the payments of a sale in the order they were taken.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        list_for_sale_in(&mut conn, sale_id).await
    }

    /// Moves a payment to `new_status`, writing the drawer entries the
    /// transition requires.
    ///
    /// ## Errors
    /// - `NotFound` - no such payment
    /// - `NoOpenCashSession` - an entry is required but no session is open
    ///
    /// Setting the current status again is a no-op that writes nothing.
    pub async fn change_status(
        &self,
        payment_id: &str,
        new_status: PaymentStatus,
    ) -> DbResult<PaymentTransition> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let payment = fetch_payment(&mut tx, payment_id)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", payment_id))?;

        let previous_status = payment.status;

        if previous_status == new_status {
            debug!(payment_id = %payment_id, status = new_status.as_str(), "Status unchanged");
            return Ok(PaymentTransition {
                payment,
                previous_status,
                movements: Vec::new(),
            });
        }

        let effects = if payment.payment_type.moves_cash() {
            cash_effects(previous_status, new_status, payment.amount())
        } else {
            Vec::new()
        };

        let mut movements = Vec::with_capacity(effects.len());

        if !effects.is_empty() {
            let session = current_in(&mut tx)
                .await?
                .ok_or(CoreError::NoOpenCashSession)?;

            let description = transition_description(payment_id, previous_status, new_status);

            for effect in effects {
                let movement = insert_movement_in(
                    &mut tx,
                    &session.id,
                    Some(payment_id),
                    effect.direction,
                    effect.amount,
                    &description,
                )
                .await?;
                movements.push(movement);
            }
        }

        let updated_at = Utc::now();

        sqlx::query("UPDATE payments SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(payment_id)
            .bind(new_status)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            payment_id = %payment_id,
            from = previous_status.as_str(),
            to = new_status.as_str(),
            movements = movements.len(),
            "Payment status changed"
        );

        Ok(PaymentTransition {
            payment: Payment {
                status: new_status,
                updated_at,
                ..payment
            },
            previous_status,
            movements,
        })
    }
}

// =============================================================================
// Payment Processor (runs inside the sale transaction)
// =============================================================================

/// Persists one payment of a sale and its side effects.
///
/// `session` is the drawer session open when the sale started, if any.
pub(crate) async fn process_payment_in(
    conn: &mut SqliteConnection,
    sale_id: &str,
    request: &PaymentRequest,
    session: Option<&CashSession>,
    today: NaiveDate,
) -> DbResult<ProcessedPayment> {
    let amount = request.amount();
    let status = request.status.unwrap_or_default();
    let client_id = match request.payment_type {
        PaymentType::CreditAccount => Some(
            request
                .client_id
                .clone()
                .ok_or_else(|| ValidationError::required("client_id"))?,
        ),
        _ => None,
    };

    // The payment row references the client, so the client is checked first
    if let Some(client_id) = client_id.as_deref() {
        check_credit_in(conn, client_id, amount).await?;
    }

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        payment_type: request.payment_type,
        amount_cents: amount.cents(),
        status,
        client_id,
        created_at: now,
        updated_at: now,
    };

    debug!(
        sale_id = %sale_id,
        payment_type = payment.payment_type.as_str(),
        amount = %amount,
        status = status.as_str(),
        "Recording payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, sale_id, payment_type, amount_cents, status, client_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.sale_id)
    .bind(payment.payment_type)
    .bind(payment.amount_cents)
    .bind(payment.status)
    .bind(&payment.client_id)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(&mut *conn)
    .await?;

    if let Some(client_id) = payment.client_id.as_deref() {
        let account = open_account_in(conn, sale_id, client_id, amount, today).await?;
        return Ok(ProcessedPayment {
            payment,
            movement: None,
            credit_account: Some(account),
        });
    }

    if status != PaymentStatus::Processed {
        return Ok(ProcessedPayment {
            payment,
            movement: None,
            credit_account: None,
        });
    }

    let movement = match session {
        Some(session) => {
            let description = format!("Sale #{} ({})", sale_id, payment.payment_type.as_str());
            Some(
                insert_movement_in(
                    conn,
                    &session.id,
                    Some(&payment.id),
                    MovementDirection::In,
                    amount,
                    &description,
                )
                .await?,
            )
        }
        None => {
            warn!(
                sale_id = %sale_id,
                payment_id = %payment.id,
                amount = %amount,
                "No cash session open, skipping cash movement"
            );
            None
        }
    };

    Ok(ProcessedPayment {
        payment,
        movement,
        credit_account: None,
    })
}

// =============================================================================
// Connection-level helpers
// =============================================================================

pub(crate) async fn list_for_sale_in(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Vec<Payment>> {
    let sql = format!(
        "SELECT {} FROM payments WHERE sale_id = ?1 ORDER BY created_at, rowid",
        PAYMENT_COLUMNS
    );

    let payments = sqlx::query_as::<_, Payment>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(payments)
}

async fn fetch_payment(conn: &mut SqliteConnection, payment_id: &str) -> DbResult<Option<Payment>> {
    let sql = format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS);

    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(payment_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(payment)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use mostrador_core::{ErrorKind, Money, NewClient};

    async fn insert_sale(db: &Database, total: i64) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO sales (id, operator_id, total_cents, created_at) VALUES (?1, 'op', ?2, ?3)")
            .bind(&id)
            .bind(total)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
        id
    }

    async fn insert_payment(
        db: &Database,
        payment_type: PaymentType,
        status: PaymentStatus,
    ) -> ProcessedPayment {
        let sale_id = insert_sale(db, 10_000).await;
        let session = db.cash_sessions().current().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        process_payment_in(
            &mut conn,
            &sale_id,
            &PaymentRequest {
                payment_type,
                amount_cents: 10_000,
                client_id: None,
                status: Some(status),
            },
            session.as_ref(),
            Utc::now().date_naive(),
        )
        .await
        .unwrap()
    }

    async fn open_session(db: &Database) {
        db.cash_sessions()
            .open(Utc::now().date_naive(), Money::from_cents(100_000), "op")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_processed_cash_payment_writes_movement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        open_session(&db).await;

        let processed = insert_payment(&db, PaymentType::Card, PaymentStatus::Processed).await;
        let movement = processed.movement.unwrap();
        assert_eq!(movement.direction, MovementDirection::In);
        assert_eq!(movement.amount_cents, 10_000);
        assert_eq!(movement.payment_id.as_deref(), Some(processed.payment.id.as_str()));
        assert_eq!(
            movement.description,
            format!("Sale #{} (card)", processed.payment.sale_id)
        );
    }

    #[tokio::test]
    async fn test_no_session_skips_movement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let processed = insert_payment(&db, PaymentType::Cash, PaymentStatus::Processed).await;
        assert!(processed.movement.is_none());
        assert_eq!(db.payments().get(&processed.payment.id).await.unwrap().status, PaymentStatus::Processed);
    }

    #[tokio::test]
    async fn test_void_then_repeat_is_single_refund() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        open_session(&db).await;
        let processed = insert_payment(&db, PaymentType::Cash, PaymentStatus::Processed).await;
        let repo = db.payments();

        let transition = repo
            .change_status(&processed.payment.id, PaymentStatus::Voided)
            .await
            .unwrap();
        assert_eq!(transition.previous_status, PaymentStatus::Processed);
        assert_eq!(transition.payment.status, PaymentStatus::Voided);
        assert_eq!(transition.movements.len(), 1);
        assert_eq!(transition.movements[0].direction, MovementDirection::Out);

        let again = repo
            .change_status(&processed.payment.id, PaymentStatus::Voided)
            .await
            .unwrap();
        assert!(again.movements.is_empty());
    }

    #[tokio::test]
    async fn test_pending_to_processed_needs_session() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pending = insert_payment(&db, PaymentType::Transfer, PaymentStatus::Pending).await;
        assert!(pending.movement.is_none());

        let err = db
            .payments()
            .change_status(&pending.payment.id, PaymentStatus::Processed)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NoOpenCashSession)));
        assert_eq!(
            db.payments().get(&pending.payment.id).await.unwrap().status,
            PaymentStatus::Pending
        );

        // Transitions with no cash effect don't need a session
        let cancelled = db
            .payments()
            .change_status(&pending.payment.id, PaymentStatus::Cancelled)
            .await
            .unwrap();
        assert!(cancelled.movements.is_empty());

        open_session(&db).await;
        let processed = db
            .payments()
            .change_status(&pending.payment.id, PaymentStatus::Processed)
            .await
            .unwrap();
        assert_eq!(processed.movements[0].direction, MovementDirection::In);
    }

    #[tokio::test]
    async fn test_credit_account_status_changes_skip_cash_ledger() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .clients()
            .insert(&NewClient {
                name: "Marta Gomez".to_string(),
                address: "Av. San Martin 1450".to_string(),
                credit_limit_cents: 50_000,
                ..Default::default()
            })
            .await
            .unwrap();
        let sale_id = insert_sale(&db, 10_000).await;

        let mut conn = db.pool().acquire().await.unwrap();
        let processed = process_payment_in(
            &mut conn,
            &sale_id,
            &PaymentRequest {
                payment_type: PaymentType::CreditAccount,
                amount_cents: 10_000,
                client_id: Some(client.id.clone()),
                status: Some(PaymentStatus::Processed),
            },
            None,
            Utc::now().date_naive(),
        )
        .await
        .unwrap();
        drop(conn);
        assert!(processed.movement.is_none());

        // No session is open for either change
        let repo = db.payments();
        let voided = repo
            .change_status(&processed.payment.id, PaymentStatus::Voided)
            .await
            .unwrap();
        assert_eq!(voided.payment.status, PaymentStatus::Voided);
        assert!(voided.movements.is_empty());

        let restored = repo
            .change_status(&processed.payment.id, PaymentStatus::Processed)
            .await
            .unwrap();
        assert_eq!(restored.previous_status, PaymentStatus::Voided);
        assert_eq!(restored.payment.status, PaymentStatus::Processed);
        assert!(restored.movements.is_empty());

        let movements: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cash_movements")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(movements, 0);
    }

    #[tokio::test]
    async fn test_unknown_payment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .payments()
            .change_status("missing", PaymentStatus::Voided)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(db.payments().list_for_sale("missing").await.unwrap().is_empty());
    }
}
