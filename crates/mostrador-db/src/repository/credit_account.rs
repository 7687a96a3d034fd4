//! # Credit Account Repository
//!
//! Store credit ("open tab") owed by clients.
//!
//! ## Account Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sale paid with credit_account                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PENDING ──sweep_overdue(today > due_date)──► OVERDUE                   │
//! │     │                                           │  client → debtor      │
//! │     │ register_payment (outstanding → 0)        │                       │
//! │     ▼                                           │                       │
//! │   PAID ◄────────────────────────────────────────┘                       │
//! │     │                                                                   │
//! │     └── client has nothing left outstanding → debtor reverts to active │
//! │                                                                         │
//! │  Invariant (code + CHECK): 0 <= outstanding <= original,                │
//! │                            status = paid  ⇔  outstanding = 0            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::client::{fetch_client, write_status_in};
use mostrador_core::credit::{check_credit_limit, due_date_for};
use mostrador_core::validation::{validate_amount_cents, validate_description, validate_required};
use mostrador_core::{
    ClientStatus, CoreError, CreditAccount, CreditAccountDetail, CreditAccountFilter,
    CreditAccountRow, CreditAccountStatus, CreditPayment, Money, SweepReport,
};

const ACCOUNT_COLUMNS: &str = r#"
    ca.id, ca.sale_id, ca.client_id, ca.original_amount_cents, ca.outstanding_cents,
    ca.due_date, ca.status, ca.created_at, ca.updated_at
"#;

/// Repository for credit account operations.
#[derive(Debug, Clone)]
pub struct CreditAccountRepository {
    pool: SqlitePool,
}

impl CreditAccountRepository {
    /// Creates a new CreditAccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditAccountRepository { pool }
    }

    /// Registers a repayment against an account.
    ///
    /// ## What This Does (atomically)
    /// 1. Appends a CreditPayment
    /// 2. Decrements the outstanding balance, flipping to `paid` at zero
    /// 3. Reverts a debtor client to active once nothing is outstanding
    ///
    /// ## Errors
    /// - `Validation` - amount not positive, missing operator, long note
    /// - `NotFound` - no such account
    /// - `Overpayment` - amount larger than the outstanding balance
    pub async fn register_payment(
        &self,
        account_id: &str,
        amount: Money,
        operator_id: &str,
        note: Option<&str>,
    ) -> DbResult<CreditAccountDetail> {
        validate_amount_cents("amount", amount.cents())?;
        validate_required("operator_id", operator_id)?;
        if let Some(note) = note {
            validate_description("note", note)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let account = fetch_account(&mut tx, account_id)
            .await?
            .ok_or_else(|| DbError::not_found("CreditAccount", account_id))?;

        if amount > account.outstanding() {
            return Err(CoreError::Overpayment {
                outstanding: account.outstanding(),
                requested: amount,
            }
            .into());
        }

        let now = Utc::now();
        let payment = CreditPayment {
            id: Uuid::new_v4().to_string(),
            credit_account_id: account_id.to_string(),
            amount_cents: amount.cents(),
            operator_id: operator_id.to_string(),
            note: note.map(str::to_string),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO credit_payments (
                id, credit_account_id, amount_cents, operator_id, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.credit_account_id)
        .bind(payment.amount_cents)
        .bind(&payment.operator_id)
        .bind(&payment.note)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        let outstanding = account.outstanding() - amount;
        let status = if outstanding.is_zero() {
            CreditAccountStatus::Paid
        } else {
            account.status
        };

        update_balance_in(&mut tx, account_id, outstanding, status).await?;
        let reverted = revert_debtor_if_clear(&mut tx, &account.client_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            account_id = %account_id,
            amount = %amount,
            outstanding = %outstanding,
            client_reverted = reverted,
            "Credit payment registered"
        );

        self.get(account_id).await
    }

    /// Administrative status change.
    ///
    /// ## Rules
    /// ```text
    /// same status            → no-op
    /// → paid                 → outstanding := 0, debtor revert rule
    /// → overdue (balance>0)  → client becomes debtor
    /// → pending/overdue with zero outstanding → Conflict
    /// ```
    pub async fn set_status(
        &self,
        account_id: &str,
        status: CreditAccountStatus,
    ) -> DbResult<CreditAccount> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let account = fetch_account(&mut tx, account_id)
            .await?
            .ok_or_else(|| DbError::not_found("CreditAccount", account_id))?;

        if account.status == status {
            return Ok(account);
        }

        let outstanding = match status {
            CreditAccountStatus::Paid => Money::zero(),
            CreditAccountStatus::Pending | CreditAccountStatus::Overdue => {
                if account.outstanding().is_zero() {
                    return Err(CoreError::InvalidStatusTransition {
                        entity: "CreditAccount".to_string(),
                        id: account_id.to_string(),
                        from: account.status.as_str().to_string(),
                        to: status.as_str().to_string(),
                    }
                    .into());
                }
                account.outstanding()
            }
        };

        update_balance_in(&mut tx, account_id, outstanding, status).await?;

        match status {
            CreditAccountStatus::Paid => {
                revert_debtor_if_clear(&mut tx, &account.client_id).await?;
            }
            CreditAccountStatus::Overdue => {
                write_status_in(&mut tx, &account.client_id, ClientStatus::Debtor).await?;
            }
            CreditAccountStatus::Pending => {}
        }

        let updated = fetch_account(&mut tx, account_id)
            .await?
            .ok_or_else(|| DbError::not_found("CreditAccount", account_id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            account_id = %account_id,
            from = account.status.as_str(),
            to = status.as_str(),
            "Credit account status changed"
        );

        Ok(updated)
    }

    /// Flags every pending account past its due date as overdue and its
    /// client as debtor.
    ///
    /// Each account is handled in its own short transaction, so one slow or
    /// failing account never holds locks on the others. Running it twice
    /// changes nothing the second time.
    pub async fn sweep_overdue(&self, today: NaiveDate) -> DbResult<SweepReport> {
        let candidates: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, client_id
            FROM credit_accounts
            WHERE status = 'pending' AND due_date < ?1 AND outstanding_cents > 0
            ORDER BY due_date
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        debug!(today = %today, candidates = candidates.len(), "Sweeping overdue accounts");

        let mut report = SweepReport::default();

        for (account_id, client_id) in candidates {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

            let marked = sqlx::query(
                r#"
                UPDATE credit_accounts
                SET status = 'overdue', updated_at = ?2
                WHERE id = ?1 AND status = 'pending' AND outstanding_cents > 0
                "#,
            )
            .bind(&account_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if marked == 0 {
                continue;
            }

            let flagged = sqlx::query(
                "UPDATE clients SET status = 'debtor' WHERE id = ?1 AND status <> 'debtor'",
            )
            .bind(&client_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

            report.accounts_marked += marked;
            report.clients_marked += flagged;
        }

        info!(
            today = %today,
            accounts_marked = report.accounts_marked,
            clients_marked = report.clients_marked,
            "Overdue sweep finished"
        );

        Ok(report)
    }

    /// Lists accounts with their client's name, newest first.
    pub async fn list(&self, filter: CreditAccountFilter) -> DbResult<Vec<CreditAccountRow>> {
        let condition = match filter {
            CreditAccountFilter::Active => "WHERE ca.status <> 'paid'",
            CreditAccountFilter::Overdue => "WHERE ca.status = 'overdue'",
            CreditAccountFilter::All => "",
        };

        let sql = format!(
            r#"
            SELECT {}, c.name AS client_name
            FROM credit_accounts ca
            JOIN clients c ON c.id = ca.client_id
            {}
            ORDER BY ca.created_at DESC, ca.rowid DESC
            "#,
            ACCOUNT_COLUMNS, condition
        );

        let rows = sqlx::query_as::<_, CreditAccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// An account with its client's name and repayment history.
    pub async fn get(&self, account_id: &str) -> DbResult<CreditAccountDetail> {
        let sql = format!(
            r#"
            SELECT {}, c.name AS client_name
            FROM credit_accounts ca
            JOIN clients c ON c.id = ca.client_id
            WHERE ca.id = ?1
            "#,
            ACCOUNT_COLUMNS
        );

        let row = sqlx::query_as::<_, CreditAccountRow>(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("CreditAccount", account_id))?;

        let payments = sqlx::query_as::<_, CreditPayment>(
            r#"
            SELECT id, credit_account_id, amount_cents, operator_id, note, created_at
            FROM credit_payments
            WHERE credit_account_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CreditAccountDetail {
            account: row.account,
            client_name: row.client_name,
            payments,
        })
    }

    /// Σ outstanding across a client's non-paid accounts.
    pub async fn client_outstanding(&self, client_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        outstanding_in(&mut conn, client_id).await
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

/// Checks that a client may take `amount` more on credit.
///
/// Runs before any row referencing the client is written.
///
/// ## Errors
/// - `NotFound` - no such client
/// - `ClientIsDebtor` / `CreditLimitExceeded` - see [`check_credit_limit`]
pub(crate) async fn check_credit_in(
    conn: &mut SqliteConnection,
    client_id: &str,
    amount: Money,
) -> DbResult<()> {
    let client = fetch_client(conn, client_id)
        .await?
        .ok_or_else(|| DbError::not_found("Client", client_id))?;

    let outstanding = outstanding_in(conn, client_id).await?;
    check_credit_limit(client_id, client.status, client.credit_limit(), outstanding, amount)?;

    Ok(())
}

/// Opens a credit account for a sale. Callers run [`check_credit_in`] first.
pub(crate) async fn open_account_in(
    conn: &mut SqliteConnection,
    sale_id: &str,
    client_id: &str,
    amount: Money,
    today: NaiveDate,
) -> DbResult<CreditAccount> {
    let now = Utc::now();
    let account = CreditAccount {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        client_id: client_id.to_string(),
        original_amount_cents: amount.cents(),
        outstanding_cents: amount.cents(),
        due_date: due_date_for(today),
        status: CreditAccountStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    debug!(
        id = %account.id,
        client_id = %client_id,
        amount = %amount,
        due_date = %account.due_date,
        "Opening credit account"
    );

    sqlx::query(
        r#"
        INSERT INTO credit_accounts (
            id, sale_id, client_id, original_amount_cents, outstanding_cents,
            due_date, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&account.id)
    .bind(&account.sale_id)
    .bind(&account.client_id)
    .bind(account.original_amount_cents)
    .bind(account.outstanding_cents)
    .bind(account.due_date)
    .bind(account.status)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(account)
}

pub(crate) async fn outstanding_in(conn: &mut SqliteConnection, client_id: &str) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(outstanding_cents), 0)
        FROM credit_accounts
        WHERE client_id = ?1 AND status <> 'paid'
        "#,
    )
    .bind(client_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

async fn fetch_account(
    conn: &mut SqliteConnection,
    account_id: &str,
) -> DbResult<Option<CreditAccount>> {
    let sql = format!("SELECT {} FROM credit_accounts ca WHERE ca.id = ?1", ACCOUNT_COLUMNS);

    let account = sqlx::query_as::<_, CreditAccount>(&sql)
        .bind(account_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(account)
}

async fn update_balance_in(
    conn: &mut SqliteConnection,
    account_id: &str,
    outstanding: Money,
    status: CreditAccountStatus,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE credit_accounts
        SET outstanding_cents = ?2, status = ?3, updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(account_id)
    .bind(outstanding.cents())
    .bind(status)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Reverts a debtor client to active once nothing is outstanding.
/// Returns whether the client was reverted.
async fn revert_debtor_if_clear(conn: &mut SqliteConnection, client_id: &str) -> DbResult<bool> {
    if !outstanding_in(conn, client_id).await?.is_zero() {
        return Ok(false);
    }

    let result = sqlx::query(
        "UPDATE clients SET status = 'active' WHERE id = ?1 AND status = 'debtor'",
    )
    .bind(client_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================
