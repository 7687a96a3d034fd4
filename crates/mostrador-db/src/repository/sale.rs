//! # Sale Repository
//!
//! The sale ledger: one atomic write per sale.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_sale()                                     │
//! │                                                                         │
//! │  validate_sale_request()   ← no I/O: Σ payments == total, ≤ 2 payments  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── INSERT sales                                                      │
//! │   ├── per item: decrement stock (never below 0), INSERT sale_items      │
//! │   ├── per payment: Payment Processor (payments, credit_accounts,        │
//! │   │                cash_movements)                                      │
//! │   └── optional shipment (registers the client if needed)                │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error → the transaction is dropped → nothing was written,          │
//! │  stock included.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::cash_session::current_in;
use crate::repository::client::{fetch_client, insert_client_in};
use crate::repository::payment::{list_for_sale_in, process_payment_in};
use crate::repository::product::decrement_stock_in;
use mostrador_core::validation::validate_sale_request;
use mostrador_core::{
    Sale, SaleDetail, SaleItem, SaleReceipt, SaleRequest, SaleSummary, Shipment,
    ShipmentRequest, ShipmentStatus, ValidationError,
};

/// Repository for the sale ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale with its items, payments and optional shipment.
    ///
    /// ## Errors
    /// - `Validation` - malformed request, payments don't add up, > 2 payments,
    ///   shipment without a client
    /// - `NotFound` - unknown product or client
    /// - `InsufficientStock`, `ClientIsDebtor`, `CreditLimitExceeded`
    ///
    /// A missing cash session is not an error: the drawer entries are
    /// skipped with a warning.
    pub async fn create_sale(&self, request: &SaleRequest) -> DbResult<SaleReceipt> {
        let total = validate_sale_request(request)?;
        if let Some(shipment) = &request.shipment {
            validate_shipment(shipment)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            operator_id: request.operator_id.clone(),
            total_cents: total.cents(),
            created_at: Utc::now(),
        };

        debug!(id = %sale.id, total = %total, "Inserting sale");

        sqlx::query(
            "INSERT INTO sales (id, operator_id, total_cents, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&sale.id)
        .bind(&sale.operator_id)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &request.items {
            decrement_stock_in(&mut tx, &item.product_id, item.quantity).await?;

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total().cents())
            .execute(&mut *tx)
            .await?;
        }

        let session = current_in(&mut tx).await?;
        let today = sale.created_at.date_naive();

        let mut receipt = SaleReceipt {
            sale_id: sale.id.clone(),
            total_cents: total.cents(),
            payment_ids: Vec::with_capacity(request.payments.len()),
            cash_movement_recorded: false,
            cash_session_id: None,
            credit_account_ids: Vec::new(),
            shipment_id: None,
        };

        for payment in &request.payments {
            let processed =
                process_payment_in(&mut tx, &sale.id, payment, session.as_ref(), today).await?;

            receipt.payment_ids.push(processed.payment.id);
            if let Some(movement) = processed.movement {
                receipt.cash_movement_recorded = true;
                receipt.cash_session_id = Some(movement.session_id);
            }
            if let Some(account) = processed.credit_account {
                receipt.credit_account_ids.push(account.id);
            }
        }

        if let Some(shipment) = &request.shipment {
            let shipment = insert_shipment_in(&mut tx, &sale.id, shipment).await?;
            receipt.shipment_id = Some(shipment.id);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            total = %total,
            payments = receipt.payment_ids.len(),
            cash_movement_recorded = receipt.cash_movement_recorded,
            credit_accounts = receipt.credit_account_ids.len(),
            shipment = receipt.shipment_id.is_some(),
            "Sale recorded"
        );

        Ok(receipt)
    }

    /// Lists every sale with its shipment status and payment summary,
    /// newest first.
    pub async fn list(&self) -> DbResult<Vec<SaleSummary>> {
        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT
                s.id,
                s.created_at,
                s.total_cents,
                s.operator_id,
                sh.status AS shipment_status,
                (
                    SELECT GROUP_CONCAT(p.payment_type || ':' || p.amount_cents, ', ')
                    FROM payments p
                    WHERE p.sale_id = s.id
                ) AS payments
            FROM sales s
            LEFT JOIN shipments sh ON sh.sale_id = s.id
            ORDER BY s.created_at DESC, s.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets a sale with its items, payments and shipment.
    pub async fn get(&self, sale_id: &str) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;

        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, operator_id, total_cents, created_at FROM sales WHERE id = ?1",
        )
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents, line_total_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        let payments = list_for_sale_in(&mut conn, sale_id).await?;

        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            SELECT id, sale_id, client_id, address, status, created_at
            FROM shipments
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(SaleDetail {
            sale,
            items,
            payments,
            shipment,
        })
    }
}

// =============================================================================
// Shipments
// =============================================================================

/// A shipment needs a client: an existing one, or enough data to register
/// one (name and address).
fn validate_shipment(shipment: &ShipmentRequest) -> Result<(), ValidationError> {
    let has_client_id = shipment
        .client_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    let has_inline_client = shipment
        .client
        .as_ref()
        .is_some_and(|c| !c.name.trim().is_empty() && !c.address.trim().is_empty());

    if !has_client_id && !has_inline_client {
        return Err(ValidationError::required("shipment.client_id"));
    }

    Ok(())
}

async fn insert_shipment_in(
    conn: &mut SqliteConnection,
    sale_id: &str,
    request: &ShipmentRequest,
) -> DbResult<Shipment> {
    let client = match request.client_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(client_id) => fetch_client(conn, client_id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", client_id))?,
        None => match &request.client {
            Some(new_client) => insert_client_in(conn, new_client).await?,
            None => return Err(ValidationError::required("shipment.client_id").into()),
        },
    };

    let address = request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(client.address.as_str())
        .to_string();

    if address.is_empty() {
        return Err(ValidationError::required("shipment.address").into());
    }

    let shipment = Shipment {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        client_id: client.id,
        address,
        status: ShipmentStatus::Pending,
        created_at: Utc::now(),
    };

    debug!(sale_id = %sale_id, client_id = %shipment.client_id, "Inserting shipment");

    sqlx::query(
        r#"
        INSERT INTO shipments (id, sale_id, client_id, address, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&shipment.id)
    .bind(&shipment.sale_id)
    .bind(&shipment.client_id)
    .bind(&shipment.address)
    .bind(shipment.status)
    .bind(shipment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(shipment)
}

// =============================================================================
// Unit Tests
// =============================================================================
