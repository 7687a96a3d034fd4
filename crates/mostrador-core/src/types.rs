//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐            │
//! │  │    Sale      │──►│   SaleItem   │   │     Payment      │            │
//! │  │  total       │   │  quantity    │◄──│  sale_id (FK)    │            │
//! │  │  operator_id │   │  unit_price  │   │  type / status   │            │
//! │  └──────┬───────┘   └──────────────┘   └────────┬─────────┘            │
//! │         │                                       │ payment_id (opt)      │
//! │         ▼                                       ▼                       │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐            │
//! │  │CreditAccount │──►│CreditPayment │   │   CashMovement   │            │
//! │  │ outstanding  │   │  amount      │   │  in / out        │            │
//! │  │ due_date     │   └──────────────┘   │  session_id (FK) │            │
//! │  └──────────────┘                      └────────┬─────────┘            │
//! │                                                 ▼                       │
//! │                                        ┌──────────────────┐            │
//! │                                        │   CashSession    │            │
//! │                                        │ opening/closing  │            │
//! │                                        └──────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row types carry monetary values as `*_cents: i64` columns and expose
//! [`Money`] accessors. Request types (`*Request`) are what callers send in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Payment Type
// =============================================================================

/// Instrument used to pay (part of) a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Card,
    Qr,
    Transfer,
    /// Store credit ("open tab") owed by a client.
    CreditAccount,
}

impl PaymentType {
    /// Whether payments of this type go through the cash drawer ledger.
    ///
    /// Card, QR and transfer receipts are tracked in the drawer ledger as
    /// well, so that the session detail shows all takings.
    #[inline]
    pub const fn moves_cash(&self) -> bool {
        !matches!(self, PaymentType::CreditAccount)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Card => "card",
            PaymentType::Qr => "qr",
            PaymentType::Transfer => "transfer",
            PaymentType::CreditAccount => "credit_account",
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Lifecycle state of a payment. See [`crate::payment_flow`].
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded but not collected yet.
    Pending,
    /// Collected.
    Processed,
    /// Abandoned before collection.
    Cancelled,
    /// Refunded after collection.
    Voided,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Processed
    }
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processed => "processed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Voided => "voided",
        }
    }
}

// =============================================================================
// Movement Direction
// =============================================================================

/// Direction of a cash movement relative to the drawer.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }
}

// =============================================================================
// Client / Credit Account / Shipment Status
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Inactive,
    /// At least one credit account is overdue with a positive balance.
    Debtor,
}

impl Default for ClientStatus {
    fn default() -> Self {
        ClientStatus::Active
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditAccountStatus {
    Pending,
    Paid,
    Overdue,
}

impl CreditAccountStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CreditAccountStatus::Pending => "pending",
            CreditAccountStatus::Paid => "paid",
            CreditAccountStatus::Overdue => "overdue",
        }
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Delivered,
}

/// Listing filter for credit accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditAccountFilter {
    /// Every account that is not paid (pending or overdue).
    Active,
    Overdue,
    All,
}

impl Default for CreditAccountFilter {
    fn default() -> Self {
        CreditAccountFilter::Active
    }
}

// =============================================================================
// Collaborator Entities (Product, Client)
// =============================================================================

/// A product as seen by the sale ledger: price and stock only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A client as seen by the credit facility.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub status: ClientStatus,
    /// Maximum store credit the client may owe at any time.
    pub credit_limit_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Client {
    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub operator_id: String,
    /// Σ(quantity × unit_price) of the line items.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a sale. Unit price is frozen at sale time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale. A sale has one or two of them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub payment_type: PaymentType,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    /// Set when `payment_type` is `credit_account`.
    pub client_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Session & Movements
// =============================================================================

/// One open-to-close period of cash-drawer accounting.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    /// Business date the session belongs to.
    #[ts(as = "String")]
    pub business_date: NaiveDate,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opening_balance_cents: i64,
    /// `None` while the session is open.
    pub closing_balance_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub operator_id: String,
}

impl CashSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closing_balance_cents.is_none()
    }

    #[inline]
    pub fn opening_balance(&self) -> Money {
        Money::from_cents(self.opening_balance_cents)
    }

    #[inline]
    pub fn closing_balance(&self) -> Option<Money> {
        self.closing_balance_cents.map(Money::from_cents)
    }
}

/// One append-only drawer ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub payment_id: Option<String>,
    pub direction: MovementDirection,
    /// Always positive; the sign comes from `direction`.
    pub amount_cents: i64,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Credit Accounts
// =============================================================================

/// Store credit owed by a client for one sale.
///
/// ## Invariants
/// - `0 <= outstanding_cents <= original_amount_cents`
/// - `status == Paid` exactly when `outstanding_cents == 0`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditAccount {
    pub id: String,
    pub sale_id: String,
    pub client_id: String,
    pub original_amount_cents: i64,
    pub outstanding_cents: i64,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub status: CreditAccountStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CreditAccount {
    #[inline]
    pub fn outstanding(&self) -> Money {
        Money::from_cents(self.outstanding_cents)
    }
}

/// A repayment against a credit account. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditPayment {
    pub id: String,
    pub credit_account_id: String,
    pub amount_cents: i64,
    pub operator_id: String,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Credit account row joined with its client's name, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditAccountRow {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub account: CreditAccount,
    pub client_name: String,
}

/// A credit account with its repayment history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditAccountDetail {
    pub account: CreditAccount,
    pub client_name: String,
    pub payments: Vec<CreditPayment>,
}

/// Outcome of an overdue sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SweepReport {
    /// Accounts flipped from pending to overdue in this run.
    pub accounts_marked: u64,
    /// Clients flipped to debtor in this run.
    pub clients_marked: u64,
}

// =============================================================================
// Shipment
// =============================================================================

/// Delivery attached to a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shipment {
    pub id: String,
    pub sale_id: String,
    pub client_id: String,
    pub address: String,
    pub status: ShipmentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Requests
// =============================================================================

/// Body of a sale creation request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub operator_id: String,
    pub items: Vec<LineItemRequest>,
    pub payments: Vec<PaymentRequest>,
    #[serde(default)]
    pub shipment: Option<ShipmentRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl LineItemRequest {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub payment_type: PaymentType,
    pub amount_cents: i64,
    /// Required for `credit_account`.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Initial status; defaults to processed.
    #[serde(default)]
    pub status: Option<PaymentStatus>,
}

impl PaymentRequest {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Delivery details for a sale.
///
/// Either `client_id` names an existing client, or `client` carries the
/// data of a new one to register on the fly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShipmentRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client: Option<NewClient>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Client data for registering a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub credit_limit_cents: i64,
}

// =============================================================================
// Sale Results
// =============================================================================

/// What a committed sale did.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: String,
    pub total_cents: i64,
    pub payment_ids: Vec<String>,
    /// At least one payment produced a drawer entry.
    pub cash_movement_recorded: bool,
    /// The session the entries went to, if any.
    pub cash_session_id: Option<String>,
    pub credit_account_ids: Vec<String>,
    pub shipment_id: Option<String>,
}

impl SaleReceipt {
    /// Whether a credit account was opened by this sale.
    #[inline]
    pub fn credit_account_opened(&self) -> bool {
        !self.credit_account_ids.is_empty()
    }
}

/// One row of the sales listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleSummary {
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub operator_id: String,
    /// `None` when the sale has no shipment.
    pub shipment_status: Option<ShipmentStatus>,
    /// e.g. `"cash:15000, credit_account:15000"`.
    pub payments: Option<String>,
}

/// A sale with its lines and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
    pub shipment: Option<Shipment>,
}

/// Result of a payment status change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentTransition {
    pub payment: Payment,
    pub previous_status: PaymentStatus,
    /// Compensating drawer entries written by the change.
    pub movements: Vec<CashMovement>,
}

// =============================================================================
// Unit Tests
// =============================================================================
