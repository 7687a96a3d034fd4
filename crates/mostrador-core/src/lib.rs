//! # mostrador-core: Pure Business Logic for Mostrador
//!
//! This crate holds every rule of the sale-and-cash-reconciliation subsystem
//! that can be expressed without touching a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mostrador Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api, axum)                    │   │
//! │  │   POST /sales, /cash-sessions/open, PUT /payments/{id}/status  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mostrador-db (SQLite)                        │   │
//! │  │        repositories, transactions, storage constraints          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls pure functions                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ mostrador-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌────────┐ ┌────────┐ ┌──────────┐ ┌────────┐ ┌────────────┐  │   │
//! │  │  │ money  │ │ types  │ │ payment_ │ │ credit │ │ reconcile  │  │   │
//! │  │  │ Money  │ │ Sale   │ │  flow    │ │ due    │ │ CashTotals │  │   │
//! │  │  │        │ │ Payment│ │ effects  │ │ dates  │ │            │  │   │
//! │  │  └────────┘ └────────┘ └──────────┘ └────────┘ └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Payment, CashSession, CreditAccount, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for sale and ledger requests
//! - [`payment_flow`] - Cash effects of payment status transitions
//! - [`credit`] - Store-credit due dates and limit checks
//! - [`reconcile`] - Cash-session reconciliation totals
//!
//! ## Example Usage
//!
//! ```rust
//! use mostrador_core::money::Money;
//! use mostrador_core::payment_flow::cash_effects;
//! use mostrador_core::{MovementDirection, PaymentStatus};
//!
//! // Refunding a processed payment takes the money back out of the drawer
//! let effects = cash_effects(
//!     PaymentStatus::Processed,
//!     PaymentStatus::Voided,
//!     Money::from_cents(10_000),
//! );
//! assert_eq!(effects.len(), 1);
//! assert_eq!(effects[0].direction, MovementDirection::Out);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credit;
pub mod error;
pub mod money;
pub mod payment_flow;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum payment instruments accepted for a single sale.
///
/// ## Business Reason
/// The counter UI only offers a primary and a secondary instrument
/// (e.g. part cash, part store credit). The core enforces the same cap so
/// that other callers cannot bypass it.
pub const MAX_PAYMENTS_PER_SALE: usize = 2;

/// Maximum line items accepted for a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Day of the month on which store-credit balances fall due.
pub const CREDIT_DUE_DAY: u32 = 15;

/// Maximum length of free-text descriptions and notes.
pub const MAX_DESCRIPTION_LEN: usize = 255;
