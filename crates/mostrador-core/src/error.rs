//! # Error Types
//!
//! Domain-specific error types for mostrador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mostrador-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule failures (conflict / not found)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mostrador-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What HTTP clients see (400/404/409/500)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every [`CoreError`] variant belongs to exactly one [`ErrorKind`], which is
//! what the HTTP layer maps to a status code.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or inconsistent input (400).
    Validation,
    /// Request conflicts with current state (409).
    Conflict,
    /// Referenced entity does not exist (404).
    NotFound,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A cash session is already open.
    ///
    /// ## When This Occurs
    /// - Opening a session while another has no closing balance
    /// - Two concurrent opens racing; the loser hits the storage constraint
    #[error("A cash session is already open")]
    CashSessionAlreadyOpen,

    /// The cash session was already closed.
    #[error("Cash session {0} is already closed")]
    CashSessionClosed(String),

    /// A cash effect is required but no session is open.
    #[error("No cash session is open")]
    NoOpenCashSession,

    /// The client is flagged as a debtor and cannot take more credit.
    #[error("Client {0} is a debtor")]
    ClientIsDebtor(String),

    /// The credit payment would push the client over the limit.
    ///
    /// ## User Workflow
    /// ```text
    /// Client limit: $200.00, outstanding: $150.00
    ///      │
    ///      ▼
    /// New credit payment: $100.00
    ///      │
    ///      ▼
    /// 150 + 100 > 200 → CreditLimitExceeded
    /// ```
    #[error("Credit limit exceeded for client {client_id}: limit {limit}, outstanding {outstanding}, requested {requested}")]
    CreditLimitExceeded {
        client_id: String,
        limit: Money,
        outstanding: Money,
        requested: Money,
    },

    /// A credit payment is larger than the outstanding balance.
    #[error("Payment of {requested} exceeds outstanding balance {outstanding}")]
    Overpayment { outstanding: Money, requested: Money },

    /// Not enough stock to complete the sale.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: i64 },

    /// A status change is not allowed from the current state.
    #[error("Cannot change {entity} {id} from {from} to {to}")]
    InvalidStatusTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the classification used for status-code mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::CashSessionAlreadyOpen
            | CoreError::CashSessionClosed(_)
            | CoreError::NoOpenCashSession
            | CoreError::ClientIsDebtor(_)
            | CoreError::CreditLimitExceeded { .. }
            | CoreError::Overpayment { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::InvalidStatusTransition { .. } => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request doesn't meet requirements and are
/// raised before any write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field has an unacceptable value.
    #[error("Invalid {field}: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Payments do not add up to the sale total.
    #[error("Payments total {paid} does not match sale total {total}")]
    AmountMismatch { total: Money, paid: Money },

    /// More payment instruments than a sale accepts.
    #[error("A sale accepts at most {max} payments, got {count}")]
    TooManyPayments { max: usize, count: usize },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CreditLimitExceeded {
            client_id: "c-1".to_string(),
            limit: Money::from_cents(20_000),
            outstanding: Money::from_cents(15_000),
            requested: Money::from_cents(10_000),
        };
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded for client c-1: limit $200.00, outstanding $150.00, requested $100.00"
        );

        let err = ValidationError::AmountMismatch {
            total: Money::from_cents(25_000),
            paid: Money::from_cents(20_000),
        };
        assert_eq!(
            err.to_string(),
            "Payments total $200.00 does not match sale total $250.00"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(CoreError::not_found("Sale", "x").kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::CashSessionAlreadyOpen.kind(), ErrorKind::Conflict);
        assert_eq!(CoreError::NoOpenCashSession.kind(), ErrorKind::Conflict);
        assert_eq!(
            CoreError::ClientIsDebtor("c".to_string()).kind(),
            ErrorKind::Conflict
        );

        let validation: CoreError = ValidationError::required("items").into();
        assert_eq!(validation.kind(), ErrorKind::Validation);
    }
}
