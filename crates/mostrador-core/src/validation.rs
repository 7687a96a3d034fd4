//! # Validation Module
//!
//! Input validation for sale and ledger requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── Type validation (JSON deserialization, enum names)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Shape rules (non-empty, positive, length)                         │
//! │  └── Sale rules (payments == total, payment cap)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (amount > 0, outstanding range)                 │
//! │  ├── UNIQUE open_slot (one open cash session)                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here runs before a transaction is opened, so a rejected
//! request writes nothing.
//!
//! ## Usage
//! ```rust
//! use mostrador_core::validation::{validate_amount_cents, validate_quantity};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_amount_cents("amount", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentStatus, PaymentType, SaleRequest};
use crate::{MAX_DESCRIPTION_LEN, MAX_ITEM_QUANTITY, MAX_PAYMENTS_PER_SALE, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required identifier-like field (operator, product, client).
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    Ok(())
}

/// Validates a free-text description or note.
///
/// ## Rules
/// - May be empty
/// - At most [`MAX_DESCRIPTION_LEN`] characters
pub fn validate_description(field: &str, text: &str) -> ValidationResult<()> {
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents. Zero is allowed (giveaways).
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive (payments,
/// movements, credit repayments).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a drawer balance (opening or closing count).
pub fn validate_balance_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Sale Validation
// =============================================================================

/// Validates a sale request and returns its total.
///
/// ## Checks (in order)
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  operator_id present                                                    │
/// │  1..=MAX_SALE_ITEMS items, each: product_id, quantity, unit price       │
/// │  1..=MAX_PAYMENTS_PER_SALE payments, each: amount > 0,                  │
/// │      status pending or processed, credit_account ⇒ client_id present    │
/// │  Σ payments == Σ quantity × unit_price   (exact, integer cents)         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Stock, client existence and credit limits need storage and are checked
/// inside the sale transaction.
pub fn validate_sale_request(req: &SaleRequest) -> ValidationResult<Money> {
    validate_required("operator_id", &req.operator_id)?;

    if req.items.is_empty() {
        return Err(ValidationError::required("items"));
    }
    if req.items.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    for item in &req.items {
        validate_required("product_id", &item.product_id)?;
        validate_quantity(item.quantity)?;
        validate_price_cents(item.unit_price_cents)?;
    }

    if req.payments.is_empty() {
        return Err(ValidationError::required("payments"));
    }
    if req.payments.len() > MAX_PAYMENTS_PER_SALE {
        return Err(ValidationError::TooManyPayments {
            max: MAX_PAYMENTS_PER_SALE,
            count: req.payments.len(),
        });
    }

    for payment in &req.payments {
        validate_amount_cents("amount", payment.amount_cents)?;

        if let Some(status) = payment.status {
            if !matches!(status, PaymentStatus::Pending | PaymentStatus::Processed) {
                return Err(ValidationError::InvalidFormat {
                    field: "status".to_string(),
                    reason: "a new payment is either pending or processed".to_string(),
                });
            }
        }

        if payment.payment_type == PaymentType::CreditAccount {
            match payment.client_id.as_deref() {
                Some(id) if !id.trim().is_empty() => {}
                _ => return Err(ValidationError::required("client_id")),
            }
        }
    }

    let mut total = Money::zero();
    for item in &req.items {
        total = Money::from_cents(item.unit_price_cents)
            .checked_multiply_quantity(item.quantity)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| too_large("total"))?;
    }

    let mut paid = Money::zero();
    for payment in &req.payments {
        paid = paid
            .checked_add(payment.amount())
            .ok_or_else(|| too_large("amount"))?;
    }

    if paid != total {
        return Err(ValidationError::AmountMismatch { total, paid });
    }

    Ok(total)
}

fn too_large(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
