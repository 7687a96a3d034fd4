//! # Credit Rules
//!
//! Store-credit due dates and limit checks.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale on 2026-03-10 ──► due 2026-03-15   (15th not passed yet)          │
//! │  Sale on 2026-03-15 ──► due 2026-03-15   (due today)                    │
//! │  Sale on 2026-03-20 ──► due 2026-04-15   (rolls to next month)          │
//! │  Sale on 2026-12-28 ──► due 2027-01-15   (rolls over the year)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::ClientStatus;
use crate::CREDIT_DUE_DAY;

/// Due date for credit taken on `today`.
pub fn due_date_for(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.day() > CREDIT_DUE_DAY {
        if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        }
    } else {
        (today.year(), today.month())
    };

    // The 15th exists in every month, so this only falls back on
    // out-of-range years.
    NaiveDate::from_ymd_opt(year, month, CREDIT_DUE_DAY).unwrap_or(today)
}

/// Checks whether a client may take `requested` more store credit.
///
/// ## Rules
/// - Debtor clients get no further credit
/// - `outstanding + requested` must not exceed `limit`
pub fn check_credit_limit(
    client_id: &str,
    status: ClientStatus,
    limit: Money,
    outstanding: Money,
    requested: Money,
) -> CoreResult<()> {
    if status == ClientStatus::Debtor {
        return Err(CoreError::ClientIsDebtor(client_id.to_string()));
    }

    if outstanding + requested > limit {
        return Err(CoreError::CreditLimitExceeded {
            client_id: client_id.to_string(),
            limit,
            outstanding,
            requested,
        });
    }

    Ok(())
}

/// Whether a pending account should be flagged overdue on `today`.
#[inline]
pub fn is_overdue(due_date: NaiveDate, outstanding: Money, today: NaiveDate) -> bool {
    due_date < today && outstanding.is_positive()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_for() {
        assert_eq!(due_date_for(date(2026, 3, 1)), date(2026, 3, 15));
        assert_eq!(due_date_for(date(2026, 3, 15)), date(2026, 3, 15));
        assert_eq!(due_date_for(date(2026, 3, 16)), date(2026, 4, 15));
        assert_eq!(due_date_for(date(2026, 12, 28)), date(2027, 1, 15));
        assert_eq!(due_date_for(date(2026, 1, 31)), date(2026, 2, 15));
    }

    #[test]
    fn test_credit_limit() {
        let ok = check_credit_limit(
            "c",
            ClientStatus::Active,
            Money::from_cents(50_000),
            Money::zero(),
            Money::from_cents(15_000),
        );
        assert!(ok.is_ok());

        // Exactly at the limit is allowed
        let at_limit = check_credit_limit(
            "c",
            ClientStatus::Active,
            Money::from_cents(20_000),
            Money::from_cents(15_000),
            Money::from_cents(5_000),
        );
        assert!(at_limit.is_ok());

        let over = check_credit_limit(
            "c",
            ClientStatus::Active,
            Money::from_cents(20_000),
            Money::from_cents(15_000),
            Money::from_cents(10_000),
        );
        assert!(matches!(over, Err(CoreError::CreditLimitExceeded { .. })));
    }

    #[test]
    fn test_debtor_rejected() {
        let result = check_credit_limit(
            "c-9",
            ClientStatus::Debtor,
            Money::from_cents(100_000),
            Money::zero(),
            Money::from_cents(1),
        );
        assert!(matches!(result, Err(CoreError::ClientIsDebtor(id)) if id == "c-9"));
    }

    #[test]
    fn test_is_overdue() {
        let due = date(2026, 3, 15);
        assert!(!is_overdue(due, Money::from_cents(100), date(2026, 3, 15)));
        assert!(is_overdue(due, Money::from_cents(100), date(2026, 3, 16)));
        assert!(!is_overdue(due, Money::zero(), date(2026, 4, 1)));
    }
}
