//! # Cash Reconciliation
//!
//! Totals for a cash session, computed from its movements.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  opening ──┐                                                            │
//! │            ├──► expected_final = opening + (Σ in − Σ out)               │
//! │  movements ┘                          │                                 │
//! │                                       ▼                                 │
//! │  closing (counted) ──► difference = closing − expected_final            │
//! │                        (only once the session is closed)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CashMovement, CashSession, MovementDirection};

/// Reconciliation totals for one session. All values in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashTotals {
    pub entries_in_cents: i64,
    pub entries_out_cents: i64,
    pub net_cents: i64,
    pub opening_cents: i64,
    pub expected_final_cents: i64,
    pub closing_cents: Option<i64>,
    /// Positive when the drawer holds more than expected.
    pub difference_cents: Option<i64>,
}

/// Computes the reconciliation totals for `session`.
pub fn cash_totals(session: &CashSession, movements: &[CashMovement]) -> CashTotals {
    let (entries_in, entries_out) = movements.iter().fold(
        (Money::zero(), Money::zero()),
        |(entries_in, entries_out), m| match m.direction {
            MovementDirection::In => (entries_in + m.amount(), entries_out),
            MovementDirection::Out => (entries_in, entries_out + m.amount()),
        },
    );

    let net = entries_in - entries_out;
    let opening = session.opening_balance();
    let expected_final = opening + net;
    let closing = session.closing_balance();

    CashTotals {
        entries_in_cents: entries_in.cents(),
        entries_out_cents: entries_out.cents(),
        net_cents: net.cents(),
        opening_cents: opening.cents(),
        expected_final_cents: expected_final.cents(),
        closing_cents: closing.map(|c| c.cents()),
        difference_cents: closing.map(|c| (c - expected_final).cents()),
    }
}

/// A session with its entries and totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashSessionDetail {
    pub session: CashSession,
    /// Newest first.
    pub movements: Vec<CashMovement>,
    pub totals: CashTotals,
}

impl CashSessionDetail {
    pub fn new(session: CashSession, movements: Vec<CashMovement>) -> Self {
        let totals = cash_totals(&session, &movements);
        CashSessionDetail {
            session,
            movements,
            totals,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn session(opening: i64, closing: Option<i64>) -> CashSession {
        CashSession {
            id: "s-1".to_string(),
            business_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            opened_at: Utc::now(),
            opening_balance_cents: opening,
            closing_balance_cents: closing,
            closed_at: closing.map(|_| Utc::now()),
            operator_id: "op".to_string(),
        }
    }

    fn movement(direction: MovementDirection, amount: i64) -> CashMovement {
        CashMovement {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: "s-1".to_string(),
            payment_id: None,
            direction,
            amount_cents: amount,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_session_totals() {
        let totals = cash_totals(
            &session(100_000, None),
            &[
                movement(MovementDirection::In, 25_000),
                movement(MovementDirection::In, 5_000),
                movement(MovementDirection::Out, 2_000),
            ],
        );

        assert_eq!(totals.entries_in_cents, 30_000);
        assert_eq!(totals.entries_out_cents, 2_000);
        assert_eq!(totals.net_cents, 28_000);
        assert_eq!(totals.expected_final_cents, 128_000);
        assert_eq!(totals.closing_cents, None);
        assert_eq!(totals.difference_cents, None);
    }

    #[test]
    fn test_closed_session_difference() {
        let totals = cash_totals(
            &session(100_000, Some(124_500)),
            &[movement(MovementDirection::In, 25_000)],
        );

        assert_eq!(totals.expected_final_cents, 125_000);
        assert_eq!(totals.difference_cents, Some(-500));
    }

    #[test]
    fn test_no_movements() {
        let detail = CashSessionDetail::new(session(0, Some(0)), Vec::new());
        assert_eq!(detail.totals.expected_final_cents, 0);
        assert_eq!(detail.totals.difference_cents, Some(0));
    }
}
