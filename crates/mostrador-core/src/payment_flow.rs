//! # Payment Flow
//!
//! Cash-drawer effects of payment status transitions.
//!
//! ## Drawer Contribution Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Each status contributes to the drawer:                                 │
//! │                                                                         │
//! │     pending ──── 0        processed ── +amount                          │
//! │     cancelled ── 0        voided ───── 0 (the refund cancelled the in)  │
//! │                                                                         │
//! │  A transition old → new writes the difference as at most ONE entry:     │
//! │                                                                         │
//! │     delta = contribution(new) − contribution(old)                       │
//! │     delta > 0  →  one `in`  of delta                                    │
//! │     delta < 0  →  one `out` of |delta|                                  │
//! │     delta = 0  →  nothing                                               │
//! │                                                                         │
//! │  So replaying any sequence of transitions leaves the drawer holding     │
//! │  exactly contribution(final status).                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition between distinct states is allowed; only the cash
//! effect depends on the pair. Payments of type `credit_account` never
//! reach this function (they are state-only).
//!
//! This differs from a plain "entering voided writes `out`, leaving voided
//! writes `in`" rule on the unprocessed side: pending/cancelled → voided
//! writes nothing, and voided → pending/cancelled writes no `in`. Only
//! voided → processed collects the amount again.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{MovementDirection, PaymentStatus};

/// A drawer entry that a transition requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashEffect {
    pub direction: MovementDirection,
    /// Always positive.
    pub amount: Money,
}

/// How much of `amount` sits in the drawer while a payment is in `status`.
#[inline]
pub fn drawer_contribution(status: PaymentStatus, amount: Money) -> Money {
    match status {
        PaymentStatus::Processed => amount,
        PaymentStatus::Pending | PaymentStatus::Cancelled | PaymentStatus::Voided => Money::zero(),
    }
}

/// Returns the drawer entries needed to move a payment from `old` to `new`.
///
/// ## Example
/// ```rust
/// use mostrador_core::money::Money;
/// use mostrador_core::payment_flow::cash_effects;
/// use mostrador_core::{MovementDirection, PaymentStatus};
///
/// let effects = cash_effects(
///     PaymentStatus::Pending,
///     PaymentStatus::Processed,
///     Money::from_cents(2_500),
/// );
/// assert_eq!(effects[0].direction, MovementDirection::In);
/// assert!(cash_effects(PaymentStatus::Voided, PaymentStatus::Voided, Money::from_cents(1)).is_empty());
/// ```
pub fn cash_effects(old: PaymentStatus, new: PaymentStatus, amount: Money) -> Vec<CashEffect> {
    if old == new {
        return Vec::new();
    }

    let delta = drawer_contribution(new, amount) - drawer_contribution(old, amount);

    if delta.is_positive() {
        vec![CashEffect {
            direction: MovementDirection::In,
            amount: delta,
        }]
    } else if delta.is_negative() {
        vec![CashEffect {
            direction: MovementDirection::Out,
            amount: delta.abs(),
        }]
    } else {
        Vec::new()
    }
}

/// Description written on a compensating drawer entry.
pub fn transition_description(payment_id: &str, old: PaymentStatus, new: PaymentStatus) -> String {
    format!("Payment {} {} -> {}", payment_id, old.as_str(), new.as_str())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentStatus::*;

    const ALL: [PaymentStatus; 4] = [Pending, Processed, Cancelled, Voided];

    fn effect(old: PaymentStatus, new: PaymentStatus) -> Option<MovementDirection> {
        let effects = cash_effects(old, new, Money::from_cents(10_000));
        assert!(effects.len() <= 1);
        effects.first().map(|e| {
            assert_eq!(e.amount.cents(), 10_000);
            e.direction
        })
    }

    #[test]
    fn test_transition_table() {
        use MovementDirection::{In, Out};

        let table = [
            (Pending, Processed, Some(In)),
            (Cancelled, Processed, Some(In)),
            (Voided, Processed, Some(In)),
            (Processed, Voided, Some(Out)),
            (Processed, Pending, Some(Out)),
            (Processed, Cancelled, Some(Out)),
            (Pending, Cancelled, None),
            (Pending, Voided, None),
            (Cancelled, Pending, None),
            (Cancelled, Voided, None),
            (Voided, Pending, None),
            (Voided, Cancelled, None),
        ];

        for (old, new, expected) in table {
            assert_eq!(effect(old, new), expected, "{:?} -> {:?}", old, new);
        }
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in ALL {
            assert!(cash_effects(status, status, Money::from_cents(500)).is_empty());
        }
    }

    #[test]
    fn test_any_path_nets_to_final_contribution() {
        let amount = Money::from_cents(7_345);
        let path = [Pending, Processed, Voided, Processed, Cancelled, Processed, Voided];

        let mut drawer = drawer_contribution(path[0], amount);
        for pair in path.windows(2) {
            for e in cash_effects(pair[0], pair[1], amount) {
                match e.direction {
                    MovementDirection::In => drawer += e.amount,
                    MovementDirection::Out => drawer -= e.amount,
                }
            }
            assert_eq!(drawer, drawer_contribution(pair[1], amount));
        }
    }

    #[test]
    fn test_description() {
        assert_eq!(
            transition_description("p-1", Processed, Voided),
            "Payment p-1 processed -> voided"
        );
    }
}
