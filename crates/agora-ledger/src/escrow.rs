//! Per-order escrow accounts.
//!
//! The escrow ledger is the single custodian of in-flight funds. An
//! account is funded exactly once at payment and released exactly once
//! at settlement — full release, refund, or a dispute split. These
//! primitives are called only by the order state machine and dispute
//! resolver, never by end users.

use agora_core::Amount;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Funds held by the ledger on behalf of one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// The order this escrow backs.
    pub order_id: u64,
    /// Currently held balance.
    pub balance: Amount,
    /// Set once the balance has been disbursed; accounts are never
    /// funded a second time.
    pub released: bool,
}

impl EscrowAccount {
    /// Creates an empty, unreleased account for an order.
    #[must_use]
    pub const fn new(order_id: u64) -> Self {
        Self {
            order_id,
            balance: Amount::ZERO,
            released: false,
        }
    }

    /// Deposits `amount` into the account.
    ///
    /// # Errors
    ///
    /// Returns `EscrowAlreadyHeld` if the account already holds funds
    /// or was already released.
    pub fn hold(&mut self, amount: Amount) -> Result<()> {
        if !self.balance.is_zero() || self.released {
            return Err(LedgerError::EscrowAlreadyHeld {
                order_id: self.order_id,
            });
        }
        self.balance = amount;
        Ok(())
    }

    /// Withdraws the entire balance and marks the account released.
    ///
    /// # Errors
    ///
    /// Returns `NothingHeld` if the balance is zero or the account was
    /// already released.
    pub fn take(&mut self) -> Result<Amount> {
        if self.balance.is_zero() || self.released {
            return Err(LedgerError::NothingHeld {
                order_id: self.order_id,
            });
        }
        let held = self.balance;
        self.balance = Amount::ZERO;
        self.released = true;
        Ok(held)
    }

    /// Withdraws the balance as two shares that must sum to it exactly.
    ///
    /// Used by dispute resolution; no unit may be lost or duplicated.
    ///
    /// # Errors
    ///
    /// Returns `NothingHeld` for an empty/released account and
    /// `ArithmeticOverflow` if the shares do not reconstruct the
    /// balance under checked addition.
    pub fn split(&mut self, first: Amount, second: Amount) -> Result<(Amount, Amount)> {
        if self.balance.is_zero() || self.released {
            return Err(LedgerError::NothingHeld {
                order_id: self.order_id,
            });
        }
        let sum = first
            .checked_add(second)
            .ok_or(LedgerError::ArithmeticOverflow("escrow split"))?;
        if sum != self.balance {
            return Err(LedgerError::ArithmeticOverflow("escrow split"));
        }
        self.balance = Amount::ZERO;
        self.released = true;
        Ok((first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hold_then_take_moves_full_balance() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(500)).expect("hold");
        assert_eq!(escrow.balance.as_micros(), 500);

        let taken = escrow.take().expect("take");
        assert_eq!(taken.as_micros(), 500);
        assert!(escrow.balance.is_zero());
        assert!(escrow.released);
    }

    #[test]
    fn double_hold_rejected() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(500)).expect("hold");
        let result = escrow.hold(Amount::from_micros(500));
        assert!(matches!(
            result,
            Err(LedgerError::EscrowAlreadyHeld { order_id: 1 })
        ));
        assert_eq!(escrow.balance.as_micros(), 500);
    }

    #[test]
    fn hold_after_release_rejected() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(500)).expect("hold");
        escrow.take().expect("take");
        let result = escrow.hold(Amount::from_micros(500));
        assert!(matches!(result, Err(LedgerError::EscrowAlreadyHeld { .. })));
    }

    #[test]
    fn take_empty_account_rejected() {
        let mut escrow = EscrowAccount::new(7);
        let result = escrow.take();
        assert!(matches!(result, Err(LedgerError::NothingHeld { order_id: 7 })));
    }

    #[test]
    fn double_take_rejected() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(500)).expect("hold");
        escrow.take().expect("take");
        assert!(matches!(escrow.take(), Err(LedgerError::NothingHeld { .. })));
    }

    #[test]
    fn split_requires_exact_sum() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(1000)).expect("hold");

        let short = escrow.split(Amount::from_micros(400), Amount::from_micros(599));
        assert!(matches!(short, Err(LedgerError::ArithmeticOverflow(_))));
        // Failed split leaves the balance intact.
        assert_eq!(escrow.balance.as_micros(), 1000);

        let (a, b) = escrow
            .split(Amount::from_micros(400), Amount::from_micros(600))
            .expect("split");
        assert_eq!(a.as_micros(), 400);
        assert_eq!(b.as_micros(), 600);
        assert!(escrow.released);
    }

    #[test]
    fn split_overflowing_shares_rejected() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(1000)).expect("hold");
        let result = escrow.split(Amount::MAX, Amount::MAX);
        assert!(matches!(result, Err(LedgerError::ArithmeticOverflow(_))));
        assert_eq!(escrow.balance.as_micros(), 1000);
    }

    #[test]
    fn split_after_release_rejected() {
        let mut escrow = EscrowAccount::new(1);
        escrow.hold(Amount::from_micros(1000)).expect("hold");
        escrow.take().expect("take");
        let result = escrow.split(Amount::from_micros(500), Amount::from_micros(500));
        assert!(matches!(result, Err(LedgerError::NothingHeld { .. })));
    }

    proptest! {
        // Any exact split conserves the held balance to the micro.
        #[test]
        fn split_conserves_balance(held in 1u64..=u64::MAX, cut in 0u64..=u64::MAX) {
            let first = cut % held;
            let second = held - first;

            let mut escrow = EscrowAccount::new(1);
            escrow.hold(Amount::from_micros(held)).unwrap();
            let (a, b) = escrow
                .split(Amount::from_micros(first), Amount::from_micros(second))
                .unwrap();
            prop_assert_eq!(a.as_micros() + b.as_micros(), held);
            prop_assert!(escrow.released);
        }
    }
}
