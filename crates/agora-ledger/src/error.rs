//! Error types for agora-ledger.
//!
//! Every error carries a stable numeric code (see [`LedgerError::code`])
//! that external callers match on. The codes are API: they never change
//! between releases.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by marketplace ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller is not the administrative identity.
    #[error("caller is not the marketplace administrator")]
    OwnerOnly,

    /// Caller is not the buyer/seller this operation belongs to.
    #[error("caller is not authorized for this resource")]
    NotAuthorized,

    /// Referenced product does not exist or is inactive.
    #[error("product not found: {id}")]
    ProductNotFound {
        /// Product id that was looked up.
        id: u64,
    },

    /// Referenced order does not exist.
    #[error("order not found: {id}")]
    OrderNotFound {
        /// Order id that was looked up.
        id: u64,
    },

    /// Payer cannot cover the required amount.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount required for the operation.
        required: agora_core::Amount,
        /// Payer's available balance.
        available: agora_core::Amount,
    },

    /// Operation is invalid for the order's current status.
    #[error("invalid status: order is {status}")]
    InvalidStatus {
        /// The order's current status, rendered for the caller.
        status: String,
    },

    /// A review already exists for this order.
    #[error("order {order_id} already reviewed")]
    AlreadyReviewed {
        /// Order id the duplicate review targeted.
        order_id: u64,
    },

    /// Rating outside the valid 1–5 range.
    #[error("invalid rating: {rating} is not in 1..=5")]
    InvalidRating {
        /// The rejected rating value.
        rating: u8,
    },

    /// Requested quantity exceeds available stock.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Units requested.
        requested: u64,
        /// Units in stock.
        available: u64,
    },

    /// Caller already has a seller profile.
    #[error("seller profile already exists")]
    ProfileAlreadyExists,

    /// Malformed input (zero price/quantity, oversize string or list).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Caller has no seller profile.
    #[error("seller profile required")]
    SellerProfileRequired,

    /// No dispute exists for the order.
    #[error("dispute not found for order {order_id}")]
    DisputeNotFound {
        /// Order id that was looked up.
        order_id: u64,
    },

    /// Dispute already resolved.
    #[error("dispute for order {order_id} already resolved")]
    AlreadyResolved {
        /// Order id of the resolved dispute.
        order_id: u64,
    },

    /// Escrow already holds a balance for the order.
    #[error("escrow already funded for order {order_id}")]
    EscrowAlreadyHeld {
        /// Order id whose escrow was double-funded.
        order_id: u64,
    },

    /// Escrow is empty or already released.
    #[error("no funds held in escrow for order {order_id}")]
    NothingHeld {
        /// Order id whose escrow was empty.
        order_id: u64,
    },

    /// Checked arithmetic failed.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}

impl LedgerError {
    /// Returns the stable numeric error code for this error.
    ///
    /// The codes are part of the public API and never change between
    /// releases; clients match on them rather than on display text.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::OwnerOnly => 100,
            Self::NotAuthorized => 101,
            Self::ProductNotFound { .. } => 102,
            Self::OrderNotFound { .. } => 103,
            Self::InsufficientFunds { .. } => 104,
            Self::InvalidStatus { .. } => 105,
            Self::AlreadyReviewed { .. } => 106,
            Self::InvalidRating { .. } => 107,
            Self::InsufficientInventory { .. } => 108,
            Self::ProfileAlreadyExists => 109,
            Self::InvalidInput(_) => 110,
            Self::SellerProfileRequired => 111,
            Self::DisputeNotFound { .. } => 112,
            Self::AlreadyResolved { .. } => 113,
            Self::EscrowAlreadyHeld { .. } => 114,
            Self::NothingHeld { .. } => 115,
            Self::ArithmeticOverflow(_) => 116,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::Amount;

    #[test]
    fn codes_are_stable() {
        assert_eq!(LedgerError::OwnerOnly.code(), 100);
        assert_eq!(LedgerError::NotAuthorized.code(), 101);
        assert_eq!(LedgerError::ProductNotFound { id: 9 }.code(), 102);
        assert_eq!(LedgerError::OrderNotFound { id: 9 }.code(), 103);
        assert_eq!(
            LedgerError::InsufficientFunds {
                required: Amount::from_micros(2),
                available: Amount::from_micros(1),
            }
            .code(),
            104
        );
        assert_eq!(
            LedgerError::InvalidStatus {
                status: "created".into()
            }
            .code(),
            105
        );
        assert_eq!(LedgerError::AlreadyReviewed { order_id: 1 }.code(), 106);
        assert_eq!(LedgerError::InvalidRating { rating: 6 }.code(), 107);
        assert_eq!(LedgerError::SellerProfileRequired.code(), 111);
    }

    #[test]
    fn extended_codes_are_distinct() {
        let codes = [
            LedgerError::InsufficientInventory {
                requested: 2,
                available: 1,
            }
            .code(),
            LedgerError::ProfileAlreadyExists.code(),
            LedgerError::InvalidInput("x".into()).code(),
            LedgerError::DisputeNotFound { order_id: 1 }.code(),
            LedgerError::AlreadyResolved { order_id: 1 }.code(),
            LedgerError::EscrowAlreadyHeld { order_id: 1 }.code(),
            LedgerError::NothingHeld { order_id: 1 }.code(),
            LedgerError::ArithmeticOverflow("test").code(),
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn display_names_the_failure() {
        let err = LedgerError::InsufficientFunds {
            required: Amount::from_tokens(10),
            available: Amount::from_tokens(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("3"));
    }
}
