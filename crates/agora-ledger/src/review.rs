//! Review records, one per delivered order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::registry::check_len;

/// Maximum length of a review comment.
pub const MAX_COMMENT_LEN: usize = 512;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// A buyer's review of a delivered order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// The reviewed order; at most one review per order.
    pub order_id: u64,
    /// The product the order was for.
    pub product_id: u64,
    /// The reviewing buyer.
    pub buyer: agora_core::Address,
    /// Star rating in [1, 5].
    pub rating: u8,
    /// Free-text comment.
    pub comment: String,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validates a rating value before any state is touched.
///
/// # Errors
///
/// Returns `InvalidRating` for anything outside [1, 5].
pub const fn validate_rating(rating: u8) -> Result<()> {
    if rating < MIN_RATING || rating > MAX_RATING {
        return Err(LedgerError::InvalidRating { rating });
    }
    Ok(())
}

impl Review {
    /// Creates a review after validating the rating and comment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRating` or `InvalidInput` before constructing
    /// anything.
    pub fn new(
        order_id: u64,
        product_id: u64,
        buyer: agora_core::Address,
        rating: u8,
        comment: String,
    ) -> Result<Self> {
        validate_rating(rating)?;
        check_len("review comment", &comment, MAX_COMMENT_LEN)?;

        Ok(Self {
            order_id,
            product_id,
            buyer,
            rating,
            comment,
            created_at: Utc::now(),
        })
    }
}
