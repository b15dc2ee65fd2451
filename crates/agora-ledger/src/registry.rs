//! Seller registry records.
//!
//! One profile per identity, created once and never deleted. Only two
//! things mutate a profile after creation: admin verification and
//! review ingestion (the rating aggregate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Maximum length of a store name.
pub const MAX_STORE_NAME_LEN: usize = 64;
/// Maximum length of a profile description.
pub const MAX_DESCRIPTION_LEN: usize = 256;
/// Maximum length of a contact string.
pub const MAX_CONTACT_LEN: usize = 64;
/// Maximum length of a location string.
pub const MAX_LOCATION_LEN: usize = 128;

/// A seller's profile and rating aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerProfile {
    /// Store display name.
    pub store_name: String,
    /// Store description.
    pub description: String,
    /// Contact information.
    pub contact: String,
    /// Physical or logical location.
    pub location: String,
    /// Set by the administrator, never by the seller.
    pub verified: bool,
    /// Sum of all review ratings received.
    pub rating_sum: u64,
    /// Number of reviews received.
    pub rating_count: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SellerProfile {
    /// Creates an unverified profile with an empty rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any field exceeds its bound.
    pub fn new(
        store_name: String,
        description: String,
        contact: String,
        location: String,
    ) -> Result<Self> {
        check_len("store name", &store_name, MAX_STORE_NAME_LEN)?;
        check_len("description", &description, MAX_DESCRIPTION_LEN)?;
        check_len("contact", &contact, MAX_CONTACT_LEN)?;
        check_len("location", &location, MAX_LOCATION_LEN)?;

        Ok(Self {
            store_name,
            description,
            contact,
            location,
            verified: false,
            rating_sum: 0,
            rating_count: 0,
            created_at: Utc::now(),
        })
    }

    /// Folds one review rating into the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if either counter would overflow.
    pub fn record_rating(&mut self, rating: u8) -> Result<()> {
        let sum = self
            .rating_sum
            .checked_add(u64::from(rating))
            .ok_or(LedgerError::ArithmeticOverflow("rating sum"))?;
        let count = self
            .rating_count
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow("rating count"))?;
        self.rating_sum = sum;
        self.rating_count = count;
        Ok(())
    }

    /// Average rating over all reviews; `None` before the first review.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        }
    }
}

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(LedgerError::InvalidInput(format!(
            "{field} exceeds {max} bytes"
        )));
    }
    Ok(())
}
