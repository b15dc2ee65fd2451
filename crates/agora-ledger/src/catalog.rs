//! Product catalog records.
//!
//! Products are never deleted; they are deactivated. Quantity moves
//! only through the checked [`Product::reserve`] / [`Product::restore`]
//! primitives, driven exclusively by the order state machine.

use agora_core::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::registry::check_len;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 64;
/// Maximum length of a product description.
pub const MAX_PRODUCT_DESCRIPTION_LEN: usize = 256;
/// Maximum number of image references per product.
pub const MAX_IMAGES: usize = 5;
/// Maximum length of a single image reference.
pub const MAX_IMAGE_URL_LEN: usize = 256;

/// A listed product owned by a seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Monotonic product id, assigned at listing time, never reused.
    pub id: u64,
    /// Owning seller's identity.
    pub seller: agora_core::Address,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Category identifier.
    pub category: u64,
    /// Unit price in micro-AGO.
    pub price: Amount,
    /// Units currently available for ordering.
    pub quantity: u64,
    /// Ordered image references, at most [`MAX_IMAGES`].
    pub images: Vec<String>,
    /// Flat shipping cost per order.
    pub shipping_cost: Amount,
    /// Digital goods skip physical shipment but keep the same lifecycle.
    pub digital: bool,
    /// Inactive products cannot be ordered.
    pub active: bool,
    /// Listing timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated listing input, checked before an id is allocated.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Category identifier.
    pub category: u64,
    /// Unit price; must be non-zero.
    pub price: Amount,
    /// Initial stock; must be non-zero.
    pub quantity: u64,
    /// Image references.
    pub images: Vec<String>,
    /// Flat shipping cost per order.
    pub shipping_cost: Amount,
    /// Whether the product is digital.
    pub digital: bool,
}

impl Listing {
    /// Validates the listing's fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero price or quantity, oversize
    /// strings, or too many/too long image references. Oversize input
    /// is rejected, never truncated.
    pub fn validate(&self) -> Result<()> {
        if self.price.is_zero() {
            return Err(LedgerError::InvalidInput("price must be non-zero".into()));
        }
        if self.quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "quantity must be non-zero".into(),
            ));
        }
        check_len("product name", &self.name, MAX_PRODUCT_NAME_LEN)?;
        check_len(
            "product description",
            &self.description,
            MAX_PRODUCT_DESCRIPTION_LEN,
        )?;
        if self.images.len() > MAX_IMAGES {
            return Err(LedgerError::InvalidInput(format!(
                "at most {MAX_IMAGES} images allowed"
            )));
        }
        for image in &self.images {
            check_len("image reference", image, MAX_IMAGE_URL_LEN)?;
        }
        Ok(())
    }
}

impl Product {
    /// Materializes a validated listing under the given id and seller.
    #[must_use]
    pub fn from_listing(id: u64, seller: agora_core::Address, listing: Listing) -> Self {
        Self {
            id,
            seller,
            name: listing.name,
            description: listing.description,
            category: listing.category,
            price: listing.price,
            quantity: listing.quantity,
            images: listing.images,
            shipping_cost: listing.shipping_cost,
            digital: listing.digital,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Reserves `quantity` units of stock against an order.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientInventory` if the decrement exceeds
    /// available stock. Stock never goes negative.
    pub fn reserve(&mut self, quantity: u64) -> Result<()> {
        let remaining = self.quantity.checked_sub(quantity).ok_or(
            LedgerError::InsufficientInventory {
                requested: quantity,
                available: self.quantity,
            },
        )?;
        self.quantity = remaining;
        Ok(())
    }

    /// Returns previously reserved units to stock (order cancelled).
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the increment would overflow.
    pub fn restore(&mut self, quantity: u64) -> Result<()> {
        self.quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or(LedgerError::ArithmeticOverflow("inventory restore"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::Wallet;

    fn listing() -> Listing {
        Listing {
            name: "iPhone 15 Pro".into(),
            description: "Latest iPhone with advanced features".into(),
            category: 1,
            price: Amount::from_micros(999_000_000),
            quantity: 10,
            images: vec!["https://example.com/iphone1.jpg".into()],
            shipping_cost: Amount::from_micros(50_000_000),
            digital: false,
        }
    }

    #[test]
    fn valid_listing_passes() {
        assert!(listing().validate().is_ok());
    }

    #[test]
    fn zero_price_rejected() {
        let mut l = listing();
        l.price = Amount::ZERO;
        assert!(matches!(l.validate(), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut l = listing();
        l.quantity = 0;
        assert!(matches!(l.validate(), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn too_many_images_rejected() {
        let mut l = listing();
        l.images = vec!["https://example.com/i.jpg".into(); MAX_IMAGES + 1];
        assert!(matches!(l.validate(), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn oversize_image_url_rejected() {
        let mut l = listing();
        l.images = vec!["x".repeat(MAX_IMAGE_URL_LEN + 1)];
        assert!(matches!(l.validate(), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn new_product_is_active() {
        let seller = Wallet::generate().expect("wallet").address().clone();
        let product = Product::from_listing(1, seller, listing());
        assert!(product.active);
        assert_eq!(product.id, 1);
        assert_eq!(product.quantity, 10);
    }

    #[test]
    fn reserve_decrements_stock() {
        let seller = Wallet::generate().expect("wallet").address().clone();
        let mut product = Product::from_listing(1, seller, listing());
        product.reserve(3).expect("reserve");
        assert_eq!(product.quantity, 7);
    }

    #[test]
    fn reserve_beyond_stock_fails_without_mutation() {
        let seller = Wallet::generate().expect("wallet").address().clone();
        let mut product = Product::from_listing(1, seller, listing());
        let result = product.reserve(11);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientInventory {
                requested: 11,
                available: 10
            })
        ));
        assert_eq!(product.quantity, 10);
    }

    #[test]
    fn restore_returns_reserved_units() {
        let seller = Wallet::generate().expect("wallet").address().clone();
        let mut product = Product::from_listing(1, seller, listing());
        product.reserve(4).expect("reserve");
        product.restore(4).expect("restore");
        assert_eq!(product.quantity, 10);
    }

    #[test]
    fn restore_overflow_detected() {
        let seller = Wallet::generate().expect("wallet").address().clone();
        let mut product = Product::from_listing(1, seller, listing());
        product.quantity = u64::MAX;
        assert!(matches!(
            product.restore(1),
            Err(LedgerError::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn product_serde_roundtrip() {
        let seller = Wallet::generate().expect("wallet").address().clone();
        let product = Product::from_listing(1, seller, listing());
        let json = serde_json::to_string(&product).expect("serialize");
        let restored: Product = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(product.id, restored.id);
        assert_eq!(product.price, restored.price);
        assert_eq!(product.images, restored.images);
    }
}
