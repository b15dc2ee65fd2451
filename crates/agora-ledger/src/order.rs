//! Order lifecycle and cost model.
//!
//! The order status graph:
//!
//! ```text
//! Created ──▶ Paid ──▶ Shipped ──▶ Delivered ──▶ Reviewed
//!    │          │          │            │
//!    ▼          └──────────┴────────────┴──▶ Disputed ──▶ Resolved
//! Cancelled
//! ```
//!
//! Transitions are monotonic; anything off this graph is rejected with
//! the order untouched.

use agora_core::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::registry::check_len;

/// Maximum length of a shipping address.
pub const MAX_SHIPPING_ADDRESS_LEN: usize = 256;
/// Maximum length of a tracking reference.
pub const MAX_TRACKING_LEN: usize = 64;

/// Platform fee numerator: the marketplace takes 2.5% of the base cost.
pub const PLATFORM_FEE_NUM: u64 = 25;
/// Platform fee denominator.
pub const PLATFORM_FEE_DEN: u64 = 1000;

/// The lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, inventory reserved, nothing paid yet.
    Created,
    /// Total cost held in escrow.
    Paid,
    /// Seller shipped with a tracking reference.
    Shipped,
    /// Buyer confirmed receipt; escrow settled to the seller.
    Delivered,
    /// Buyer left a review after delivery.
    Reviewed,
    /// Cancelled before payment; inventory restored.
    Cancelled,
    /// Under administrative arbitration.
    Disputed,
    /// Arbitration concluded; escrow fully disbursed.
    Resolved,
}

impl OrderStatus {
    /// Checks whether a transition to `target` is on the status graph.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        use OrderStatus::{
            Cancelled, Created, Delivered, Disputed, Paid, Resolved, Reviewed, Shipped,
        };

        matches!(
            (self, target),
            (Created, Paid | Cancelled)
                | (Paid, Shipped | Disputed)
                | (Shipped, Delivered | Disputed)
                | (Delivered, Reviewed | Disputed)
                | (Disputed, Resolved)
        )
    }

    /// True once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Resolved | Self::Reviewed)
    }

    /// True while the buyer may open a dispute.
    #[must_use]
    pub const fn is_disputable(self) -> bool {
        matches!(self, Self::Paid | Self::Shipped | Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Reviewed => "reviewed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
            Self::Resolved => "resolved",
        };
        write!(f, "{name}")
    }
}

/// The cost breakdown of an order, computed once at creation.
///
/// Invariant: `total = base + platform_fee + shipping`, all checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCost {
    /// Unit price times quantity.
    pub base: Amount,
    /// Marketplace fee: `floor(base * 25 / 1000)`.
    pub platform_fee: Amount,
    /// Flat shipping cost from the product listing.
    pub shipping: Amount,
    /// Sum of the three components.
    pub total: Amount,
}

impl OrderCost {
    /// Computes the cost of `quantity` units at `price` plus `shipping`.
    ///
    /// The platform fee is 2.5% of the base cost with **floor** rounding
    /// (fixed-point `base * 25 / 1000` over `u128` intermediates); any
    /// sub-micro remainder stays with the buyer, never the treasury.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if any component exceeds `u64`.
    pub fn calculate(price: Amount, quantity: u64, shipping: Amount) -> Result<Self> {
        let base = price
            .checked_mul(quantity)
            .ok_or(LedgerError::ArithmeticOverflow("base cost"))?;

        // u128 keeps base * 25 exact before the floor division.
        let fee_micros = u128::from(base.as_micros()) * u128::from(PLATFORM_FEE_NUM)
            / u128::from(PLATFORM_FEE_DEN);
        let platform_fee = Amount::from_micros(
            u64::try_from(fee_micros)
                .map_err(|_| LedgerError::ArithmeticOverflow("platform fee"))?,
        );

        let total = base
            .checked_add(platform_fee)
            .and_then(|t| t.checked_add(shipping))
            .ok_or(LedgerError::ArithmeticOverflow("total cost"))?;

        Ok(Self {
            base,
            platform_fee,
            shipping,
            total,
        })
    }

    /// The seller's settlement share: everything except the platform fee.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the addition overflows (cannot
    /// happen for a cost built by [`OrderCost::calculate`]).
    pub fn seller_share(&self) -> Result<Amount> {
        self.base
            .checked_add(self.shipping)
            .ok_or(LedgerError::ArithmeticOverflow("seller share"))
    }
}

/// A buyer's order against a single product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Monotonic order id, assigned at creation, never reused.
    pub id: u64,
    /// Ordered product.
    pub product_id: u64,
    /// Buyer's identity.
    pub buyer: agora_core::Address,
    /// Seller's identity, copied from the product at creation.
    pub seller: agora_core::Address,
    /// Units ordered.
    pub quantity: u64,
    /// Delivery address.
    pub shipping_address: String,
    /// Immutable cost breakdown.
    pub cost: OrderCost,
    /// Current lifecycle state.
    pub status: OrderStatus,
    /// Tracking reference, set at shipment.
    pub tracking: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Payment timestamp.
    pub paid_at: Option<DateTime<Utc>>,
    /// Shipment timestamp.
    pub shipped_at: Option<DateTime<Utc>>,
    /// Delivery-confirmation timestamp.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates an order in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero quantity or an oversize
    /// shipping address.
    pub fn new(
        id: u64,
        product_id: u64,
        buyer: agora_core::Address,
        seller: agora_core::Address,
        quantity: u64,
        shipping_address: String,
        cost: OrderCost,
    ) -> Result<Self> {
        if quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "quantity must be non-zero".into(),
            ));
        }
        check_len("shipping address", &shipping_address, MAX_SHIPPING_ADDRESS_LEN)?;

        Ok(Self {
            id,
            product_id,
            buyer,
            seller,
            quantity,
            shipping_address,
            cost,
            status: OrderStatus::Created,
            tracking: None,
            created_at: Utc::now(),
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
        })
    }

    /// Moves the order to `target`, or fails leaving it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` if the transition is off the graph.
    pub fn transition_to(&mut self, target: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(LedgerError::InvalidStatus {
                status: self.status.to_string(),
            });
        }
        self.status = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::Wallet;
    use proptest::prelude::*;

    fn addresses() -> (agora_core::Address, agora_core::Address) {
        let buyer = Wallet::generate().expect("wallet").address().clone();
        let seller = Wallet::generate().expect("wallet").address().clone();
        (buyer, seller)
    }

    fn order() -> Order {
        let (buyer, seller) = addresses();
        let cost = OrderCost::calculate(
            Amount::from_micros(1_000_000_000),
            2,
            Amount::from_micros(50_000_000),
        )
        .expect("cost");
        Order::new(1, 1, buyer, seller, 2, "123 Main St".into(), cost).expect("order")
    }

    #[test]
    fn cost_breakdown_matches_formula() {
        // 2 × 1000 AGO base, 2.5% fee, 50 AGO shipping.
        let cost = OrderCost::calculate(
            Amount::from_micros(1_000_000_000),
            2,
            Amount::from_micros(50_000_000),
        )
        .expect("cost");

        assert_eq!(cost.base.as_micros(), 2_000_000_000);
        assert_eq!(cost.platform_fee.as_micros(), 50_000_000);
        assert_eq!(cost.shipping.as_micros(), 50_000_000);
        assert_eq!(cost.total.as_micros(), 2_100_000_000);
    }

    #[test]
    fn fee_rounds_down() {
        // base = 39 micros → fee = floor(39 * 25 / 1000) = 0
        let cost =
            OrderCost::calculate(Amount::from_micros(39), 1, Amount::ZERO).expect("cost");
        assert_eq!(cost.platform_fee, Amount::ZERO);

        // base = 41 micros → fee = floor(1.025) = 1
        let cost =
            OrderCost::calculate(Amount::from_micros(41), 1, Amount::ZERO).expect("cost");
        assert_eq!(cost.platform_fee.as_micros(), 1);
    }

    #[test]
    fn cost_overflow_detected() {
        let result = OrderCost::calculate(Amount::MAX, 2, Amount::ZERO);
        assert!(matches!(result, Err(LedgerError::ArithmeticOverflow(_))));

        let result = OrderCost::calculate(Amount::MAX, 1, Amount::MAX);
        assert!(matches!(result, Err(LedgerError::ArithmeticOverflow(_))));
    }

    #[test]
    fn seller_share_excludes_fee() {
        let cost = OrderCost::calculate(
            Amount::from_micros(999_000_000),
            1,
            Amount::from_micros(50_000_000),
        )
        .expect("cost");
        assert_eq!(cost.seller_share().expect("share").as_micros(), 1_049_000_000);
        assert_eq!(
            cost.seller_share()
                .expect("share")
                .checked_add(cost.platform_fee),
            Some(cost.total)
        );
    }

    #[test]
    fn happy_path_transitions() {
        let mut o = order();
        for target in [
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Reviewed,
        ] {
            o.transition_to(target).expect("transition");
            assert_eq!(o.status, target);
        }
        assert!(o.status.is_terminal());
    }

    #[test]
    fn cancel_only_from_created() {
        let mut o = order();
        o.transition_to(OrderStatus::Paid).expect("pay");
        let result = o.transition_to(OrderStatus::Cancelled);
        assert!(matches!(result, Err(LedgerError::InvalidStatus { .. })));
        assert_eq!(o.status, OrderStatus::Paid);
    }

    #[test]
    fn dispute_from_paid_shipped_delivered_only() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Disputed));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Disputed));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Disputed));

        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Disputed));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Disputed));
        assert!(!OrderStatus::Reviewed.can_transition_to(OrderStatus::Disputed));
        assert!(!OrderStatus::Resolved.can_transition_to(OrderStatus::Disputed));
    }

    #[test]
    fn no_transitions_out_of_terminal_states() {
        let all = [
            OrderStatus::Created,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Reviewed,
            OrderStatus::Cancelled,
            OrderStatus::Disputed,
            OrderStatus::Resolved,
        ];
        for target in all {
            assert!(!OrderStatus::Cancelled.can_transition_to(target));
            assert!(!OrderStatus::Resolved.can_transition_to(target));
            assert!(!OrderStatus::Reviewed.can_transition_to(target));
        }
    }

    #[test]
    fn skipping_states_rejected() {
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Created.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Reviewed));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn zero_quantity_order_rejected() {
        let (buyer, seller) = addresses();
        let cost = OrderCost::calculate(Amount::from_micros(100), 1, Amount::ZERO)
            .expect("cost");
        let result = Order::new(1, 1, buyer, seller, 0, "addr".into(), cost);
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn oversize_shipping_address_rejected() {
        let (buyer, seller) = addresses();
        let cost = OrderCost::calculate(Amount::from_micros(100), 1, Amount::ZERO)
            .expect("cost");
        let long = "x".repeat(MAX_SHIPPING_ADDRESS_LEN + 1);
        let result = Order::new(1, 1, buyer, seller, 1, long, cost);
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn order_serde_roundtrip() {
        let o = order();
        let json = serde_json::to_string(&o).expect("serialize");
        let restored: Order = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(o.id, restored.id);
        assert_eq!(o.status, restored.status);
        assert_eq!(o.cost, restored.cost);
    }

    proptest! {
        // Cost breakdown invariants over the whole practical input domain.
        #[test]
        fn cost_invariant_holds(
            price in 1u64..=10_000_000_000_000,
            quantity in 1u64..=10_000,
            shipping in 0u64..=1_000_000_000_000,
        ) {
            let cost = OrderCost::calculate(
                Amount::from_micros(price),
                quantity,
                Amount::from_micros(shipping),
            ).unwrap();

            let base = u128::from(price) * u128::from(quantity);
            prop_assert_eq!(u128::from(cost.base.as_micros()), base);
            prop_assert_eq!(
                u128::from(cost.platform_fee.as_micros()),
                base * 25 / 1000
            );
            prop_assert_eq!(
                cost.total.as_micros(),
                cost.base.as_micros()
                    + cost.platform_fee.as_micros()
                    + cost.shipping.as_micros()
            );
            // Settlement conserves every unit.
            prop_assert_eq!(
                cost.seller_share().unwrap().checked_add(cost.platform_fee),
                Some(cost.total)
            );
        }
    }
}
