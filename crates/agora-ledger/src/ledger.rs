//! The marketplace ledger.
//!
//! [`Marketplace`] owns all shared state — seller registry, product
//! catalog, orders, escrow accounts, disputes, reviews, and available
//! balances — behind a single async mutex. Each public operation locks
//! the state, validates every precondition, and only then commits its
//! mutations, so a call's effects are all-or-nothing and calls are
//! serialized with respect to each other.
//!
//! Every mutating operation takes the caller's [`Address`] explicitly;
//! there is no ambient identity.

use std::collections::HashMap;
use std::sync::Arc;

use agora_core::{Address, Amount};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::catalog::{Listing, Product};
use crate::dispute::{Dispute, MAX_RESOLUTION_LEN};
use crate::error::{LedgerError, Result};
use crate::escrow::EscrowAccount;
use crate::order::{Order, OrderCost, OrderStatus, MAX_TRACKING_LEN};
use crate::registry::{check_len, SellerProfile};
use crate::review::{validate_rating, Review};

/// Deployment-time configuration for a [`Marketplace`].
///
/// The administrative identity doubles as the treasury: platform fees
/// settle to it.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// The single privileged identity for verification and arbitration.
    pub admin: Address,
}

/// All ledger state, guarded by one mutex.
#[derive(Debug)]
struct LedgerState {
    balances: HashMap<Address, Amount>,
    sellers: HashMap<Address, SellerProfile>,
    products: HashMap<u64, Product>,
    orders: HashMap<u64, Order>,
    escrows: HashMap<u64, EscrowAccount>,
    disputes: HashMap<u64, Dispute>,
    reviews: HashMap<u64, Review>,
    next_product_id: u64,
    next_order_id: u64,
}

impl LedgerState {
    fn new() -> Self {
        Self {
            balances: HashMap::new(),
            sellers: HashMap::new(),
            products: HashMap::new(),
            orders: HashMap::new(),
            escrows: HashMap::new(),
            disputes: HashMap::new(),
            reviews: HashMap::new(),
            // Ids start at 1 and are never reused.
            next_product_id: 1,
            next_order_id: 1,
        }
    }
}

/// The marketplace ledger and its public operations.
pub struct Marketplace {
    config: MarketConfig,
    state: Arc<Mutex<LedgerState>>,
}

impl Marketplace {
    /// Creates an empty marketplace with the given configuration.
    #[must_use]
    pub fn new(config: MarketConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(LedgerState::new())),
        }
    }

    /// The administrative/treasury identity.
    #[must_use]
    pub fn admin(&self) -> &Address {
        &self.config.admin
    }

    // ------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------

    /// Credits `amount` to an account's available balance.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the balance would overflow.
    pub async fn credit(&self, address: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        let balance = state.balances.entry(address.clone()).or_insert(Amount::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow("balance credit"))?;

        debug!(address = %address, amount = %amount, "balance credited");
        Ok(())
    }

    /// Returns an account's available balance (zero if never seen).
    pub async fn balance_of(&self, address: &Address) -> Amount {
        let state = self.state.lock().await;
        state.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    // ------------------------------------------------------------------
    // Seller registry
    // ------------------------------------------------------------------

    /// Creates the caller's seller profile.
    ///
    /// # Errors
    ///
    /// `ProfileAlreadyExists` if the caller already registered, or
    /// `InvalidInput` for oversize fields.
    pub async fn create_seller_profile(
        &self,
        caller: &Address,
        store_name: String,
        description: String,
        contact: String,
        location: String,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.sellers.contains_key(caller) {
            return Err(LedgerError::ProfileAlreadyExists);
        }
        let profile = SellerProfile::new(store_name, description, contact, location)?;
        state.sellers.insert(caller.clone(), profile);

        info!(seller = %caller, "seller profile created");
        Ok(())
    }

    /// Marks a seller as verified. Admin-only; idempotent.
    ///
    /// # Errors
    ///
    /// `OwnerOnly` for a non-admin caller, `SellerProfileRequired` if
    /// the target has no profile.
    pub async fn verify_seller(&self, caller: &Address, seller: &Address) -> Result<()> {
        if caller != &self.config.admin {
            return Err(LedgerError::OwnerOnly);
        }
        let mut state = self.state.lock().await;
        let profile = state
            .sellers
            .get_mut(seller)
            .ok_or(LedgerError::SellerProfileRequired)?;
        profile.verified = true;

        info!(seller = %seller, "seller verified");
        Ok(())
    }

    /// Returns a seller's profile, if registered.
    pub async fn get_seller_profile(&self, seller: &Address) -> Option<SellerProfile> {
        let state = self.state.lock().await;
        state.sellers.get(seller).cloned()
    }

    /// Returns a seller's average rating; `None` before the first review.
    pub async fn get_seller_rating(&self, seller: &Address) -> Option<f64> {
        let state = self.state.lock().await;
        state.sellers.get(seller).and_then(SellerProfile::average_rating)
    }

    // ------------------------------------------------------------------
    // Product catalog
    // ------------------------------------------------------------------

    /// Lists a product for the calling seller and returns its id.
    ///
    /// # Errors
    ///
    /// `SellerProfileRequired` without a profile; `InvalidInput` for a
    /// zero price/quantity or oversize fields.
    pub async fn list_product(&self, caller: &Address, listing: Listing) -> Result<u64> {
        let mut state = self.state.lock().await;
        if !state.sellers.contains_key(caller) {
            return Err(LedgerError::SellerProfileRequired);
        }
        listing.validate()?;

        let id = state.next_product_id;
        state.next_product_id += 1;
        let product = Product::from_listing(id, caller.clone(), listing);
        state.products.insert(id, product);

        info!(product_id = id, seller = %caller, "product listed");
        Ok(id)
    }

    /// Returns a product record, if it exists.
    pub async fn get_product(&self, product_id: u64) -> Option<Product> {
        let state = self.state.lock().await;
        state.products.get(&product_id).cloned()
    }

    /// The id the next listed product will receive.
    pub async fn get_next_product_id(&self) -> u64 {
        let state = self.state.lock().await;
        state.next_product_id
    }

    /// Takes a product off the market. Seller-only; the record stays.
    ///
    /// # Errors
    ///
    /// `ProductNotFound` if unknown, `NotAuthorized` for a non-owner.
    pub async fn deactivate_product(&self, caller: &Address, product_id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(LedgerError::ProductNotFound { id: product_id })?;
        if &product.seller != caller {
            return Err(LedgerError::NotAuthorized);
        }
        product.active = false;

        info!(product_id, seller = %caller, "product deactivated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Order lifecycle
    // ------------------------------------------------------------------

    /// Creates an order, reserving inventory immediately, and returns
    /// the new order id.
    ///
    /// Inventory is reserved at creation time, not at payment time
    /// (reserve-on-order policy).
    ///
    /// # Errors
    ///
    /// `ProductNotFound` for an unknown or inactive product,
    /// `InvalidInput` for a zero quantity or oversize address,
    /// `InsufficientInventory` if stock cannot cover the quantity.
    pub async fn create_order(
        &self,
        caller: &Address,
        product_id: u64,
        quantity: u64,
        shipping_address: String,
    ) -> Result<u64> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get(&product_id)
            .filter(|p| p.active)
            .ok_or(LedgerError::ProductNotFound { id: product_id })?;

        let cost = OrderCost::calculate(product.price, quantity, product.shipping_cost)?;
        let seller = product.seller.clone();
        if product.quantity < quantity {
            return Err(LedgerError::InsufficientInventory {
                requested: quantity,
                available: product.quantity,
            });
        }

        let id = state.next_order_id;
        let order = Order::new(
            id,
            product_id,
            caller.clone(),
            seller,
            quantity,
            shipping_address,
            cost,
        )?;

        // All checks passed; commit the reservation and the order.
        state.next_order_id += 1;
        state
            .products
            .get_mut(&product_id)
            .ok_or(LedgerError::ProductNotFound { id: product_id })?
            .reserve(quantity)?;
        state.orders.insert(id, order);

        info!(
            order_id = id,
            product_id,
            buyer = %caller,
            quantity,
            total = %cost.total,
            "order created"
        );
        Ok(id)
    }

    /// Pure cost preview for `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// `ProductNotFound` for an unknown or inactive product, or an
    /// arithmetic error from the cost formula.
    pub async fn calculate_order_cost(&self, product_id: u64, quantity: u64) -> Result<OrderCost> {
        let state = self.state.lock().await;
        let product = state
            .products
            .get(&product_id)
            .filter(|p| p.active)
            .ok_or(LedgerError::ProductNotFound { id: product_id })?;
        OrderCost::calculate(product.price, quantity, product.shipping_cost)
    }

    /// Pays for an order, moving its total cost into escrow.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `NotAuthorized` for a non-buyer,
    /// `InvalidStatus` outside `Created`, `EscrowAlreadyHeld` on a
    /// double payment, `InsufficientFunds` if the buyer cannot cover
    /// the total.
    pub async fn pay_order(&self, caller: &Address, order_id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        if &order.buyer != caller {
            return Err(LedgerError::NotAuthorized);
        }
        if !order.status.can_transition_to(OrderStatus::Paid) {
            return Err(LedgerError::InvalidStatus {
                status: order.status.to_string(),
            });
        }

        let escrow = state
            .escrows
            .entry(order_id)
            .or_insert_with(|| EscrowAccount::new(order_id));
        if !escrow.balance.is_zero() || escrow.released {
            return Err(LedgerError::EscrowAlreadyHeld { order_id });
        }

        let total = order.cost.total;
        let available = state.balances.get(caller).copied().unwrap_or(Amount::ZERO);
        let remaining = available
            .checked_sub(total)
            .ok_or(LedgerError::InsufficientFunds {
                required: total,
                available,
            })?;

        // Commit: debit buyer, fund escrow, advance the order.
        state.balances.insert(caller.clone(), remaining);
        escrow.hold(total)?;
        order.transition_to(OrderStatus::Paid)?;
        order.paid_at = Some(Utc::now());

        info!(order_id, buyer = %caller, total = %total, "order paid into escrow");
        Ok(())
    }

    /// Marks an order shipped with a tracking reference. Seller-only.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `NotAuthorized` for a non-seller,
    /// `InvalidInput` for an oversize tracking string, `InvalidStatus`
    /// outside `Paid`.
    pub async fn ship_order(
        &self,
        caller: &Address,
        order_id: u64,
        tracking: String,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        if &order.seller != caller {
            return Err(LedgerError::NotAuthorized);
        }
        check_len("tracking reference", &tracking, MAX_TRACKING_LEN)?;
        order.transition_to(OrderStatus::Shipped)?;
        order.tracking = Some(tracking);
        order.shipped_at = Some(Utc::now());

        info!(order_id, seller = %caller, "order shipped");
        Ok(())
    }

    /// Confirms delivery and settles the escrow. Buyer-only.
    ///
    /// The seller receives base + shipping; the platform fee settles to
    /// the admin/treasury identity. Every micro of the held balance is
    /// disbursed.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `NotAuthorized` for a non-buyer,
    /// `InvalidStatus` outside `Shipped`, `NothingHeld` if the escrow
    /// was never funded.
    pub async fn confirm_delivery(&self, caller: &Address, order_id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        if &order.buyer != caller {
            return Err(LedgerError::NotAuthorized);
        }
        if !order.status.can_transition_to(OrderStatus::Delivered) {
            return Err(LedgerError::InvalidStatus {
                status: order.status.to_string(),
            });
        }

        let escrow = state
            .escrows
            .get_mut(&order_id)
            .ok_or(LedgerError::NothingHeld { order_id })?;

        let seller_share = order.cost.seller_share()?;
        let fee = order.cost.platform_fee;
        let seller = order.seller.clone();

        // Validate both credits before touching the escrow so a failed
        // credit cannot strand a half-settled account.
        let seller_new = state
            .balances
            .get(&seller)
            .copied()
            .unwrap_or(Amount::ZERO)
            .checked_add(seller_share)
            .ok_or(LedgerError::ArithmeticOverflow("seller settlement"))?;
        let admin_new = state
            .balances
            .get(&self.config.admin)
            .copied()
            .unwrap_or(Amount::ZERO)
            .checked_add(fee)
            .ok_or(LedgerError::ArithmeticOverflow("fee settlement"))?;

        let (to_seller, to_treasury) = escrow.split(seller_share, fee)?;
        state.balances.insert(seller.clone(), seller_new);
        state.balances.insert(self.config.admin.clone(), admin_new);
        order.transition_to(OrderStatus::Delivered)?;
        order.delivered_at = Some(Utc::now());

        info!(
            order_id,
            seller = %seller,
            payout = %to_seller,
            fee = %to_treasury,
            "delivery confirmed, escrow settled"
        );
        Ok(())
    }

    /// Cancels an unpaid order and restores its reserved inventory.
    /// Buyer-only.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `NotAuthorized` for a non-buyer,
    /// `InvalidStatus` once the order left `Created`.
    pub async fn cancel_order(&self, caller: &Address, order_id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        if &order.buyer != caller {
            return Err(LedgerError::NotAuthorized);
        }
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(LedgerError::InvalidStatus {
                status: order.status.to_string(),
            });
        }

        let product = state
            .products
            .get_mut(&order.product_id)
            .ok_or(LedgerError::ProductNotFound {
                id: order.product_id,
            })?;
        product.restore(order.quantity)?;
        order.transition_to(OrderStatus::Cancelled)?;

        info!(order_id, buyer = %caller, restored = order.quantity, "order cancelled");
        Ok(())
    }

    /// Returns the full order record, including its timestamps.
    pub async fn get_order(&self, order_id: u64) -> Option<Order> {
        let state = self.state.lock().await;
        state.orders.get(&order_id).cloned()
    }

    /// The id the next created order will receive.
    pub async fn get_next_order_id(&self) -> u64 {
        let state = self.state.lock().await;
        state.next_order_id
    }

    /// The balance currently held in escrow for an order (zero if the
    /// escrow was never funded or already settled).
    pub async fn get_escrow_balance(&self, order_id: u64) -> Amount {
        let state = self.state.lock().await;
        state
            .escrows
            .get(&order_id)
            .map_or(Amount::ZERO, |e| e.balance)
    }

    // ------------------------------------------------------------------
    // Disputes
    // ------------------------------------------------------------------

    /// Opens a dispute on an order. Buyer-only; the order must be paid,
    /// shipped, or delivered.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `NotAuthorized` for a non-buyer,
    /// `InvalidStatus` outside the disputable statuses, `InvalidInput`
    /// for an oversize reason.
    pub async fn create_dispute(
        &self,
        caller: &Address,
        order_id: u64,
        reason: String,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        if &order.buyer != caller {
            return Err(LedgerError::NotAuthorized);
        }
        if !order.status.can_transition_to(OrderStatus::Disputed) {
            return Err(LedgerError::InvalidStatus {
                status: order.status.to_string(),
            });
        }

        let dispute = Dispute::open(order_id, caller.clone(), reason)?;
        state.disputes.insert(order_id, dispute);
        order.transition_to(OrderStatus::Disputed)?;

        info!(order_id, buyer = %caller, "dispute opened");
        Ok(())
    }

    /// Resolves a dispute, disbursing the escrow exactly once.
    /// Admin-only.
    ///
    /// With `refund_buyer` the full held balance returns to the buyer;
    /// otherwise the normal split applies (seller gets base + shipping,
    /// the treasury keeps the fee). A dispute opened after delivery
    /// finds its escrow already settled; the decision is still recorded
    /// and the order closed, with no funds to move.
    ///
    /// # Errors
    ///
    /// `OwnerOnly` for a non-admin, `OrderNotFound`, `DisputeNotFound`,
    /// `AlreadyResolved` on a second call, `InvalidInput` for an
    /// oversize resolution.
    pub async fn resolve_dispute(
        &self,
        caller: &Address,
        order_id: u64,
        resolution: String,
        refund_buyer: bool,
    ) -> Result<()> {
        if caller != &self.config.admin {
            return Err(LedgerError::OwnerOnly);
        }

        let mut state = self.state.lock().await;
        let state = &mut *state;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        let dispute = state
            .disputes
            .get_mut(&order_id)
            .ok_or(LedgerError::DisputeNotFound { order_id })?;
        if dispute.resolved {
            return Err(LedgerError::AlreadyResolved { order_id });
        }
        // Validate the resolution text before any escrow movement so a
        // rejected input cannot strand a drained account.
        check_len("resolution", &resolution, MAX_RESOLUTION_LEN)?;

        let disbursable = state
            .escrows
            .get(&order_id)
            .is_some_and(|e| !e.released && !e.balance.is_zero());
        if !disbursable {
            // Dispute opened after delivery: the escrow already settled,
            // so only the decision is recorded.
            dispute.resolve(caller.clone(), resolution, refund_buyer)?;
            order.transition_to(OrderStatus::Resolved)?;

            info!(order_id, refund_buyer, "dispute resolved, escrow already settled");
            return Ok(());
        }

        let escrow = state
            .escrows
            .get_mut(&order_id)
            .ok_or(LedgerError::NothingHeld { order_id })?;

        if refund_buyer {
            let buyer = order.buyer.clone();
            let refund_new = state
                .balances
                .get(&buyer)
                .copied()
                .unwrap_or(Amount::ZERO)
                .checked_add(escrow.balance)
                .ok_or(LedgerError::ArithmeticOverflow("refund settlement"))?;

            let refunded = escrow.take()?;
            dispute.resolve(caller.clone(), resolution, true)?;
            state.balances.insert(buyer.clone(), refund_new);
            order.transition_to(OrderStatus::Resolved)?;

            info!(order_id, buyer = %buyer, refunded = %refunded, "dispute resolved, buyer refunded");
        } else {
            let seller = order.seller.clone();
            let seller_share = order.cost.seller_share()?;
            let fee = order.cost.platform_fee;

            let seller_new = state
                .balances
                .get(&seller)
                .copied()
                .unwrap_or(Amount::ZERO)
                .checked_add(seller_share)
                .ok_or(LedgerError::ArithmeticOverflow("seller settlement"))?;
            let admin_new = state
                .balances
                .get(&self.config.admin)
                .copied()
                .unwrap_or(Amount::ZERO)
                .checked_add(fee)
                .ok_or(LedgerError::ArithmeticOverflow("fee settlement"))?;

            escrow.split(seller_share, fee)?;
            dispute.resolve(caller.clone(), resolution, false)?;
            state.balances.insert(seller.clone(), seller_new);
            state.balances.insert(self.config.admin.clone(), admin_new);
            order.transition_to(OrderStatus::Resolved)?;

            info!(order_id, seller = %seller, payout = %seller_share, "dispute resolved, seller paid");
        }

        Ok(())
    }

    /// Returns the dispute record for an order, if one was opened.
    pub async fn get_dispute(&self, order_id: u64) -> Option<Dispute> {
        let state = self.state.lock().await;
        state.disputes.get(&order_id).cloned()
    }

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    /// Leaves a review on a delivered order and folds the rating into
    /// the seller's aggregate. Buyer-only; at most once per order.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`; `NotAuthorized` for a non-buyer;
    /// `InvalidRating` outside [1, 5] (checked before anything else
    /// about the review); `InvalidInput` if `product_id` is not the
    /// product the order was for; `AlreadyReviewed` on a duplicate;
    /// `InvalidStatus` unless the order is `Delivered`.
    pub async fn leave_review(
        &self,
        caller: &Address,
        product_id: u64,
        order_id: u64,
        rating: u8,
        comment: String,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound { id: order_id })?;
        if &order.buyer != caller {
            return Err(LedgerError::NotAuthorized);
        }
        validate_rating(rating)?;
        if order.product_id != product_id {
            return Err(LedgerError::InvalidInput(format!(
                "product {product_id} does not match order {order_id}"
            )));
        }
        if state.reviews.contains_key(&order_id) {
            return Err(LedgerError::AlreadyReviewed { order_id });
        }
        if order.status != OrderStatus::Delivered {
            return Err(LedgerError::InvalidStatus {
                status: order.status.to_string(),
            });
        }

        let seller = order.seller.clone();
        let review = Review::new(order_id, product_id, caller.clone(), rating, comment)?;
        let profile = state
            .sellers
            .get_mut(&seller)
            .ok_or(LedgerError::SellerProfileRequired)?;
        profile.record_rating(rating)?;
        state.reviews.insert(order_id, review);
        order.transition_to(OrderStatus::Reviewed)?;

        info!(order_id, buyer = %caller, rating, "review recorded");
        Ok(())
    }

    /// Whether `buyer` could leave a review on `order_id` right now.
    /// Mirrors the checks of [`Marketplace::leave_review`] without
    /// mutating anything.
    pub async fn can_leave_review(&self, order_id: u64, buyer: &Address) -> bool {
        let state = self.state.lock().await;
        let Some(order) = state.orders.get(&order_id) else {
            return false;
        };
        &order.buyer == buyer
            && order.status == OrderStatus::Delivered
            && !state.reviews.contains_key(&order_id)
    }

    /// Returns the review for an order, if one exists.
    pub async fn get_review(&self, order_id: u64) -> Option<Review> {
        let state = self.state.lock().await;
        state.reviews.get(&order_id).cloned()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("admin", &self.config.admin)
            .finish_non_exhaustive()
    }
}
