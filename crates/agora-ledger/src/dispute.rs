//! Dispute records for administrative arbitration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::registry::check_len;

/// Maximum length of a dispute reason.
pub const MAX_REASON_LEN: usize = 512;
/// Maximum length of a resolution text.
pub const MAX_RESOLUTION_LEN: usize = 512;

/// An open or resolved dispute over one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    /// The disputed order.
    pub order_id: u64,
    /// The buyer who opened the dispute.
    pub buyer: agora_core::Address,
    /// Why the buyer disputed.
    pub reason: String,
    /// The administrator's written resolution.
    pub resolution: Option<String>,
    /// Whether the escrow was refunded to the buyer.
    pub refund_buyer: bool,
    /// The identity that resolved the dispute.
    pub resolver: Option<agora_core::Address>,
    /// Set exactly once; resolved disputes cannot be reopened.
    pub resolved: bool,
    /// Opening timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Opens a dispute for `order_id` on behalf of `buyer`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the reason exceeds its bound.
    pub fn open(order_id: u64, buyer: agora_core::Address, reason: String) -> Result<Self> {
        check_len("dispute reason", &reason, MAX_REASON_LEN)?;
        Ok(Self {
            order_id,
            buyer,
            reason,
            resolution: None,
            refund_buyer: false,
            resolver: None,
            resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }

    /// Records the administrator's decision, exactly once.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyResolved` on a second call and `InvalidInput`
    /// for an oversize resolution text.
    pub fn resolve(
        &mut self,
        resolver: agora_core::Address,
        resolution: String,
        refund_buyer: bool,
    ) -> Result<()> {
        if self.resolved {
            return Err(LedgerError::AlreadyResolved {
                order_id: self.order_id,
            });
        }
        check_len("resolution", &resolution, MAX_RESOLUTION_LEN)?;

        self.resolution = Some(resolution);
        self.refund_buyer = refund_buyer;
        self.resolver = Some(resolver);
        self.resolved = true;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}
