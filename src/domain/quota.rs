use crate::domain::money::Money;
use crate::domain::seller::SellerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    Active,
    Expired,
}

/// A block of transaction credits granted by a paid subscription package.
///
/// Created on package purchase approval (outside this subsystem); mutated only
/// by the debit operations in the quota ledger. `used` may exceed `quota`: a
/// sale that was admitted before the balance ran out is still debited in full,
/// leaving a recorded deficit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionCredit {
    pub id: Uuid,
    pub seller_id: SellerId,
    pub quota: i64,
    pub used: i64,
    pub expires_at: DateTime<Utc>,
    pub status: CreditStatus,
}

impl SubscriptionCredit {
    pub fn remaining(&self) -> i64 {
        self.quota - self.used
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == CreditStatus::Active && self.expires_at > now
    }
}

/// One bracket of the price-tiered credit cost table.
///
/// `max_price == None` means the bracket is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTier {
    pub min_price: Money,
    pub max_price: Option<Money>,
    pub credit_cost: u32,
}

/// Looks up the credit cost for a unit price in an ordered tier table.
///
/// The table is a monotonic step function: cheaper items never cost more
/// credits. The lookup takes the last bracket whose floor is at or below the
/// price, so a fractional price falling between two integer bracket bounds
/// (e.g. 50000.50 against a 50000/50001 boundary) resolves to the bracket
/// below. Prices below the first bracket cost the first bracket's rate; an
/// empty table costs one credit per item.
pub fn credit_cost(unit_price: Money, tiers: &[CreditTier]) -> u32 {
    let Some(first) = tiers.first() else {
        return 1;
    };
    tiers
        .iter()
        .rev()
        .find(|tier| unit_price >= tier.min_price)
        .map(|tier| tier.credit_cost)
        .unwrap_or(first.credit_cost)
}

/// The quota standing of a seller at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QuotaStatus {
    /// Seller holds at least one credit row; balance decides admission.
    Subscription { remaining: i64 },
    /// Seller holds no credit rows; the monthly order count decides admission.
    FreeTier { used_this_month: u64, limit: u32 },
}

impl QuotaStatus {
    pub fn is_available(&self) -> bool {
        match self {
            Self::Subscription { remaining } => *remaining > 0,
            Self::FreeTier {
                used_this_month,
                limit,
            } => *used_this_month < u64::from(*limit),
        }
    }
}
