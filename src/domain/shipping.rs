use crate::domain::money::Money;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Pickup,
    Delivery,
}

/// Platform-wide shipping configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingPolicy {
    pub base_fee: Money,
    pub per_km_fee: Money,
    pub min_fee: Money,
    pub max_fee: Money,
    /// Present in the policy payload but not consulted by the fare
    /// calculation; kept so config round-trips without loss.
    pub free_shipping_min_order: Option<Money>,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            base_fee: Money::new(Decimal::from(8000)),
            per_km_fee: Money::new(Decimal::from(2000)),
            min_fee: Money::new(Decimal::from(5000)),
            max_fee: Money::new(Decimal::from(50000)),
            free_shipping_min_order: None,
        }
    }
}

/// Computes the shipping cost for one seller's order.
///
/// Pure and deterministic: re-evaluated whenever distance or policy changes
/// and must always agree with a freshly computed value.
///
/// - Pickup is always free, regardless of distance.
/// - Delivery with a known positive distance:
///   `clamp(base + round(distance * per_km), min, max)`.
/// - Unknown or non-positive distance falls back to the bare base fee,
///   unclamped.
pub fn compute_shipping(
    delivery_type: DeliveryType,
    distance_km: Option<Decimal>,
    policy: &ShippingPolicy,
) -> Money {
    if delivery_type == DeliveryType::Pickup {
        return Money::ZERO;
    }

    match distance_km {
        Some(d) if d > Decimal::ZERO => {
            let variable = (d * policy.per_km_fee.value())
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            (policy.base_fee + Money::new(variable)).clamp(policy.min_fee, policy.max_fee)
        }
        _ => policy.base_fee,
    }
}
