use crate::domain::cart::BuyerId;
use crate::domain::money::Money;
use crate::domain::order::PaymentMethod;
use crate::domain::seller::Seller;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Platform-wide COD policy snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodSettings {
    /// Global kill switch for COD across the marketplace.
    pub enabled: bool,
    pub max_amount: Money,
    pub max_distance_km: Decimal,
    /// Flat service fee added to the order total whenever COD is chosen.
    pub flat_fee: Money,
    /// COD orders must be confirmed by the buyer within this window.
    pub confirmation_timeout_minutes: i64,
}

impl Default for CodSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_amount: Money::new(Decimal::from(500_000)),
            max_distance_km: Decimal::from(30),
            flat_fee: Money::new(Decimal::from(5000)),
            confirmation_timeout_minutes: 1440,
        }
    }
}

/// Read-only trust inputs for a buyer, maintained by the abuse pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerCodProfile {
    pub buyer_id: BuyerId,
    /// 0-100.
    pub trust_score: u8,
    pub verified: bool,
    pub cod_enabled: bool,
}

/// Outcome of a COD eligibility check.
#[derive(Debug, Clone, PartialEq)]
pub struct CodDecision {
    pub eligible: bool,
    pub reason: Option<String>,
}

impl CodDecision {
    fn blocked(reason: &str) -> Self {
        Self {
            eligible: false,
            reason: Some(reason.to_string()),
        }
    }

    fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }
}

/// Decides whether COD is safe to offer for this buyer/seller/amount/distance.
///
/// Rules are evaluated in a fixed order and the first violated rule wins.
/// An unknown distance cannot exceed the distance cap and passes rule 5.
pub fn evaluate_cod(
    buyer: &BuyerCodProfile,
    seller: &Seller,
    settings: &CodSettings,
    amount: Money,
    distance_km: Option<Decimal>,
) -> CodDecision {
    if !seller.cod_enabled {
        return CodDecision::blocked("seller does not accept COD");
    }
    if !settings.enabled {
        return CodDecision::blocked("COD temporarily unavailable");
    }
    if !buyer.cod_enabled {
        return CodDecision::blocked("account cannot use COD");
    }
    if amount > settings.max_amount {
        return CodDecision::blocked("exceeds maximum COD amount");
    }
    if let Some(d) = distance_km
        && d > settings.max_distance_km
    {
        return CodDecision::blocked("exceeds maximum COD distance");
    }
    CodDecision::eligible()
}

/// Reselects a payment method after COD was found ineligible.
///
/// Priority order: bank transfer if the seller accepts it, else the online
/// gateway if one is configured. Returns `None` when no safe default exists;
/// the caller must surface that to the buyer instead of guessing.
pub fn select_fallback(seller: &Seller, online_available: bool) -> Option<PaymentMethod> {
    if seller.transfer_enabled {
        Some(PaymentMethod::Transfer)
    } else if online_available {
        Some(PaymentMethod::Online)
    } else {
        None
    }
}

/// Payment methods currently offerable, with the COD refusal reason if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOptions {
    pub available: Vec<PaymentMethod>,
    pub cod_reason: Option<String>,
}

pub fn payment_options(
    buyer: &BuyerCodProfile,
    seller: &Seller,
    settings: &CodSettings,
    amount: Money,
    distance_km: Option<Decimal>,
    online_available: bool,
) -> PaymentOptions {
    let decision = evaluate_cod(buyer, seller, settings, amount, distance_km);
    let mut available = Vec::new();
    if decision.eligible {
        available.push(PaymentMethod::Cod);
    }
    if seller.transfer_enabled {
        available.push(PaymentMethod::Transfer);
    }
    if online_available {
        available.push(PaymentMethod::Online);
    }
    PaymentOptions {
        available,
        cod_reason: decision.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::seller::OperatingHours;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn seller(cod: bool, transfer: bool) -> Seller {
        Seller {
            id: Uuid::new_v4(),
            name: "Toko Melati".to_string(),
            is_open: true,
            hours: OperatingHours {
                open: "00:00:00".parse().unwrap(),
                close: "00:00:00".parse().unwrap(),
            },
            cod_enabled: cod,
            transfer_enabled: transfer,
            bank_account: transfer.then(|| "BCA 1234567890".to_string()),
            qris_payload: None,
        }
    }

    fn buyer(cod: bool) -> BuyerCodProfile {
        BuyerCodProfile {
            buyer_id: Uuid::new_v4(),
            trust_score: 80,
            verified: true,
            cod_enabled: cod,
        }
    }

    #[test]
    fn test_rule_order_seller_toggle_wins() {
        // Seller toggle is checked before the platform switch.
        let settings = CodSettings {
            enabled: false,
            ..CodSettings::default()
        };
        let d = evaluate_cod(
            &buyer(false),
            &seller(false, true),
            &settings,
            Money::new(dec!(10000)),
            None,
        );
        assert_eq!(d.reason.as_deref(), Some("seller does not accept COD"));
    }

    #[test]
    fn test_platform_switch_before_buyer_flag() {
        let settings = CodSettings {
            enabled: false,
            ..CodSettings::default()
        };
        let d = evaluate_cod(
            &buyer(false),
            &seller(true, true),
            &settings,
            Money::new(dec!(10000)),
            None,
        );
        assert_eq!(d.reason.as_deref(), Some("COD temporarily unavailable"));
    }

    #[test]
    fn test_buyer_flag_blocked() {
        let d = evaluate_cod(
            &buyer(false),
            &seller(true, true),
            &CodSettings::default(),
            Money::new(dec!(10000)),
            None,
        );
        assert_eq!(d.reason.as_deref(), Some("account cannot use COD"));
    }

    #[test]
    fn test_amount_cap() {
        // Cart amount 600,000 against a 500,000 cap.
        let d = evaluate_cod(
            &buyer(true),
            &seller(true, true),
            &CodSettings::default(),
            Money::new(dec!(600000)),
            Some(dec!(2)),
        );
        assert!(!d.eligible);
        assert_eq!(d.reason.as_deref(), Some("exceeds maximum COD amount"));
    }

    #[test]
    fn test_distance_cap_and_unknown_distance() {
        let d = evaluate_cod(
            &buyer(true),
            &seller(true, true),
            &CodSettings::default(),
            Money::new(dec!(10000)),
            Some(dec!(45)),
        );
        assert_eq!(d.reason.as_deref(), Some("exceeds maximum COD distance"));

        let d = evaluate_cod(
            &buyer(true),
            &seller(true, true),
            &CodSettings::default(),
            Money::new(dec!(10000)),
            None,
        );
        assert!(d.eligible);
    }

    #[test]
    fn test_fallback_priority() {
        assert_eq!(
            select_fallback(&seller(false, true), true),
            Some(PaymentMethod::Transfer)
        );
        assert_eq!(
            select_fallback(&seller(false, false), true),
            Some(PaymentMethod::Online)
        );
        assert_eq!(select_fallback(&seller(false, false), false), None);
    }

    #[test]
    fn test_payment_options_surface_cod_reason() {
        let opts = payment_options(
            &buyer(true),
            &seller(true, true),
            &CodSettings::default(),
            Money::new(dec!(600000)),
            Some(dec!(2)),
            true,
        );
        assert_eq!(
            opts.available,
            vec![PaymentMethod::Transfer, PaymentMethod::Online]
        );
        assert_eq!(opts.cod_reason.as_deref(), Some("exceeds maximum COD amount"));
    }
}
