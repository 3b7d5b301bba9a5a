use crate::domain::order::PaymentMethod;
use crate::domain::shipping::DeliveryType;
use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A validated map point supplied by the address/location resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Resolved administrative address. The resolver guarantees province through
/// district; checkout additionally requires at least a village-level
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub province: String,
    pub city: String,
    pub district: String,
    pub village: String,
    pub street: Option<String>,
}

impl Address {
    pub fn display_line(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(street) = &self.street {
            parts.push(street);
        }
        parts.extend([
            self.village.as_str(),
            self.district.as_str(),
            self.city.as_str(),
            self.province.as_str(),
        ]);
        parts.join(", ")
    }
}

/// The delivery form as submitted by the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub recipient_name: String,
    pub phone: String,
    pub delivery_type: DeliveryType,
    pub address: Option<Address>,
    pub map_point: Option<GeoPoint>,
    /// Full-cart distance resolved once by the caller; applied to every
    /// seller's fare.
    pub distance_km: Option<Decimal>,
}

/// Flattened delivery metadata copied onto each persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverySnapshot {
    pub recipient_name: String,
    pub phone: String,
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 100;

/// Strips formatting and canonicalizes a local phone number onto the
/// international `62…` form. Returns `None` when the input is not a plausible
/// phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if raw
        .chars()
        .any(|c| !c.is_ascii_digit() && !matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return None;
    }
    let normalized = if digits.starts_with("62") {
        digits
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("62{rest}")
    } else {
        return None;
    };
    (10..=15).contains(&normalized.len()).then_some(normalized)
}

/// WhatsApp-compatible numbers are mobile numbers on the `628…` prefix.
pub fn is_whatsapp_compatible(normalized: &str) -> bool {
    normalized.starts_with("628")
}

impl DeliveryDetails {
    /// Validates the delivery form against the chosen payment method.
    ///
    /// Fail-closed: any violation aborts checkout before anything is written.
    pub fn validate(&self, method: PaymentMethod) -> Result<String> {
        let name = self.recipient_name.trim();
        if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
            return Err(CheckoutError::validation(format!(
                "recipient name must be {MIN_NAME_LEN}-{MAX_NAME_LEN} characters"
            )));
        }

        let phone = normalize_phone(&self.phone)
            .ok_or_else(|| CheckoutError::validation("invalid phone number"))?;
        if method == PaymentMethod::Cod && !is_whatsapp_compatible(&phone) {
            return Err(CheckoutError::validation(
                "COD requires a WhatsApp-compatible mobile number",
            ));
        }

        if self.delivery_type == DeliveryType::Delivery {
            if self.map_point.is_none() {
                return Err(CheckoutError::validation(
                    "delivery requires a resolved map point",
                ));
            }
            match &self.address {
                Some(addr) if !addr.village.trim().is_empty() => {}
                _ => {
                    return Err(CheckoutError::validation(
                        "delivery address must be resolved to at least village level",
                    ));
                }
            }
        }

        Ok(phone)
    }

    /// Produces the per-order snapshot, using the normalized phone returned by
    /// [`DeliveryDetails::validate`].
    pub fn snapshot(&self, normalized_phone: String) -> DeliverySnapshot {
        DeliverySnapshot {
            recipient_name: self.recipient_name.trim().to_string(),
            phone: normalized_phone,
            delivery_type: self.delivery_type,
            address: self.address.as_ref().map(Address::display_line),
            lat: self.map_point.map(|p| p.lat),
            lng: self.map_point.map(|p| p.lng),
        }
    }
}
