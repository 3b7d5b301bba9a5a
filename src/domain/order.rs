use crate::domain::cart::{BuyerId, CartLine, ProductId};
use crate::domain::delivery::DeliverySnapshot;
use crate::domain::money::{Money, UnitPrice};
use crate::domain::seller::SellerId;
use crate::error::{CheckoutError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrderId = Uuid;

/// Initial order states, a function of the chosen payment method.
///
/// Transitions beyond these belong to the post-creation lifecycle, which is
/// handled elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Online gateway order awaiting invoice payment.
    New,
    /// COD order awaiting buyer confirmation before the deadline.
    PendingConfirmation,
    /// Bank-transfer order awaiting payment.
    PendingPayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Cod,
    PendingTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Transfer,
    Online,
}

impl PaymentMethod {
    /// Initial status pair for an order created with this method.
    pub fn initial_statuses(&self) -> (OrderStatus, PaymentStatus) {
        match self {
            Self::Cod => (OrderStatus::PendingConfirmation, PaymentStatus::Cod),
            Self::Transfer => (OrderStatus::PendingPayment, PaymentStatus::PendingTransfer),
            Self::Online => (OrderStatus::New, PaymentStatus::Unpaid),
        }
    }
}

/// Persisted child of an order. Name and price are snapshots taken at order
/// time and never recomputed from the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: UnitPrice,
    pub quantity: u32,
    pub line_subtotal: Money,
}

impl OrderLine {
    pub fn from_cart_line(order_id: OrderId, line: &CartLine) -> Self {
        Self {
            order_id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_subtotal: line.subtotal(),
        }
    }
}

/// One persisted order: a single seller's share of a checkout submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: BuyerId,
    pub seller_id: SellerId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub cod_fee: Money,
    pub voucher_discount: Money,
    pub total: Money,
    pub delivery: DeliverySnapshot,
    pub distance_km: Option<Decimal>,
    /// COD only: the buyer must confirm before this instant.
    pub confirmation_deadline: Option<DateTime<Utc>>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to build an order besides the computed total.
pub struct OrderParts {
    pub buyer_id: BuyerId,
    pub seller_id: SellerId,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub cod_fee: Money,
    pub voucher_discount: Money,
    pub delivery: DeliverySnapshot,
    pub distance_km: Option<Decimal>,
    pub confirmation_deadline: Option<DateTime<Utc>>,
    pub idempotency_key: String,
}

impl Order {
    /// Builds an order, computing the total from its parts.
    ///
    /// `total == subtotal + shipping + cod_fee - voucher_discount` holds by
    /// construction; a negative total is rejected.
    pub fn build(parts: OrderParts, now: DateTime<Utc>) -> Result<Self> {
        let total =
            parts.subtotal + parts.shipping_cost + parts.cod_fee - parts.voucher_discount;
        if total.is_negative() {
            return Err(CheckoutError::validation(
                "voucher discount exceeds order total",
            ));
        }
        let (status, payment_status) = parts.payment_method.initial_statuses();
        Ok(Self {
            id: Uuid::new_v4(),
            buyer_id: parts.buyer_id,
            seller_id: parts.seller_id,
            status,
            payment_method: parts.payment_method,
            payment_status,
            subtotal: parts.subtotal,
            shipping_cost: parts.shipping_cost,
            cod_fee: parts.cod_fee,
            voucher_discount: parts.voucher_discount,
            total,
            delivery: parts.delivery,
            distance_km: parts.distance_km,
            confirmation_deadline: parts.confirmation_deadline,
            idempotency_key: parts.idempotency_key,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::DeliverySnapshot;
    use crate::domain::shipping::DeliveryType;
    use rust_decimal_macros::dec;

    fn parts(method: PaymentMethod) -> OrderParts {
        OrderParts {
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            payment_method: method,
            subtotal: Money::new(dec!(100000)),
            shipping_cost: Money::new(dec!(12000)),
            cod_fee: Money::ZERO,
            voucher_discount: Money::ZERO,
            delivery: DeliverySnapshot {
                recipient_name: "Ani".to_string(),
                phone: "6281234567890".to_string(),
                delivery_type: DeliveryType::Delivery,
                address: Some("Desa Sukamaju, Kec. Cisarua".to_string()),
                lat: Some(-6.9),
                lng: Some(107.6),
            },
            distance_km: Some(dec!(3)),
            confirmation_deadline: None,
            idempotency_key: "k".to_string(),
        }
    }

    #[test]
    fn test_total_invariant_by_construction() {
        let mut p = parts(PaymentMethod::Cod);
        p.cod_fee = Money::new(dec!(5000));
        p.voucher_discount = Money::new(dec!(10000));
        let order = Order::build(p, Utc::now()).unwrap();
        assert_eq!(
            order.total,
            order.subtotal + order.shipping_cost + order.cod_fee - order.voucher_discount
        );
        assert_eq!(order.total, Money::new(dec!(107000)));
    }

    #[test]
    fn test_negative_total_rejected() {
        let mut p = parts(PaymentMethod::Transfer);
        p.voucher_discount = Money::new(dec!(999999));
        assert!(matches!(
            Order::build(p, Utc::now()),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn test_initial_statuses_per_method() {
        assert_eq!(
            PaymentMethod::Cod.initial_statuses(),
            (OrderStatus::PendingConfirmation, PaymentStatus::Cod)
        );
        assert_eq!(
            PaymentMethod::Transfer.initial_statuses(),
            (OrderStatus::PendingPayment, PaymentStatus::PendingTransfer)
        );
        assert_eq!(
            PaymentMethod::Online.initial_statuses(),
            (OrderStatus::New, PaymentStatus::Unpaid)
        );
    }
}
