use crate::domain::money::{Money, UnitPrice};
use crate::domain::seller::SellerId;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

pub type BuyerId = Uuid;
pub type ProductId = Uuid;

/// One product entry in a buyer's cart.
///
/// Name and price are snapshots taken client-side; they are copied verbatim
/// onto the persisted order line and never recomputed from the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub seller_id: SellerId,
    pub unit_price: UnitPrice,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> Money {
        Money::from(self.unit_price).times(self.quantity)
    }
}

/// A buyer-owned, ephemeral collection of cart lines spanning one or more
/// sellers. Destroyed (cleared) by the caller only after every per-seller
/// order was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub buyer_id: BuyerId,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(buyer_id: BuyerId, lines: Vec<CartLine>) -> Self {
        Self { buyer_id, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct sellers in cart-iteration order (first appearance wins).
    pub fn seller_ids(&self) -> Vec<SellerId> {
        let mut ids = Vec::new();
        for line in &self.lines {
            if !ids.contains(&line.seller_id) {
                ids.push(line.seller_id);
            }
        }
        ids
    }

    /// A stable digest of the cart contents, independent of line order.
    ///
    /// Combined with the buyer id this keys each per-seller draft, so a naive
    /// resubmit of the same cart cannot recreate orders that already committed.
    pub fn fingerprint(&self) -> u64 {
        let mut keys: Vec<String> = self
            .lines
            .iter()
            .map(|l| {
                format!(
                    "{}:{}:{}:{}",
                    l.product_id,
                    l.seller_id,
                    l.unit_price.value(),
                    l.quantity
                )
            })
            .collect();
        keys.sort();
        let mut hasher = DefaultHasher::new();
        self.buyer_id.hash(&mut hasher);
        keys.hash(&mut hasher);
        hasher.finish()
    }

    /// Partitions the cart into one draft per seller, preserving cart-iteration
    /// order between sellers and line order within each seller.
    pub fn partition(&self) -> Vec<OrderDraft> {
        let fingerprint = self.fingerprint();
        self.seller_ids()
            .into_iter()
            .map(|seller_id| {
                let lines: Vec<CartLine> = self
                    .lines
                    .iter()
                    .filter(|l| l.seller_id == seller_id)
                    .cloned()
                    .collect();
                OrderDraft {
                    seller_id,
                    idempotency_key: format!(
                        "{}:{:016x}:{}",
                        self.buyer_id, fingerprint, seller_id
                    ),
                    lines,
                }
            })
            .collect()
    }
}

/// The per-seller partition of a checkout request.
///
/// Not persisted on its own; it is the unit of work the orchestrator turns
/// into a persisted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub seller_id: SellerId,
    pub idempotency_key: String,
    pub lines: Vec<CartLine>,
}

impl OrderDraft {
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::ZERO, |acc, line| acc + line.subtotal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(seller: SellerId, price: rust_decimal::Decimal, qty: u32) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            product_name: "Keripik Singkong".to_string(),
            seller_id: seller,
            unit_price: UnitPrice::new(price).unwrap(),
            quantity: qty,
        }
    }

    #[test]
    fn test_partition_preserves_seller_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let cart = Cart::new(
            Uuid::new_v4(),
            vec![
                line(a, dec!(10000), 1),
                line(b, dec!(5000), 2),
                line(a, dec!(20000), 1),
            ],
        );

        let drafts = cart.partition();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].seller_id, a);
        assert_eq!(drafts[1].seller_id, b);
        assert_eq!(drafts[0].lines.len(), 2);
        assert_eq!(drafts[0].subtotal(), Money::new(dec!(30000)));
        assert_eq!(drafts[1].subtotal(), Money::new(dec!(10000)));
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let buyer = Uuid::new_v4();
        let a = Uuid::new_v4();
        let l1 = line(a, dec!(10000), 1);
        let l2 = line(a, dec!(5000), 2);

        let cart1 = Cart::new(buyer, vec![l1.clone(), l2.clone()]);
        let cart2 = Cart::new(buyer, vec![l2, l1]);
        assert_eq!(cart1.fingerprint(), cart2.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_contents() {
        let buyer = Uuid::new_v4();
        let a = Uuid::new_v4();
        let l1 = line(a, dec!(10000), 1);
        let mut l1_more = l1.clone();
        l1_more.quantity = 2;

        let cart1 = Cart::new(buyer, vec![l1]);
        let cart2 = Cart::new(buyer, vec![l1_more]);
        assert_ne!(cart1.fingerprint(), cart2.fingerprint());
    }

    #[test]
    fn test_draft_keys_differ_per_seller() {
        let cart = Cart::new(
            Uuid::new_v4(),
            vec![
                line(Uuid::new_v4(), dec!(10000), 1),
                line(Uuid::new_v4(), dec!(5000), 1),
            ],
        );
        let drafts = cart.partition();
        assert_ne!(drafts[0].idempotency_key, drafts[1].idempotency_key);
    }
}
