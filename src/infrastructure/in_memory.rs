use crate::domain::cart::BuyerId;
use crate::domain::order::{Order, OrderId, OrderLine};
use crate::domain::ports::{
    BuyerStore, CreditStore, Invoice, InvoiceIssuer, InvoiceRequest, Notification,
    NotificationDispatcher, OrderStore, SellerStore, SettingsStore,
};
use crate::domain::quota::SubscriptionCredit;
use crate::domain::risk::BuyerCodProfile;
use crate::domain::seller::{Seller, SellerId};
use crate::error::{CheckoutError, PersistenceKind, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Thread-safe in-memory seller registry.
#[derive(Default)]
pub struct InMemorySellerStore {
    sellers: Arc<RwLock<HashMap<SellerId, Seller>>>,
}

impl InMemorySellerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, seller: Seller) {
        self.sellers.write().await.insert(seller.id, seller);
    }
}

#[async_trait]
impl SellerStore for InMemorySellerStore {
    async fn get(&self, id: SellerId) -> Result<Option<Seller>> {
        Ok(self.sellers.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryBuyerStore {
    buyers: Arc<RwLock<HashMap<BuyerId, BuyerCodProfile>>>,
}

impl InMemoryBuyerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: BuyerCodProfile) {
        self.buyers.write().await.insert(profile.buyer_id, profile);
    }
}

#[async_trait]
impl BuyerStore for InMemoryBuyerStore {
    async fn cod_profile(&self, id: BuyerId) -> Result<Option<BuyerCodProfile>> {
        Ok(self.buyers.read().await.get(&id).cloned())
    }
}

/// In-memory subscription credit rows, keyed by seller.
///
/// `debit` performs the whole read-modify-write under a single write lock, so
/// two concurrent debits against the same seller are both recorded.
#[derive(Default)]
pub struct InMemoryCreditStore {
    credits: Arc<RwLock<HashMap<SellerId, Vec<SubscriptionCredit>>>>,
}

impl InMemoryCreditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, credit: SubscriptionCredit) {
        self.credits
            .write()
            .await
            .entry(credit.seller_id)
            .or_default()
            .push(credit);
    }
}

#[async_trait]
impl CreditStore for InMemoryCreditStore {
    async fn has_rows(&self, seller_id: SellerId) -> Result<bool> {
        Ok(self
            .credits
            .read()
            .await
            .get(&seller_id)
            .is_some_and(|rows| !rows.is_empty()))
    }

    async fn active_credits(
        &self,
        seller_id: SellerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionCredit>> {
        Ok(self
            .credits
            .read()
            .await
            .get(&seller_id)
            .map(|rows| {
                rows.iter()
                    .filter(|c| c.is_usable(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn debit(&self, seller_id: SellerId, credits: u32, now: DateTime<Utc>) -> Result<i64> {
        let mut all = self.credits.write().await;
        let rows = all.get_mut(&seller_id).ok_or_else(|| {
            CheckoutError::persistence(
                PersistenceKind::ForeignKeyViolation,
                format!("no credit rows for seller {seller_id}"),
            )
        })?;

        // Earliest-expiring usable rows are consumed first; any excess lands
        // on the last one, which may push its balance negative.
        let mut order: Vec<usize> = (0..rows.len())
            .filter(|&i| rows[i].is_usable(now))
            .collect();
        if order.is_empty() {
            order = (0..rows.len()).collect();
        }
        order.sort_by_key(|&i| rows[i].expires_at);

        let mut to_debit = i64::from(credits);
        let last = order.len().saturating_sub(1);
        for (pos, &idx) in order.iter().enumerate() {
            let row = &mut rows[idx];
            let take = if pos == last {
                to_debit
            } else {
                to_debit.min(row.remaining().max(0))
            };
            row.used += take;
            to_debit -= take;
            if to_debit == 0 {
                break;
            }
        }

        let remaining = rows
            .iter()
            .filter(|c| c.is_usable(now))
            .map(SubscriptionCredit::remaining)
            .sum();
        Ok(remaining)
    }
}

/// In-memory order + line persistence with an idempotency-key index.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    lines: Arc<RwLock<HashMap<OrderId, Vec<OrderLine>>>>,
    by_key: Arc<RwLock<HashMap<String, OrderId>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Vec<Order> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect()
    }

    /// Test support: backfills `count` bare orders for a seller so the
    /// free-tier monthly counter has something to count.
    pub async fn seed_count_for(&self, seller_id: SellerId, count: u64, created_at: DateTime<Utc>) {
        use crate::domain::delivery::DeliverySnapshot;
        use crate::domain::money::Money;
        use crate::domain::order::{OrderStatus, PaymentMethod, PaymentStatus};
        use crate::domain::shipping::DeliveryType;
        use uuid::Uuid;

        let mut orders = self.orders.write().await;
        for _ in 0..count {
            let id = Uuid::new_v4();
            orders.insert(
                id,
                Order {
                    id,
                    buyer_id: Uuid::new_v4(),
                    seller_id,
                    status: OrderStatus::PendingPayment,
                    payment_method: PaymentMethod::Transfer,
                    payment_status: PaymentStatus::PendingTransfer,
                    subtotal: Money::ZERO,
                    shipping_cost: Money::ZERO,
                    cod_fee: Money::ZERO,
                    voucher_discount: Money::ZERO,
                    total: Money::ZERO,
                    delivery: DeliverySnapshot {
                        recipient_name: "seed".to_string(),
                        phone: "6280000000000".to_string(),
                        delivery_type: DeliveryType::Pickup,
                        address: None,
                        lat: None,
                        lng: None,
                    },
                    distance_km: None,
                    confirmation_deadline: None,
                    idempotency_key: id.to_string(),
                    created_at,
                },
            );
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order, lines: Vec<OrderLine>) -> Result<OrderId> {
        let id = order.id;
        let key = order.idempotency_key.clone();
        self.orders.write().await.insert(id, order);
        self.lines.write().await.insert(id, lines);
        self.by_key.write().await.insert(key, id);
        Ok(id)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn lines(&self, id: OrderId) -> Result<Vec<OrderLine>> {
        Ok(self.lines.read().await.get(&id).cloned().unwrap_or_default())
    }

    async fn count_for_seller_since(
        &self,
        seller_id: SellerId,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.seller_id == seller_id && o.created_at >= since)
            .count() as u64)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<OrderId>> {
        Ok(self.by_key.read().await.get(key).copied())
    }
}

/// Platform settings backed by a plain value, with a read counter so tests
/// can observe cache behavior.
pub struct InMemorySettingsStore {
    limit: RwLock<u32>,
    reads: AtomicUsize,
}

impl InMemorySettingsStore {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: RwLock::new(limit),
            reads: AtomicUsize::new(0),
        }
    }

    pub async fn set_limit(&self, limit: u32) {
        *self.limit.write().await = limit;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn free_tier_limit(&self) -> Result<u32> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(*self.limit.read().await)
    }
}

/// Captures notifications instead of pushing them anywhere. Can be told to
/// fail the next send to exercise the best-effort contract.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<Notification>>,
    fail_next: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }

    pub async fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CheckoutError::persistence(
                PersistenceKind::Other,
                "push channel unavailable",
            ));
        }
        self.sent.write().await.push(notification);
        Ok(())
    }
}

/// Deterministic invoice issuer: returns a hosted-payment URL derived from
/// the order id.
pub struct StaticInvoiceIssuer {
    base_url: String,
}

impl StaticInvoiceIssuer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InvoiceIssuer for StaticInvoiceIssuer {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice> {
        Ok(Invoice {
            invoice_url: format!("{}/invoices/{}", self.base_url, request.order_id),
        })
    }
}
