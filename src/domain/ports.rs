use crate::domain::cart::BuyerId;
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderId, OrderLine};
use crate::domain::quota::SubscriptionCredit;
use crate::domain::risk::BuyerCodProfile;
use crate::domain::seller::{Seller, SellerId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait SellerStore: Send + Sync {
    async fn get(&self, id: SellerId) -> Result<Option<Seller>>;
}

#[async_trait]
pub trait BuyerStore: Send + Sync {
    async fn cod_profile(&self, id: BuyerId) -> Result<Option<BuyerCodProfile>>;
}

#[async_trait]
pub trait CreditStore: Send + Sync {
    /// Whether the seller holds any credit rows at all, regardless of balance
    /// or expiry. Decides subscription-bound vs free tier.
    async fn has_rows(&self, seller_id: SellerId) -> Result<bool>;

    /// ACTIVE, non-expired rows for the seller.
    async fn active_credits(
        &self,
        seller_id: SellerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionCredit>>;

    /// Debits `credits` from the seller's rows in one atomic operation and
    /// returns the aggregate remaining balance afterwards (may be negative).
    ///
    /// Implementations must perform the read-modify-write as a single unit;
    /// separate read and write calls would lose concurrent debits.
    async fn debit(&self, seller_id: SellerId, credits: u32, now: DateTime<Utc>) -> Result<i64>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the order, then its lines.
    async fn create(&self, order: Order, lines: Vec<OrderLine>) -> Result<OrderId>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    async fn lines(&self, id: OrderId) -> Result<Vec<OrderLine>>;

    /// Orders created for the seller at or after `since`. Backs the free-tier
    /// monthly counter.
    async fn count_for_seller_since(&self, seller_id: SellerId, since: DateTime<Utc>)
    -> Result<u64>;

    /// Retry safety: an order already committed under this key is reused
    /// instead of recreated.
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<OrderId>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Monthly order allowance for sellers without any subscription.
    async fn free_tier_limit(&self) -> Result<u32>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub payer_email: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub invoice_url: String,
}

/// Hosted payment invoice issuer (external gateway).
#[async_trait]
pub trait InvoiceIssuer: Send + Sync {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<Invoice>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    QuotaLow,
    QuotaEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}

/// Fire-and-forget push channel towards sellers. Failures are logged by the
/// caller and never propagate into checkout results.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<()>;
}

/// Injectable time source so TTL caches and deadlines are testable without
/// wall-clock sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SellerStoreRef = Arc<dyn SellerStore>;
pub type BuyerStoreRef = Arc<dyn BuyerStore>;
pub type CreditStoreRef = Arc<dyn CreditStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type SettingsStoreRef = Arc<dyn SettingsStore>;
pub type InvoiceIssuerRef = Arc<dyn InvoiceIssuer>;
pub type NotificationDispatcherRef = Arc<dyn NotificationDispatcher>;
pub type ClockRef = Arc<dyn Clock>;
