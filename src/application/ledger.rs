use crate::config::QuotaConfig;
use crate::domain::money::Money;
use crate::domain::ports::{
    ClockRef, CreditStoreRef, Notification, NotificationDispatcherRef, NotificationKind,
    OrderStoreRef, SettingsStoreRef,
};
use crate::domain::quota::{self, CreditTier, QuotaStatus};
use crate::domain::seller::SellerId;
use crate::error::Result;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Mutex;

/// What to assume when the quota state cannot be read.
///
/// The pricing/catalog read path fails open (assume quota is available so a
/// transient store error does not hide listings); the checkout admission path
/// fails closed (block the checkout). The asymmetry is deliberate: a wrongly
/// hidden listing is an annoyance, a wrongly admitted sale consumes quota that
/// was never there. The listing/display surface that reads with `Open` lives
/// outside this crate; everything in here admits with `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFallback {
    Open,
    Closed,
}

/// Single-value cache with a time-to-live, driven by an injected clock so
/// tests can force expiry deterministically.
pub struct TtlCache<T> {
    slot: Mutex<Option<(T, DateTime<Utc>)>>,
    ttl: Duration,
}

impl<T: Copy> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn get(&self, now: DateTime<Utc>) -> Option<T> {
        let slot = self.slot.lock().ok()?;
        match *slot {
            Some((value, stored_at)) if now - stored_at < self.ttl => Some(value),
            _ => None,
        }
    }

    pub fn put(&self, value: T, now: DateTime<Utc>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some((value, now));
        }
    }
}

/// First instant of the calendar month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let first = chrono::Datelike::with_day(&date, 1).unwrap_or(date);
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Tracks whether a seller may accept a new transaction and debits
/// consumption after a sale.
///
/// A seller holding one or more credit rows is subscription-bound: the summed
/// remaining balance of ACTIVE, non-expired rows decides admission. A seller
/// with zero rows is on the free tier: orders created since the start of the
/// current calendar month are counted against the platform-wide limit.
pub struct QuotaLedger {
    credits: CreditStoreRef,
    orders: OrderStoreRef,
    settings: SettingsStoreRef,
    notifier: NotificationDispatcherRef,
    clock: ClockRef,
    tiers: Vec<CreditTier>,
    low_water_mark: i64,
    limit_cache: TtlCache<u32>,
}

impl QuotaLedger {
    pub fn new(
        credits: CreditStoreRef,
        orders: OrderStoreRef,
        settings: SettingsStoreRef,
        notifier: NotificationDispatcherRef,
        clock: ClockRef,
        config: &QuotaConfig,
    ) -> Self {
        Self {
            credits,
            orders,
            settings,
            notifier,
            clock,
            tiers: config.tiers.clone(),
            low_water_mark: config.low_water_mark,
            limit_cache: TtlCache::new(Duration::seconds(config.settings_ttl_secs as i64)),
        }
    }

    /// The seller's current quota standing.
    pub async fn status(&self, seller_id: SellerId) -> Result<QuotaStatus> {
        let now = self.clock.now();
        if self.credits.has_rows(seller_id).await? {
            let remaining: i64 = self
                .credits
                .active_credits(seller_id, now)
                .await?
                .iter()
                .map(|c| c.remaining())
                .sum();
            return Ok(QuotaStatus::Subscription { remaining });
        }

        let limit = self.free_tier_limit().await?;
        let used_this_month = self
            .orders
            .count_for_seller_since(seller_id, month_start(now))
            .await?;
        Ok(QuotaStatus::FreeTier {
            used_this_month,
            limit,
        })
    }

    /// Whether the seller may accept a new transaction right now.
    pub async fn has_active_quota(
        &self,
        seller_id: SellerId,
        fallback: ReadFallback,
    ) -> Result<bool> {
        match self.status(seller_id).await {
            Ok(status) => Ok(status.is_available()),
            Err(err) => match fallback {
                ReadFallback::Open => {
                    tracing::warn!(%seller_id, error = %err, "quota read failed, assuming available");
                    Ok(true)
                }
                ReadFallback::Closed => Err(err),
            },
        }
    }

    /// Credit cost for one unit at the given price.
    pub fn credit_cost(&self, unit_price: Money) -> u32 {
        quota::credit_cost(unit_price, &self.tiers)
    }

    /// Debits consumption after a sale and fires low/empty signals.
    ///
    /// Subscription-bound sellers are debited in one atomic store operation;
    /// the aggregate balance may end up negative when the sale was admitted
    /// shortly before the balance ran out — the deficit is recorded and the
    /// empty signal fired. Free-tier sellers are a no-op: their consumption is
    /// implicit in the monthly order count.
    pub async fn consume(&self, seller_id: SellerId, credits: u32) -> Result<()> {
        if credits == 0 {
            return Ok(());
        }
        if !self.credits.has_rows(seller_id).await? {
            return Ok(());
        }

        let remaining = self
            .credits
            .debit(seller_id, credits, self.clock.now())
            .await?;
        tracing::debug!(%seller_id, credits, remaining, "quota debited");

        if remaining <= 0 {
            self.notify_best_effort(
                seller_id,
                NotificationKind::QuotaEmpty,
                "Transaction quota exhausted",
                "Your credits are used up. Purchase a package to keep receiving orders.",
            )
            .await;
        } else if remaining <= self.low_water_mark {
            self.notify_best_effort(
                seller_id,
                NotificationKind::QuotaLow,
                "Transaction quota running low",
                &format!("Only {remaining} credits left. Consider topping up soon."),
            )
            .await;
        }
        Ok(())
    }

    async fn notify_best_effort(
        &self,
        seller_id: SellerId,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) {
        let notification = Notification {
            user_id: seller_id,
            title: title.to_string(),
            message: message.to_string(),
            kind,
            link: Some("/seller/subscription".to_string()),
        };
        if let Err(err) = self.notifier.send(notification).await {
            tracing::warn!(%seller_id, error = %err, "quota notification dispatch failed");
        }
    }

    async fn free_tier_limit(&self) -> Result<u32> {
        let now = self.clock.now();
        if let Some(limit) = self.limit_cache.get(now) {
            return Ok(limit);
        }
        let limit = self.settings.free_tier_limit().await?;
        self.limit_cache.put(limit, now);
        Ok(limit)
    }
}
