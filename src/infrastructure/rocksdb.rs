use crate::domain::order::{Order, OrderId, OrderLine};
use crate::domain::ports::{CreditStore, OrderStore};
use crate::domain::quota::SubscriptionCredit;
use crate::domain::seller::SellerId;
use crate::error::{CheckoutError, PersistenceKind, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for subscription credit rows, keyed `{seller_id}/{credit_id}`.
pub const CF_CREDITS: &str = "credits";
/// Column Family for orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family for order lines, keyed by order id.
pub const CF_ORDER_LINES: &str = "order_lines";
/// Column Family mapping idempotency keys to order ids.
pub const CF_ORDER_KEYS: &str = "order_keys";

/// A persistent store implementation using RocksDB.
///
/// Backs both `CreditStore` and `OrderStore` with separate Column Families,
/// so free-tier counts, credit balances and idempotency keys survive process
/// restarts.
///
/// `Clone` shares the underlying `Arc<DB>`. Credit debits are serialized
/// through `debit_lock` so the read-modify-write is atomic across tasks.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
    debit_lock: Arc<Mutex<()>>,
}

impl RocksStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_CREDITS, CF_ORDERS, CF_ORDER_LINES, CF_ORDER_KEYS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(db_err)?;

        Ok(Self {
            db: Arc::new(db),
            debit_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Inserts a credit row only if it is not already present, so re-seeding
    /// from a fixture does not reset consumption recorded in earlier runs.
    pub fn seed_credit(&self, credit: &SubscriptionCredit) -> Result<()> {
        let cf = self.cf(CF_CREDITS)?;
        let key = credit_key(credit.seller_id, credit.id);
        if self.db.get_pinned_cf(&cf, &key).map_err(db_err)?.is_none() {
            let value = serde_json::to_vec(credit).map_err(codec_err)?;
            self.db.put_cf(&cf, key, value).map_err(db_err)?;
        }
        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            CheckoutError::persistence(
                PersistenceKind::Other,
                format!("column family {name} not found"),
            )
        })
    }

    fn credits_for(&self, seller_id: SellerId) -> Result<Vec<SubscriptionCredit>> {
        let cf = self.cf(CF_CREDITS)?;
        let prefix = seller_prefix(seller_id);
        let mut rows = Vec::new();
        let iter = self.db.iterator_cf(
            &cf,
            rocksdb::IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );
        for item in iter {
            let (key, value) = item.map_err(db_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            rows.push(serde_json::from_slice(&value).map_err(codec_err)?);
        }
        Ok(rows)
    }

    fn put_credit(&self, credit: &SubscriptionCredit) -> Result<()> {
        let cf = self.cf(CF_CREDITS)?;
        let key = credit_key(credit.seller_id, credit.id);
        let value = serde_json::to_vec(credit).map_err(codec_err)?;
        self.db.put_cf(&cf, key, value).map_err(db_err)
    }
}

fn credit_key(seller_id: SellerId, credit_id: uuid::Uuid) -> Vec<u8> {
    let mut key = seller_prefix(seller_id);
    key.extend_from_slice(credit_id.as_bytes());
    key
}

fn seller_prefix(seller_id: SellerId) -> Vec<u8> {
    let mut prefix = seller_id.as_bytes().to_vec();
    prefix.push(b'/');
    prefix
}

fn db_err(e: rocksdb::Error) -> CheckoutError {
    CheckoutError::persistence(PersistenceKind::Other, e.to_string())
}

fn codec_err(e: serde_json::Error) -> CheckoutError {
    CheckoutError::persistence(PersistenceKind::Other, format!("codec error: {e}"))
}

#[async_trait]
impl CreditStore for RocksStore {
    async fn has_rows(&self, seller_id: SellerId) -> Result<bool> {
        Ok(!self.credits_for(seller_id)?.is_empty())
    }

    async fn active_credits(
        &self,
        seller_id: SellerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionCredit>> {
        Ok(self
            .credits_for(seller_id)?
            .into_iter()
            .filter(|c| c.is_usable(now))
            .collect())
    }

    async fn debit(&self, seller_id: SellerId, credits: u32, now: DateTime<Utc>) -> Result<i64> {
        let _guard = self.debit_lock.lock().await;

        let mut rows = self.credits_for(seller_id)?;
        if rows.is_empty() {
            return Err(CheckoutError::persistence(
                PersistenceKind::ForeignKeyViolation,
                format!("no credit rows for seller {seller_id}"),
            ));
        }

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
            self.put_credit(&rows[idx])?;
            if to_debit == 0 {
                break;
            }
        }

        Ok(rows
            .iter()
            .filter(|c| c.is_usable(now))
            .map(SubscriptionCredit::remaining)
            .sum())
    }
}

#[async_trait]
impl OrderStore for RocksStore {
    async fn create(&self, order: Order, lines: Vec<OrderLine>) -> Result<OrderId> {
        let id = order.id;

        let cf = self.cf(CF_ORDERS)?;
        let value = serde_json::to_vec(&order).map_err(codec_err)?;
        self.db.put_cf(&cf, id.as_bytes(), value).map_err(db_err)?;

        let cf = self.cf(CF_ORDER_LINES)?;
        let value = serde_json::to_vec(&lines).map_err(codec_err)?;
        self.db.put_cf(&cf, id.as_bytes(), value).map_err(db_err)?;

        let cf = self.cf(CF_ORDER_KEYS)?;
        self.db
            .put_cf(&cf, order.idempotency_key.as_bytes(), id.as_bytes())
            .map_err(db_err)?;

        Ok(id)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        match self.db.get_cf(&cf, id.as_bytes()).map_err(db_err)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(codec_err)?)),
            None => Ok(None),
        }
    }

    async fn lines(&self, id: OrderId) -> Result<Vec<OrderLine>> {
        let cf = self.cf(CF_ORDER_LINES)?;
        match self.db.get_cf(&cf, id.as_bytes()).map_err(db_err)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes).map_err(codec_err)?),
            None => Ok(Vec::new()),
        }
    }

    async fn count_for_seller_since(
        &self,
        seller_id: SellerId,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let cf = self.cf(CF_ORDERS)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item.map_err(db_err)?;
            let order: Order = serde_json::from_slice(&value).map_err(codec_err)?;
            if order.seller_id == seller_id && order.created_at >= since {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<OrderId>> {
        let cf = self.cf(CF_ORDER_KEYS)?;
        match self.db.get_cf(&cf, key.as_bytes()).map_err(db_err)? {
            Some(bytes) => {
                let id = OrderId::from_slice(&bytes).map_err(|e| {
                    CheckoutError::persistence(
                        PersistenceKind::Other,
                        format!("corrupt order key index: {e}"),
                    )
                })?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }
}
