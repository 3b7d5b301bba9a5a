use crate::domain::quota::SubscriptionCredit;
use crate::domain::risk::BuyerCodProfile;
use crate::domain::seller::Seller;
use crate::error::{CheckoutError, Result};
use crate::infrastructure::in_memory::{
    InMemoryBuyerStore, InMemoryCreditStore, InMemorySellerStore, InMemorySettingsStore,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Seed data for the CLI: the sellers, credit rows and buyer profiles a
/// checkout runs against. Loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldFixture {
    pub sellers: Vec<Seller>,
    pub credits: Vec<SubscriptionCredit>,
    pub buyers: Vec<BuyerCodProfile>,
    pub free_tier_limit: Option<u32>,
}

/// The in-memory stores a fixture seeds.
pub struct SeededStores {
    pub sellers: Arc<InMemorySellerStore>,
    pub buyers: Arc<InMemoryBuyerStore>,
    pub credits: Arc<InMemoryCreditStore>,
    pub settings: Arc<InMemorySettingsStore>,
}

impl WorldFixture {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CheckoutError::validation(format!("cannot read fixture: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| CheckoutError::validation(format!("invalid fixture: {e}")))
    }

    pub async fn seed(&self) -> SeededStores {
        let stores = SeededStores {
            sellers: Arc::new(InMemorySellerStore::new()),
            buyers: Arc::new(InMemoryBuyerStore::new()),
            credits: Arc::new(InMemoryCreditStore::new()),
            settings: Arc::new(InMemorySettingsStore::new(self.free_tier_limit.unwrap_or(100))),
        };
        for seller in &self.sellers {
            stores.sellers.insert(seller.clone()).await;
        }
        for credit in &self.credits {
            stores.credits.insert(credit.clone()).await;
        }
        for buyer in &self.buyers {
            stores.buyers.insert(buyer.clone()).await;
        }
        stores
    }
}
