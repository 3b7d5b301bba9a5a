use lapak_checkout::domain::quota::{CreditStatus, SubscriptionCredit};
use lapak_checkout::domain::risk::BuyerCodProfile;
use lapak_checkout::domain::seller::{OperatingHours, Seller};
use lapak_checkout::interfaces::fixture::WorldFixture;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use uuid::Uuid;

/// Writes a world fixture with one always-open seller, one trusted buyer and
/// a subscription credit row holding `quota` minus `used` remaining credits.
pub fn write_world(
    path: &Path,
    seller_id: Uuid,
    buyer_id: Uuid,
    quota: i64,
    used: i64,
) -> Result<(), Error> {
    let fixture = WorldFixture {
        sellers: vec![Seller {
            id: seller_id,
            name: "Warung Bu Sri".to_string(),
            is_open: true,
            hours: OperatingHours {
                open: "00:00:00".parse().unwrap(),
                close: "00:00:00".parse().unwrap(),
            },
            cod_enabled: true,
            transfer_enabled: true,
            bank_account: Some("BCA 5220018".to_string()),
            qris_payload: None,
        }],
        credits: vec![SubscriptionCredit {
            id: Uuid::new_v4(),
            seller_id,
            quota,
            used,
            expires_at: "2030-01-01T00:00:00Z".parse().unwrap(),
            status: CreditStatus::Active,
        }],
        buyers: vec![BuyerCodProfile {
            buyer_id,
            trust_score: 80,
            verified: true,
            cod_enabled: true,
        }],
        free_tier_limit: None,
    };
    std::fs::write(path, serde_json::to_string_pretty(&fixture)?)
}

/// Writes a single-seller cart CSV with `rows` lines at the given unit price.
pub fn write_cart(path: &Path, seller_id: Uuid, unit_price: &str, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["product_id", "product_name", "seller_id", "unit_price", "quantity"])?;
    for i in 0..rows {
        wtr.write_record([
            Uuid::new_v4().to_string().as_str(),
            &format!("Keripik Singkong {i}"),
            seller_id.to_string().as_str(),
            unit_price,
            "1",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
