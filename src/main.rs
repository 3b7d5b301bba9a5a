use clap::{Parser, ValueEnum};
use lapak_checkout::application::checkout::{CheckoutOrchestrator, CheckoutRequest};
use lapak_checkout::application::ledger::QuotaLedger;
use lapak_checkout::config::AppConfig;
use lapak_checkout::domain::cart::Cart;
use lapak_checkout::domain::delivery::{Address, DeliveryDetails, GeoPoint};
use lapak_checkout::domain::order::{Order, OrderStatus, PaymentMethod};
use lapak_checkout::domain::ports::{CreditStoreRef, InvoiceIssuerRef, OrderStoreRef};
use lapak_checkout::domain::shipping::DeliveryType;
use lapak_checkout::infrastructure::clock::SystemClock;
use lapak_checkout::infrastructure::in_memory::{InMemoryOrderStore, StaticInvoiceIssuer};
use lapak_checkout::interfaces::csv::cart_reader::CartReader;
use lapak_checkout::interfaces::fixture::WorldFixture;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    Cod,
    Transfer,
    Online,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeliveryArg {
    Pickup,
    Delivery,
}

/// Runs a checkout against a seeded marketplace world.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cart lines CSV (product_id, product_name, seller_id, unit_price, quantity)
    cart: PathBuf,

    /// World fixture JSON with sellers, credits and buyer profiles
    #[arg(long)]
    world: PathBuf,

    /// Buyer id (must exist in the world fixture)
    #[arg(long)]
    buyer: Uuid,

    #[arg(long, value_enum)]
    method: MethodArg,

    #[arg(long, value_enum, default_value = "delivery")]
    delivery_type: DeliveryArg,

    /// Full-cart distance in km, as resolved by the location service
    #[arg(long)]
    distance_km: Option<Decimal>,

    #[arg(long)]
    name: String,

    #[arg(long)]
    phone: String,

    #[arg(long)]
    province: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    district: Option<String>,

    #[arg(long)]
    village: Option<String>,

    #[arg(long)]
    street: Option<String>,

    #[arg(long)]
    lat: Option<f64>,

    #[arg(long)]
    lng: Option<f64>,

    #[arg(long)]
    payer_email: Option<String>,

    /// Base URL of the hosted payment gateway; enables the online method
    #[arg(long)]
    gateway_url: Option<String>,

    /// Path to persistent order/credit database (optional). If provided,
    /// uses RocksDB so free-tier counts and idempotency survive restarts.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().into_diagnostic()?;

    let fixture = WorldFixture::from_file(&cli.world).into_diagnostic()?;
    let stores = fixture.seed().await;

    let file = File::open(&cli.cart).into_diagnostic()?;
    let lines = CartReader::new(file)
        .lines()
        .collect::<lapak_checkout::error::Result<Vec<_>>>()
        .into_diagnostic()?;
    let cart = Cart::new(cli.buyer, lines);

    let clock = Arc::new(SystemClock);
    let issuer: Option<InvoiceIssuerRef> = cli
        .gateway_url
        .as_deref()
        .map(|url| Arc::new(StaticInvoiceIssuer::new(url)) as InvoiceIssuerRef);

    #[cfg(feature = "storage-rocksdb")]
    let (order_store, credit_store): (OrderStoreRef, CreditStoreRef) =
        if let Some(db_path) = &cli.db_path {
            let store = lapak_checkout::infrastructure::rocksdb::RocksStore::open(db_path)
                .into_diagnostic()?;
            for credit in &fixture.credits {
                store.seed_credit(credit).into_diagnostic()?;
            }
            (Arc::new(store.clone()), Arc::new(store))
        } else {
            (Arc::new(InMemoryOrderStore::new()), stores.credits.clone())
        };
    #[cfg(not(feature = "storage-rocksdb"))]
    let (order_store, credit_store): (OrderStoreRef, CreditStoreRef) = {
        if cli.db_path.is_some() {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' \
                 feature is not enabled. Falling back to in-memory storage."
            );
        }
        (Arc::new(InMemoryOrderStore::new()), stores.credits.clone())
    };

    let notifier = Arc::new(lapak_checkout::infrastructure::notify::TracingNotifier);
    let ledger = QuotaLedger::new(
        credit_store,
        order_store.clone(),
        stores.settings.clone(),
        notifier.clone(),
        clock.clone(),
        &config.quota,
    );
    let orchestrator = CheckoutOrchestrator::new(
        stores.sellers.clone(),
        stores.buyers.clone(),
        order_store.clone(),
        ledger,
        issuer,
        notifier,
        clock,
        &config,
    );

    let request = CheckoutRequest {
        buyer_id: cli.buyer,
        payer_email: cli.payer_email.clone(),
        cart,
        payment_method: match cli.method {
            MethodArg::Cod => PaymentMethod::Cod,
            MethodArg::Transfer => PaymentMethod::Transfer,
            MethodArg::Online => PaymentMethod::Online,
        },
        delivery: delivery_details(&cli),
        vouchers: Default::default(),
    };

    match orchestrator.submit_checkout(request).await {
        Ok(receipt) => {
            for id in &receipt.order_ids {
                if let Some(order) = order_store.get(*id).await.into_diagnostic()? {
                    println!("{}", order_line(&order));
                }
            }
            if let Some(url) = &receipt.redirect_url {
                println!("redirect: {url}");
            }
            if receipt.cart_cleared {
                println!("cart cleared");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            Err(err).into_diagnostic()
        }
    }
}

fn delivery_details(cli: &Cli) -> DeliveryDetails {
    let address = cli.village.as_ref().map(|village| Address {
        province: cli.province.clone().unwrap_or_default(),
        city: cli.city.clone().unwrap_or_default(),
        district: cli.district.clone().unwrap_or_default(),
        village: village.clone(),
        street: cli.street.clone(),
    });
    let map_point = match (cli.lat, cli.lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };
    DeliveryDetails {
        recipient_name: cli.name.clone(),
        phone: cli.phone.clone(),
        delivery_type: match cli.delivery_type {
            DeliveryArg::Pickup => DeliveryType::Pickup,
            DeliveryArg::Delivery => DeliveryType::Delivery,
        },
        address,
        map_point,
        distance_km: cli.distance_km,
    }
}

fn order_line(order: &Order) -> String {
    let status = match order.status {
        OrderStatus::New => "NEW",
        OrderStatus::PendingConfirmation => "PENDING_CONFIRMATION",
        OrderStatus::PendingPayment => "PENDING_PAYMENT",
    };
    let method = match order.payment_method {
        PaymentMethod::Cod => "cod",
        PaymentMethod::Transfer => "transfer",
        PaymentMethod::Online => "online",
    };
    format!(
        "order {} seller={} method={method} status={status} subtotal={} shipping={} total={}",
        order.id,
        order.seller_id,
        order.subtotal,
        order.shipping_cost,
        order.total
    )
}
