use crate::application::ledger::{QuotaLedger, ReadFallback};
use crate::config::AppConfig;
use crate::domain::cart::{BuyerId, Cart, OrderDraft};
use crate::domain::delivery::DeliveryDetails;
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderId, OrderLine, OrderParts, PaymentMethod};
use crate::domain::ports::{
    BuyerStoreRef, ClockRef, InvoiceIssuerRef, InvoiceRequest, Notification,
    NotificationDispatcherRef, NotificationKind, OrderStoreRef, SellerStoreRef,
};
use crate::domain::quota::QuotaStatus;
use crate::domain::risk::{self, BuyerCodProfile, CodSettings, PaymentOptions};
use crate::domain::seller::{Seller, SellerId};
use crate::domain::shipping::{DeliveryType, ShippingPolicy, compute_shipping};
use crate::error::{CheckoutError, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Upper bound on a single cart line's quantity, enforced before any order
/// is written. Keeps the per-order credit charge within `u32`.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// A complete checkout submission.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub buyer_id: BuyerId,
    pub payer_email: Option<String>,
    pub cart: Cart,
    pub payment_method: PaymentMethod,
    pub delivery: DeliveryDetails,
    /// Per-seller voucher discounts already resolved by the caller.
    pub vouchers: HashMap<SellerId, Money>,
}

/// Result of a successful (or partially redirected) checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub order_ids: Vec<OrderId>,
    pub redirect_url: Option<String>,
    /// True only when every seller's order was created; the caller clears the
    /// client-side cart iff this is set.
    pub cart_cleared: bool,
}

/// Pre-checkout admission picture for a set of sellers.
#[derive(Debug, Clone)]
pub struct AdmissionReport {
    pub blocked: Vec<SellerId>,
    pub statuses: HashMap<SellerId, QuotaStatus>,
}

/// The top-level checkout workflow.
///
/// Validates the cart, partitions it per seller, and drives the quota ledger,
/// risk gate and fare calculator to create one persisted order per seller.
/// Sellers are processed strictly sequentially in cart-iteration order:
/// the online-gateway early return and the no-rollback partial-failure
/// semantics both depend on that ordering.
pub struct CheckoutOrchestrator {
    sellers: SellerStoreRef,
    buyers: BuyerStoreRef,
    orders: OrderStoreRef,
    ledger: QuotaLedger,
    invoices: Option<InvoiceIssuerRef>,
    notifier: NotificationDispatcherRef,
    clock: ClockRef,
    shipping: ShippingPolicy,
    cod: CodSettings,
}

impl CheckoutOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sellers: SellerStoreRef,
        buyers: BuyerStoreRef,
        orders: OrderStoreRef,
        ledger: QuotaLedger,
        invoices: Option<InvoiceIssuerRef>,
        notifier: NotificationDispatcherRef,
        clock: ClockRef,
        config: &AppConfig,
    ) -> Self {
        Self {
            sellers,
            buyers,
            orders,
            ledger,
            invoices,
            notifier,
            clock,
            shipping: config.shipping.clone(),
            cod: config.cod.clone(),
        }
    }

    /// Quota admission picture for the given sellers, fail-closed.
    pub async fn check_admission(&self, seller_ids: &[SellerId]) -> Result<AdmissionReport> {
        let mut blocked = Vec::new();
        let mut statuses = HashMap::new();
        for &id in seller_ids {
            let status = self.ledger.status(id).await?;
            if !status.is_available() {
                blocked.push(id);
            }
            statuses.insert(id, status);
        }
        Ok(AdmissionReport { blocked, statuses })
    }

    /// Payment methods currently offerable for this buyer/seller/amount.
    pub async fn evaluate_payment_options(
        &self,
        buyer_id: BuyerId,
        seller_id: SellerId,
        amount: Money,
        distance_km: Option<Decimal>,
    ) -> Result<PaymentOptions> {
        let buyer = self.require_buyer(buyer_id).await?;
        let seller = self.require_seller(seller_id).await?;
        Ok(risk::payment_options(
            &buyer,
            &seller,
            &self.cod,
            amount,
            distance_km,
            self.invoices.is_some(),
        ))
    }

    /// Shipping quote. Pass a policy to quote against a candidate fee table
    /// (e.g. previewing a config change); `None` uses the active one.
    pub fn quote_shipping(
        &self,
        delivery_type: DeliveryType,
        distance_km: Option<Decimal>,
        policy: Option<&ShippingPolicy>,
    ) -> Money {
        compute_shipping(delivery_type, distance_km, policy.unwrap_or(&self.shipping))
    }

    /// Runs the full checkout: validation, admission, then one persisted order
    /// per seller.
    ///
    /// Orders committed before a mid-loop failure stay committed; the error is
    /// surfaced and the cart is left intact for the buyer to retry. A retry of
    /// the identical cart reuses already-committed orders via their
    /// idempotency keys instead of duplicating them.
    pub async fn submit_checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt> {
        // Step 1: fail-closed validation, no mutation yet.
        if request.cart.is_empty() {
            return Err(CheckoutError::validation("cart is empty"));
        }
        if request.buyer_id.is_nil() || request.cart.buyer_id != request.buyer_id {
            return Err(CheckoutError::validation("buyer identity missing"));
        }
        for line in &request.cart.lines {
            if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
                return Err(CheckoutError::validation(format!(
                    "line quantity must be between 1 and {MAX_LINE_QUANTITY}"
                )));
            }
        }
        let buyer = self.require_buyer(request.buyer_id).await?;
        let normalized_phone = request.delivery.validate(request.payment_method)?;

        let seller_ids = request.cart.seller_ids();
        let mut sellers: HashMap<SellerId, Seller> = HashMap::new();
        for &id in &seller_ids {
            sellers.insert(id, self.require_seller(id).await?);
        }

        let now = self.clock.now();
        let closed: Vec<&Seller> = seller_ids
            .iter()
            .filter_map(|id| sellers.get(id))
            .filter(|s| !s.accepts_orders_at(now.time()))
            .collect();
        if let Some(seller) = closed.first() {
            return Err(CheckoutError::AdmissionBlocked(format!(
                "seller \"{}\" is currently closed",
                seller.name
            )));
        }

        let mut quota_violators = Vec::new();
        for &id in &seller_ids {
            if !self.ledger.has_active_quota(id, ReadFallback::Closed).await? {
                quota_violators.push(id);
            }
        }
        if !quota_violators.is_empty() {
            let names: Vec<String> = quota_violators
                .iter()
                .filter_map(|id| sellers.get(id))
                .map(|s| s.name.clone())
                .collect();
            return Err(CheckoutError::AdmissionBlocked(format!(
                "sellers out of transaction quota: {}",
                names.join(", ")
            )));
        }

        // Steps 2-3: partition and process sellers sequentially.
        let drafts = request.cart.partition();
        let mut order_ids = Vec::with_capacity(drafts.len());

        for draft in &drafts {
            // Retry of an identical cart: reuse the committed order.
            if let Some(existing) = self
                .orders
                .find_by_idempotency_key(&draft.idempotency_key)
                .await?
            {
                tracing::info!(order_id = %existing, seller_id = %draft.seller_id,
                    "order already committed for this cart, skipping");
                order_ids.push(existing);
                continue;
            }

            let seller = sellers
                .get(&draft.seller_id)
                .ok_or_else(|| CheckoutError::validation("unknown seller in draft"))?;

            let created = self
                .process_draft(&request, &buyer, seller, draft, &normalized_phone)
                .await?;
            order_ids.push(created.order_id);

            // Step 3g: the hosted gateway can only invoice one order per
            // redirect, so processing stops at the first online invoice.
            if let Some(url) = created.invoice_url {
                tracing::warn!(
                    remaining_sellers = drafts.len() - order_ids.len(),
                    "online payment redirect issued before all sellers were processed"
                );
                return Ok(CheckoutReceipt {
                    order_ids,
                    redirect_url: Some(url),
                    cart_cleared: false,
                });
            }
        }

        // Step 4: full success.
        let redirect_url = (request.payment_method == PaymentMethod::Transfer).then(|| {
            let ids: Vec<String> = order_ids.iter().map(OrderId::to_string).collect();
            format!("/payment/confirm?orders={}", ids.join(","))
        });
        Ok(CheckoutReceipt {
            order_ids,
            redirect_url,
            cart_cleared: true,
        })
    }

    async fn process_draft(
        &self,
        request: &CheckoutRequest,
        buyer: &BuyerCodProfile,
        seller: &Seller,
        draft: &OrderDraft,
        normalized_phone: &str,
    ) -> Result<CreatedOrder> {
        let now = self.clock.now();
        let subtotal = draft.subtotal();
        let distance_km = request.delivery.distance_km;
        let shipping_cost =
            compute_shipping(request.delivery.delivery_type, distance_km, &self.shipping);

        let method = self.effective_method(request, buyer, seller, subtotal, distance_km)?;
        let cod_fee = if method == PaymentMethod::Cod {
            self.cod.flat_fee
        } else {
            Money::ZERO
        };
        let confirmation_deadline = (method == PaymentMethod::Cod)
            .then(|| now + Duration::minutes(self.cod.confirmation_timeout_minutes));
        let voucher_discount = request
            .vouchers
            .get(&draft.seller_id)
            .copied()
            .unwrap_or(Money::ZERO);

        let order = Order::build(
            OrderParts {
                buyer_id: request.buyer_id,
                seller_id: draft.seller_id,
                payment_method: method,
                subtotal,
                shipping_cost,
                cod_fee,
                voucher_discount,
                delivery: request.delivery.snapshot(normalized_phone.to_string()),
                distance_km,
                confirmation_deadline,
                idempotency_key: draft.idempotency_key.clone(),
            },
            now,
        )?;
        let total = order.total;
        let lines: Vec<OrderLine> = draft
            .lines
            .iter()
            .map(|l| OrderLine::from_cart_line(order.id, l))
            .collect();

        // Steps 3c-3d: persist, then debit quota.
        let order_id = self.orders.create(order, lines).await?;
        tracing::info!(%order_id, seller_id = %draft.seller_id, %total, ?method, "order created");

        let credits_total: u64 = draft
            .lines
            .iter()
            .map(|l| u64::from(self.ledger.credit_cost(l.unit_price.into())) * u64::from(l.quantity))
            .sum();
        let credits_to_use = u32::try_from(credits_total).map_err(|_| {
            CheckoutError::validation("credit charge for this order is too large")
        })?;
        self.ledger.consume(draft.seller_id, credits_to_use).await?;

        // Step 3e: best-effort "new order" push to the seller.
        let notification = Notification {
            user_id: draft.seller_id,
            title: "New order received".to_string(),
            message: format!("{} placed an order totalling {total}", buyer_label(request)),
            kind: NotificationKind::NewOrder,
            link: Some(format!("/seller/orders/{order_id}")),
        };
        if let Err(err) = self.notifier.send(notification).await {
            tracing::warn!(%order_id, error = %err, "new-order notification dispatch failed");
        }

        // Step 3g: hosted invoice for online payments.
        let invoice_url = if method == PaymentMethod::Online {
            let issuer = self.invoices.as_ref().ok_or_else(|| {
                CheckoutError::PaymentGateway("no online payment gateway configured".to_string())
            })?;
            let invoice = issuer
                .create_invoice(InvoiceRequest {
                    order_id,
                    amount: total,
                    payer_email: request.payer_email.clone(),
                    description: format!("Order at {}", seller.name),
                })
                .await?;
            Some(invoice.invoice_url)
        } else {
            None
        };

        Ok(CreatedOrder {
            order_id,
            invoice_url,
        })
    }

    /// Resolves the payment method actually used for one seller's order.
    ///
    /// COD that fails the risk gate falls back to transfer, then the online
    /// gateway; with neither available there is no safe default and the
    /// checkout is rejected.
    fn effective_method(
        &self,
        request: &CheckoutRequest,
        buyer: &BuyerCodProfile,
        seller: &Seller,
        amount: Money,
        distance_km: Option<Decimal>,
    ) -> Result<PaymentMethod> {
        let online_available = self.invoices.is_some();
        match request.payment_method {
            PaymentMethod::Cod => {
                let decision = risk::evaluate_cod(buyer, seller, &self.cod, amount, distance_km);
                if decision.eligible {
                    Ok(PaymentMethod::Cod)
                } else {
                    let reason = decision.reason.unwrap_or_default();
                    tracing::info!(seller_id = %seller.id, %reason, "COD refused, reselecting method");
                    risk::select_fallback(seller, online_available).ok_or_else(|| {
                        CheckoutError::validation(format!(
                            "COD unavailable ({reason}) and seller \"{}\" offers no other payment method",
                            seller.name
                        ))
                    })
                }
            }
            PaymentMethod::Transfer => {
                if seller.transfer_enabled {
                    Ok(PaymentMethod::Transfer)
                } else {
                    Err(CheckoutError::validation(format!(
                        "seller \"{}\" does not accept bank transfer",
                        seller.name
                    )))
                }
            }
            PaymentMethod::Online => {
                if online_available {
                    Ok(PaymentMethod::Online)
                } else {
                    Err(CheckoutError::validation(
                        "online payment is not available right now",
                    ))
                }
            }
        }
    }

    async fn require_buyer(&self, buyer_id: BuyerId) -> Result<BuyerCodProfile> {
        self.buyers
            .cod_profile(buyer_id)
            .await?
            .ok_or_else(|| CheckoutError::validation("unknown buyer"))
    }

    async fn require_seller(&self, seller_id: SellerId) -> Result<Seller> {
        self.sellers
            .get(seller_id)
            .await?
            .ok_or_else(|| CheckoutError::validation(format!("unknown seller {seller_id}")))
    }
}

struct CreatedOrder {
    order_id: OrderId,
    invoice_url: Option<String>,
}

fn buyer_label(request: &CheckoutRequest) -> String {
    request
        .delivery
        .recipient_name
        .trim()
        .to_string()
}
