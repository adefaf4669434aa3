use super::{bounded, finish};
use crate::config::StorefrontSettings;
use crate::database::idempotency::{self, Claim, StoredRequest};
use crate::database::ledger::{self, NewLedgerEntry};
use crate::database::orders::{self, NewOrder};
use crate::database::{products, users, Database};
use crate::errors::{CheckoutEngineError, Result};
use crate::guard;
use crate::metrics;
use crate::models::{
    to_money, CartLine, CheckoutCommand, CheckoutConfirmation, CheckoutRequest, CustomerSnapshot,
    LedgerEntryKind, LineRequest, Order, OrderDetails, PaymentStatus, PricedCart, PricedLine,
    Product,
};
use crate::notifications::{self, NotificationPublisher, OrderEvent, OrderEventType};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;
const MAX_ORDER_LIST: u32 = 500;

/// Result of the atomic unit: a fresh order or a stored confirmation.
enum Placement {
    Created(CheckoutConfirmation),
    Replayed(CheckoutConfirmation),
}

pub struct CheckoutService {
    db: Arc<Database>,
    notifier: Option<Arc<NotificationPublisher>>,
    settings: StorefrontSettings,
}

impl CheckoutService {
    pub fn new(
        db: Arc<Database>,
        notifier: Option<Arc<NotificationPublisher>>,
        settings: StorefrontSettings,
    ) -> Self {
        CheckoutService {
            db,
            notifier,
            settings,
        }
    }

    /// Convert a cart into a persisted order and, for registered users, debit
    /// their balance. All writes happen in one transaction or not at all.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutConfirmation> {
        let started = Instant::now();
        let result = self.process(request).await;

        let outcome = match &result {
            Ok(confirmation) if confirmation.replayed => "replayed",
            Ok(_) => "committed",
            Err(CheckoutEngineError::InsufficientFunds { .. }) => "insufficient_funds",
            Err(CheckoutEngineError::CheckoutFailed { .. }) => "failed",
            Err(_) => "rejected",
        };
        metrics::CHECKOUTS_TOTAL.with_label_values(&[outcome]).inc();
        metrics::CHECKOUT_DURATION.observe(started.elapsed().as_secs_f64());

        result
    }

    async fn process(&self, request: CheckoutRequest) -> Result<CheckoutConfirmation> {
        let fingerprint = request_fingerprint(&request)?;
        let command = validate_request(request)?;

        let ids: Vec<i64> = command.lines.iter().map(|line| line.product_id).collect();
        let catalog = products::find_many(self.db.pool(), &ids)
            .await
            .map_err(|e| e.into_checkout_failure("checkout"))?;
        let cart = price_cart(
            &command.lines,
            &catalog,
            self.settings.shipping_fee,
            command.declared_total,
        )?;

        if cart.total != command.declared_total {
            metrics::DECLARED_TOTAL_MISMATCHES.inc();
            warn!(
                declared = %command.declared_total,
                computed = %cart.total,
                "declared total differs from catalog pricing; using computed total"
            );
        }

        let now = Utc::now();
        let unit = async {
            let mut tx = self.db.begin().await?;
            let outcome = self
                .place_order(&mut *tx, &command, &cart, &fingerprint, now)
                .await;
            finish(tx, "checkout", outcome).await
        };

        match bounded("checkout", self.settings.checkout_timeout, unit).await? {
            Placement::Replayed(confirmation) => {
                metrics::IDEMPOTENT_REPLAYS.inc();
                info!(
                    order_number = %confirmation.order_number,
                    "checkout replayed from idempotency record"
                );
                Ok(confirmation)
            }
            Placement::Created(confirmation) => {
                info!(
                    order_number = %confirmation.order_number,
                    user_id = ?command.user_id,
                    total = %confirmation.total,
                    "order placed"
                );
                metrics::ORDER_VALUE.observe(confirmation.total.to_f64().unwrap_or_default());
                if command.user_id.is_some() {
                    metrics::LEDGER_ENTRIES_TOTAL
                        .with_label_values(&[LedgerEntryKind::Purchase.as_str()])
                        .inc();
                }

                self.notify_order(&confirmation, &command, &cart, now).await;
                Ok(confirmation)
            }
        }
    }

    /// The atomic unit. The first statement is always a write, so the
    /// transaction holds SQLite's writer lock before any balance is read.
    async fn place_order(
        &self,
        conn: &mut SqliteConnection,
        command: &CheckoutCommand,
        cart: &PricedCart,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<Placement> {
        if let Some(key) = command.idempotency_key.as_deref() {
            let retention = self.settings.idempotency_retention.as_secs() as i64;
            idempotency::purge_expired(&mut *conn, now.timestamp() - retention).await?;

            if let Claim::Existing(stored) =
                idempotency::claim(&mut *conn, key, fingerprint, now.timestamp()).await?
            {
                return replay(key, fingerprint, stored).map(Placement::Replayed);
            }
        }

        let payer = match command.user_id {
            Some(user_id) => Some(guard::authorize(&mut *conn, user_id, cart.total).await?),
            None => None,
        };

        let order_id = Uuid::new_v4();
        let order_number = orders::generate_order_number(now);
        let payment_status = if payer.is_some() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        };

        orders::insert_order(
            &mut *conn,
            &NewOrder {
                id: order_id,
                order_number: &order_number,
                user_id: command.user_id,
                customer: &command.customer,
                subtotal: cart.subtotal,
                shipping: cart.shipping,
                total: cart.total,
                payment_status,
                created_at: now,
            },
        )
        .await?;

        orders::insert_items(&mut *conn, order_id, &cart.lines).await?;

        let new_balance = match payer {
            Some(user) => {
                let remaining = user.balance - cart.total;
                users::set_balance(&mut *conn, user.id, remaining, now).await?;

                let description = format!("Payment for order {}", order_number);
                ledger::append(
                    &mut *conn,
                    &NewLedgerEntry {
                        user_id: user.id,
                        kind: LedgerEntryKind::Purchase,
                        amount: -cart.total,
                        description: &description,
                        order_id: Some(order_id),
                        previous_balance: user.balance,
                        new_balance: remaining,
                    },
                    now,
                )
                .await?;

                Some(to_money(remaining))
            }
            None => None,
        };

        let confirmation = CheckoutConfirmation {
            success: true,
            order_id,
            order_number,
            subtotal: to_money(cart.subtotal),
            shipping: to_money(cart.shipping),
            total: to_money(cart.total),
            new_balance,
            payment_status,
            replayed: false,
            warnings: cart.warnings.clone(),
        };

        if let Some(key) = command.idempotency_key.as_deref() {
            let stored = serde_json::to_string(&confirmation)?;
            idempotency::complete(&mut *conn, key, order_id, &stored).await?;
        }

        Ok(Placement::Created(confirmation))
    }

    async fn notify_order(
        &self,
        confirmation: &CheckoutConfirmation,
        command: &CheckoutCommand,
        cart: &PricedCart,
        created_at: DateTime<Utc>,
    ) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let event = OrderEvent {
            event_type: OrderEventType::Created,
            order_id: confirmation.order_id,
            order_number: confirmation.order_number.clone(),
            user_id: command.user_id,
            total: confirmation.total,
            payment_status: confirmation.payment_status,
            item_count: cart.lines.len(),
            timestamp: created_at,
        };
        if let Err(e) = notifier.publish_order_event(&event).await {
            error!("Failed to publish order event: {}", e);
        }

        let email = notifications::order_confirmation_email(
            &confirmation.order_number,
            &command.customer,
            cart,
            confirmation.payment_status,
            created_at,
        );
        if let Err(e) = notifier.publish_email(&email).await {
            error!("Failed to publish order confirmation: {}", e);
        }
    }

    /// Most recent orders first.
    pub async fn list_orders(&self, limit: Option<u32>) -> Result<Vec<Order>> {
        let limit = limit
            .unwrap_or(self.settings.history_limit)
            .clamp(1, MAX_ORDER_LIST);
        orders::list_recent(self.db.pool(), limit).await
    }

    pub async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        users::find_by_id(self.db.pool(), user_id)
            .await?
            .ok_or(CheckoutEngineError::UserNotFound(user_id))?;
        orders::list_for_user(self.db.pool(), user_id).await
    }

    pub async fn get_order(&self, order_number: &str) -> Result<OrderDetails> {
        let order = orders::find_by_number(self.db.pool(), order_number)
            .await?
            .ok_or_else(|| CheckoutEngineError::OrderNotFound(order_number.to_string()))?;
        let items = orders::items_for(self.db.pool(), order.id).await?;

        Ok(OrderDetails { order, items })
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        products::list_all(self.db.pool()).await
    }
}

fn replay(key: &str, fingerprint: &str, stored: StoredRequest) -> Result<CheckoutConfirmation> {
    if stored.request_hash != fingerprint {
        return Err(CheckoutEngineError::IdempotencyConflict(key.to_string()));
    }

    let raw = stored.response.ok_or_else(|| {
        CheckoutEngineError::Internal(format!("idempotency key {} has no stored response", key))
    })?;
    let mut confirmation: CheckoutConfirmation = serde_json::from_str(&raw)?;
    confirmation.replayed = true;

    Ok(confirmation)
}

/// SHA-256 over the canonical JSON of the request, idempotency key excluded.
/// Field order and trailing zeros in amounts do not change the fingerprint.
pub fn request_fingerprint(request: &CheckoutRequest) -> Result<String> {
    let mut stripped = request.clone();
    stripped.idempotency_key = None;
    stripped.total = stripped.total.map(|total| total.normalize());
    let value = canonicalize(serde_json::to_value(&stripped)?);

    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, canonicalize(value)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        serde_json::Value::Number(number) => {
            let raw = number.to_string();
            match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
                Ok(value) => serde_json::Value::String(value.normalize().to_string()),
                Err(_) => serde_json::Value::Number(number),
            }
        }
        other => other,
    }
}

/// Check the request shape before anything touches storage. Each class of
/// bad input gets its own error kind.
pub fn validate_request(request: CheckoutRequest) -> Result<CheckoutCommand> {
    let customer = validate_customer(request.customer)?;

    let raw_items = match request.items {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(CheckoutEngineError::EmptyCart),
    };

    let mut lines = Vec::with_capacity(raw_items.len());
    for (index, raw) in raw_items.into_iter().enumerate() {
        let line: CartLine = serde_json::from_value(raw).map_err(|e| {
            CheckoutEngineError::InvalidLineItem {
                index,
                reason: e.to_string(),
            }
        })?;
        lines.push(validate_line(index, line)?);
    }

    let declared_total = match request.total {
        Some(total) if total > Decimal::ZERO => total,
        _ => return Err(CheckoutEngineError::InvalidTotal),
    };

    let idempotency_key = match request.idempotency_key {
        Some(key) => Some(validate_idempotency_key(key)?),
        None => None,
    };

    Ok(CheckoutCommand {
        user_id: request.user_id,
        customer,
        lines,
        declared_total,
        idempotency_key,
    })
}

fn validate_customer(
    customer: Option<crate::models::CustomerInfo>,
) -> Result<CustomerSnapshot> {
    let customer = customer
        .ok_or_else(|| CheckoutEngineError::InvalidCustomer("customer is required".to_string()))?;

    let required = |field: &str, value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CheckoutEngineError::InvalidCustomer(format!("{} is required", field)))
    };

    let name = required("name", customer.name)?;
    let email = required("email", customer.email)?;
    let address = required("address", customer.address)?;

    if !validator::validate_email(email.as_str()) {
        return Err(CheckoutEngineError::InvalidCustomer(format!(
            "{} is not a valid email",
            email
        )));
    }

    Ok(CustomerSnapshot {
        name,
        email,
        address,
        comments: customer.comments.unwrap_or_default().trim().to_string(),
    })
}

fn validate_line(index: usize, line: CartLine) -> Result<LineRequest> {
    let invalid = |reason: &str| CheckoutEngineError::InvalidLineItem {
        index,
        reason: reason.to_string(),
    };

    let product_id = line.id.ok_or_else(|| invalid("product id is required"))?;
    let name = line
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| invalid("name is required"))?;

    let unit_price = match line.price {
        Some(price) if price > Decimal::ZERO => price,
        _ => return Err(invalid("price must be positive")),
    };

    let quantity = match line.quantity {
        Some(quantity) if quantity > 0 => quantity,
        _ => return Err(invalid("quantity must be positive")),
    };

    Ok(LineRequest {
        product_id,
        name,
        unit_price,
        quantity,
    })
}

fn validate_idempotency_key(key: String) -> Result<String> {
    let key = key.trim().to_string();
    if key.is_empty()
        || key.len() > MAX_IDEMPOTENCY_KEY_LEN
        || !key.chars().all(|c| c.is_ascii_graphic())
    {
        return Err(CheckoutEngineError::Validation(format!(
            "idempotency key must be 1-{} printable ASCII characters",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }
    Ok(key)
}

/// Price the cart from catalog data. Client names and prices are only
/// compared against the catalog; what gets stored comes from the catalog.
pub fn price_cart(
    lines: &[LineRequest],
    catalog: &[Product],
    shipping: Decimal,
    declared_total: Decimal,
) -> Result<PricedCart> {
    let by_id: HashMap<i64, &Product> = catalog.iter().map(|p| (p.id, p)).collect();

    let mut priced = Vec::with_capacity(lines.len());
    let mut warnings = Vec::new();
    let mut subtotal = Decimal::ZERO;

    for (index, line) in lines.iter().enumerate() {
        let product = by_id.get(&line.product_id).ok_or_else(|| {
            CheckoutEngineError::InvalidLineItem {
                index,
                reason: format!("unknown product {}", line.product_id),
            }
        })?;

        if line.unit_price != product.price {
            warnings.push(format!(
                "price of {} changed from {} to {}",
                product.name, line.unit_price, product.price
            ));
        }

        let total_price = product
            .price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or_else(|| CheckoutEngineError::InvalidLineItem {
                index,
                reason: "line total is out of range".to_string(),
            })?;
        subtotal = subtotal
            .checked_add(total_price)
            .ok_or(CheckoutEngineError::InvalidTotal)?;

        priced.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: to_money(product.price),
            quantity: line.quantity,
            total_price: to_money(total_price),
        });
    }

    let total = subtotal
        .checked_add(shipping)
        .ok_or(CheckoutEngineError::InvalidTotal)?;

    if total != declared_total {
        warnings.push(format!(
            "declared total {} does not match computed total {}",
            declared_total, total
        ));
    }

    Ok(PricedCart {
        lines: priced,
        subtotal: to_money(subtotal),
        shipping: to_money(shipping),
        total: to_money(total),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_products;
    use crate::models::CustomerInfo;
    use serde_json::json;

    fn customer() -> Option<CustomerInfo> {
        Some(CustomerInfo {
            name: Some("Ivan".to_string()),
            email: Some("ivan@star.ru".to_string()),
            address: Some("Olympus Mons 1".to_string()),
            comments: None,
        })
    }

    fn request(items: serde_json::Value, total: i64) -> CheckoutRequest {
        CheckoutRequest {
            customer: customer(),
            items: Some(items),
            total: Some(Decimal::new(total, 0)),
            user_id: None,
            idempotency_key: None,
        }
    }

    fn line(id: i64, price: i64, quantity: i64) -> LineRequest {
        LineRequest {
            product_id: id,
            name: format!("product {}", id),
            unit_price: Decimal::new(price, 0),
            quantity,
        }
    }

    #[test]
    fn test_valid_request_becomes_command() {
        let command = validate_request(request(
            json!([{"id": 1, "name": "Antigravitacin", "price": 2500, "quantity": 1}]),
            3000,
        ))
        .unwrap();

        assert_eq!(command.lines.len(), 1);
        assert_eq!(command.customer.comments, "");
        assert_eq!(command.declared_total, Decimal::new(3000, 0));
    }

    #[test]
    fn test_missing_customer_field() {
        let mut req = request(json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}]), 501);
        req.customer.as_mut().unwrap().address = Some("   ".to_string());
        assert!(matches!(
            validate_request(req),
            Err(CheckoutEngineError::InvalidCustomer(_))
        ));

        let mut req = request(json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}]), 501);
        req.customer = None;
        assert!(matches!(
            validate_request(req),
            Err(CheckoutEngineError::InvalidCustomer(_))
        ));
    }

    #[test]
    fn test_bad_email_is_invalid_customer() {
        let mut req = request(json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}]), 501);
        req.customer.as_mut().unwrap().email = Some("not-an-email".to_string());
        assert!(matches!(
            validate_request(req),
            Err(CheckoutEngineError::InvalidCustomer(_))
        ));
    }

    #[test]
    fn test_empty_or_non_array_cart() {
        assert!(matches!(
            validate_request(request(json!([]), 500)),
            Err(CheckoutEngineError::EmptyCart)
        ));
        assert!(matches!(
            validate_request(request(json!({"id": 1}), 500)),
            Err(CheckoutEngineError::EmptyCart)
        ));

        let mut req = request(json!([]), 500);
        req.items = None;
        assert!(matches!(validate_request(req), Err(CheckoutEngineError::EmptyCart)));
    }

    #[test]
    fn test_invalid_line_items_report_index() {
        let cases = [
            json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}, {"id": 2, "name": "B", "price": 1, "quantity": 0}]),
            json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}, {"id": 2, "name": "B", "price": -5, "quantity": 1}]),
            json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}, {"name": "B", "price": 1, "quantity": 1}]),
            json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}, {"id": 2, "price": 1, "quantity": 1}]),
            json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}, {"id": "two", "name": "B", "price": 1, "quantity": 1}]),
        ];

        for items in cases {
            match validate_request(request(items, 1000)) {
                Err(CheckoutEngineError::InvalidLineItem { index, .. }) => assert_eq!(index, 1),
                other => panic!("unexpected result: {:?}", other.map(|c| c.lines)),
            }
        }
    }

    #[test]
    fn test_non_positive_total() {
        let items = json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}]);
        assert!(matches!(
            validate_request(request(items.clone(), 0)),
            Err(CheckoutEngineError::InvalidTotal)
        ));

        let mut req = request(items, 1);
        req.total = None;
        assert!(matches!(validate_request(req), Err(CheckoutEngineError::InvalidTotal)));
    }

    #[test]
    fn test_idempotency_key_shape() {
        let mut req = request(json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}]), 501);
        req.idempotency_key = Some("has spaces".to_string());
        assert!(matches!(validate_request(req), Err(CheckoutEngineError::Validation(_))));

        let mut req = request(json!([{"id": 1, "name": "A", "price": 1, "quantity": 1}]), 501);
        req.idempotency_key = Some("9f1c2a7e-retry-1".to_string());
        assert_eq!(
            validate_request(req).unwrap().idempotency_key.as_deref(),
            Some("9f1c2a7e-retry-1")
        );
    }

    #[test]
    fn test_price_cart_uses_catalog_prices() {
        let catalog = default_products();
        let cart = price_cart(
            &[line(1, 2500, 1), line(5, 4100, 1)],
            &catalog,
            Decimal::new(500, 0),
            Decimal::new(7100, 0),
        )
        .unwrap();

        assert_eq!(cart.subtotal, Decimal::new(6600, 0));
        assert_eq!(cart.total, Decimal::new(7100, 0));
        assert!(cart.warnings.is_empty());
        assert_eq!(cart.lines[1].product_name, "Neurostabilizer");
    }

    #[test]
    fn test_price_cart_ignores_client_price_and_total() {
        let catalog = default_products();
        let cart = price_cart(
            &[line(1, 1, 2)],
            &catalog,
            Decimal::new(500, 0),
            Decimal::new(502, 0),
        )
        .unwrap();

        assert_eq!(cart.lines[0].unit_price, Decimal::new(2500, 0));
        assert_eq!(cart.lines[0].total_price, Decimal::new(5000, 0));
        assert_eq!(cart.total, Decimal::new(5500, 0));
        assert_eq!(cart.warnings.len(), 2);
    }

    #[test]
    fn test_price_cart_rejects_unknown_product() {
        let catalog = default_products();
        let err = price_cart(
            &[line(1, 2500, 1), line(999, 10, 1)],
            &catalog,
            Decimal::new(500, 0),
            Decimal::new(3010, 0),
        )
        .unwrap_err();

        assert!(matches!(err, CheckoutEngineError::InvalidLineItem { index: 1, .. }));
    }

    #[test]
    fn test_fingerprint_ignores_key_and_field_order() {
        let a: CheckoutRequest = serde_json::from_value(json!({
            "customer": {"name": "Ivan", "email": "ivan@star.ru", "address": "Mars"},
            "items": [{"id": 1, "name": "A", "price": 2500, "quantity": 1}],
            "total": 3000,
            "idempotencyKey": "first"
        }))
        .unwrap();
        let b: CheckoutRequest = serde_json::from_value(json!({
            "total": 3000,
            "items": [{"quantity": 1, "price": 2500, "name": "A", "id": 1}],
            "customer": {"address": "Mars", "email": "ivan@star.ru", "name": "Ivan"},
            "idempotencyKey": "second"
        }))
        .unwrap();

        assert_eq!(request_fingerprint(&a).unwrap(), request_fingerprint(&b).unwrap());

        let mut c = a.clone();
        c.total = Some(Decimal::new(3001, 0));
        assert_ne!(request_fingerprint(&a).unwrap(), request_fingerprint(&c).unwrap());
    }

    #[test]
    fn test_fingerprint_ignores_trailing_zeros_in_amounts() {
        let plain: CheckoutRequest = serde_json::from_value(json!({
            "customer": {"name": "Ivan", "email": "ivan@star.ru", "address": "Mars"},
            "items": [{"id": 1, "name": "A", "price": 2500, "quantity": 1}],
            "total": 3000
        }))
        .unwrap();
        let padded: CheckoutRequest = serde_json::from_value(json!({
            "customer": {"name": "Ivan", "email": "ivan@star.ru", "address": "Mars"},
            "items": [{"id": 1, "name": "A", "price": 2500.00, "quantity": 1}],
            "total": "3000.00"
        }))
        .unwrap();

        assert_eq!(
            request_fingerprint(&plain).unwrap(),
            request_fingerprint(&padded).unwrap()
        );
    }
}
