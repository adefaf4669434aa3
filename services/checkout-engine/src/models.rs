use crate::errors::{CheckoutEngineError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Round half away from zero to cents and pin the scale so stored and
/// rendered amounts look alike.
pub fn to_money(value: Decimal) -> Decimal {
    let mut amount = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    amount
}

/// Parse a money column. A malformed value is a storage fault, not a client error.
pub fn parse_money(column: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| {
        CheckoutEngineError::Internal(format!("column {} holds non-decimal {:?}: {}", column, raw, e))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Order lifecycle. Only `New` is produced here; later transitions belong to
/// fulfilment tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Processing,
    Completed,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    Purchase,
    Topup,
    Refund,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::Purchase => "purchase",
            LedgerEntryKind::Topup => "topup",
            LedgerEntryKind::Refund => "refund",
        }
    }
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub address: Option<String>,
    pub role: UserRole,
    pub balance: String,
    pub opening_balance: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered customer and their wallet.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub address: Option<String>,
    pub role: UserRole,
    pub balance: Decimal,
    pub opening_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = CheckoutEngineError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(UserAccount {
            balance: parse_money("users.balance", &row.balance)?,
            opening_balance: parse_money("users.opening_balance", &row.opening_balance)?,
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            address: row.address,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub image: String,
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub description: String,
    pub image: String,
    /// Advisory only; checkout does not reserve stock.
    pub stock: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = CheckoutEngineError;

    fn try_from(row: ProductRow) -> Result<Self> {
        Ok(Product {
            price: parse_money("products.price", &row.price)?,
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            image: row.image,
            stock: row.stock,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = CheckoutEngineError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            subtotal: parse_money("orders.subtotal", &row.subtotal)?,
            shipping: parse_money("orders.shipping", &row.shipping)?,
            total: parse_money("orders.total", &row.total)?,
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_address: row.customer_address,
            status: row.status,
            payment_status: row.payment_status,
            comments: row.comments,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: Uuid,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub total_price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: Uuid,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = CheckoutEngineError;

    fn try_from(row: OrderItemRow) -> Result<Self> {
        Ok(OrderItem {
            unit_price: parse_money("order_items.unit_price", &row.unit_price)?,
            total_price: parse_money("order_items.total_price", &row.total_price)?,
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LedgerRow {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: LedgerEntryKind,
    pub amount: String,
    pub description: String,
    pub order_id: Option<Uuid>,
    pub previous_balance: String,
    pub new_balance: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of one balance change.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub kind: LedgerEntryKind,
    /// Signed: negative for purchases, positive for top-ups and refunds.
    pub amount: Decimal,
    pub description: String,
    pub order_id: Option<Uuid>,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = CheckoutEngineError;

    fn try_from(row: LedgerRow) -> Result<Self> {
        Ok(LedgerEntry {
            amount: parse_money("transactions.amount", &row.amount)?,
            previous_balance: parse_money("transactions.previous_balance", &row.previous_balance)?,
            new_balance: parse_money("transactions.new_balance", &row.new_balance)?,
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            description: row.description,
            order_id: row.order_id,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

/// Inbound checkout body. Fields are optional so that missing data maps to a
/// precise error kind instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer: Option<CustomerInfo>,
    pub items: Option<serde_json::Value>,
    pub total: Option<Decimal>,
    pub user_id: Option<Uuid>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CartLine {
    #[serde(alias = "productId")]
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(alias = "unitPrice")]
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
}

/// Customer details frozen onto the order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: String,
    pub address: String,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineRequest {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

/// A checkout request that passed input validation.
#[derive(Debug, Clone)]
pub struct CheckoutCommand {
    pub user_id: Option<Uuid>,
    pub customer: CustomerSnapshot,
    pub lines: Vec<LineRequest>,
    pub declared_total: Decimal,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub total_price: Decimal,
}

/// Cart priced from the catalog on the server side.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfirmation {
    pub success: bool,
    pub order_id: Uuid,
    pub order_number: String,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Decimal>,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub replayed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub user_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceChange {
    pub old: Decimal,
    pub added: Decimal,
    pub new: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopUpReceipt {
    pub success: bool,
    pub user_id: Uuid,
    pub balance: BalanceChange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceTransition {
    pub from: Decimal,
    pub to: Decimal,
}

/// One row of a user's transaction history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: LedgerEntryKind,
    pub amount: Decimal,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub date: DateTime<Utc>,
    pub balance_change: BalanceTransition,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, validator::Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, validator::Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Public view of an account; never carries the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub address: Option<String>,
    pub role: UserRole,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for UserProfile {
    fn from(user: &UserAccount) -> Self {
        UserProfile {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            address: user.address.clone(),
            role: user.role,
            balance: user.balance,
            created_at: user.created_at,
        }
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
