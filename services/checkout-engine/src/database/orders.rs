use crate::errors::{CheckoutEngineError, Result};
use crate::models::{
    to_money, CustomerSnapshot, Order, OrderItem, OrderItemRow, OrderRow, OrderStatus,
    PaymentStatus, PricedLine,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite, SqliteConnection};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_name, customer_email, \
                             customer_address, subtotal, shipping, total, status, \
                             payment_status, comments, created_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price, total_price";

// No 0/O or 1/I so numbers survive being read out over the phone.
const ORDER_NUMBER_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const ORDER_NUMBER_SUFFIX_LEN: usize = 8;

/// Human-facing order number: `COSMIC-<yyyymmdd>-<8 random symbols>`.
///
/// Uniqueness is enforced by the `orders.order_number` constraint; a
/// collision fails the insert instead of overwriting anything.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_NUMBER_ALPHABET.len());
            ORDER_NUMBER_ALPHABET[idx] as char
        })
        .collect();

    format!("COSMIC-{}-{}", now.format("%Y%m%d"), suffix)
}

pub struct NewOrder<'a> {
    pub id: Uuid,
    pub order_number: &'a str,
    pub user_id: Option<Uuid>,
    pub customer: &'a CustomerSnapshot,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_order(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, order_number, user_id, customer_name, customer_email,
                            customer_address, subtotal, shipping, total, status,
                            payment_status, comments, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(order.id)
    .bind(order.order_number)
    .bind(order.user_id)
    .bind(&order.customer.name)
    .bind(&order.customer.email)
    .bind(&order.customer.address)
    .bind(to_money(order.subtotal).to_string())
    .bind(to_money(order.shipping).to_string())
    .bind(to_money(order.total).to_string())
    .bind(OrderStatus::New)
    .bind(order.payment_status)
    .bind(&order.customer.comments)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write one row per priced line. Names and prices are the snapshot taken at
/// pricing time, not a reference into the catalog.
pub async fn insert_items(
    conn: &mut SqliteConnection,
    order_id: Uuid,
    lines: &[PricedLine],
) -> Result<()> {
    for line in lines {
        if line.quantity <= 0 {
            return Err(CheckoutEngineError::Internal(format!(
                "refusing to store non-positive quantity for product {}",
                line.product_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity,
                                     unit_price, total_price)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(to_money(line.unit_price).to_string())
        .bind(to_money(line.total_price).to_string())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn find_by_id<'e, E>(executor: E, order_id: Uuid) -> Result<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS))
        .bind(order_id)
        .fetch_optional(executor)
        .await?
        .map(Order::try_from)
        .transpose()
}

pub async fn find_by_number<'e, E>(executor: E, order_number: &str) -> Result<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {} FROM orders WHERE order_number = ?",
        ORDER_COLUMNS
    ))
    .bind(order_number)
    .fetch_optional(executor)
    .await?
    .map(Order::try_from)
    .transpose()
}

pub async fn items_for<'e, E>(executor: E, order_id: Uuid) -> Result<Vec<OrderItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {} FROM order_items WHERE order_id = ? ORDER BY id",
        ITEM_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(OrderItem::try_from)
    .collect()
}

/// Most recent first.
pub async fn list_recent<'e, E>(executor: E, limit: u32) -> Result<Vec<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {} FROM orders ORDER BY rowid DESC LIMIT ?",
        ORDER_COLUMNS
    ))
    .bind(i64::from(limit))
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(Order::try_from)
    .collect()
}

pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {} FROM orders WHERE user_id = ? ORDER BY rowid DESC",
        ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(Order::try_from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_order_number_shape() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let number = generate_order_number(now);

        assert!(number.starts_with("COSMIC-20261018-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_order_numbers_do_not_repeat() {
        let now = Utc::now();
        let numbers: HashSet<String> = (0..1_000).map(|_| generate_order_number(now)).collect();
        assert_eq!(numbers.len(), 1_000);
    }
}
