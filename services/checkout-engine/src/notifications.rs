//! Post-commit notifications over NATS: order events and rendered emails.
//!
//! Delivery is best effort. Callers log a failed publish and carry on; the
//! committed order or account is never affected.

use crate::errors::{CheckoutEngineError, Result};
use crate::metrics::NATS_MESSAGES_PUBLISHED;
use crate::models::{CustomerSnapshot, PaymentStatus, PricedCart, UserProfile};
use async_nats::Client;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_type: OrderEventType,
    pub order_id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub item_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderEventType {
    Created,
}

/// Plain-text email handed to the mail relay subscribed on NATS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

pub struct NotificationPublisher {
    client: Client,
    topic_prefix: String,
}

impl NotificationPublisher {
    pub async fn connect(url: &str, topic_prefix: &str) -> Result<Self> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| CheckoutEngineError::Nats(e.to_string()))?;

        info!("Connected to NATS at {}", url);

        Ok(NotificationPublisher {
            client,
            topic_prefix: topic_prefix.to_string(),
        })
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        let result = self
            .client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| CheckoutEngineError::Nats(format!("Failed to publish to {}: {}", subject, e)));

        let status = if result.is_ok() { "ok" } else { "error" };
        NATS_MESSAGES_PUBLISHED
            .with_label_values(&[subject, status])
            .inc();

        result
    }

    pub async fn publish_order_event(&self, event: &OrderEvent) -> Result<()> {
        let subject = format!("{}.orders.created", self.topic_prefix);
        let payload = serde_json::to_vec(event)?;

        self.publish(&subject, payload).await?;

        info!(
            order_number = %event.order_number,
            subject = %subject,
            "published order event"
        );
        Ok(())
    }

    pub async fn publish_email(&self, email: &EmailMessage) -> Result<()> {
        let subject = format!("{}.notifications.email", self.topic_prefix);
        let payload = serde_json::to_vec(email)?;

        self.publish(&subject, payload).await?;

        info!(to = %email.to, subject = %email.subject, "queued email");
        Ok(())
    }
}

pub fn order_confirmation_email(
    order_number: &str,
    customer: &CustomerSnapshot,
    cart: &PricedCart,
    payment_status: PaymentStatus,
    created_at: DateTime<Utc>,
) -> EmailMessage {
    let mut lines = String::new();
    for line in &cart.lines {
        lines.push_str(&format!(
            "  - {} x {}: {}\n",
            line.product_name, line.quantity, line.total_price
        ));
    }

    let payment = match payment_status {
        PaymentStatus::Paid => "paid from your balance",
        PaymentStatus::Pending => "payment on delivery",
    };

    let mut text = format!(
        "Dear {name},\n\n\
         Your order No. {number} has been placed and accepted for processing.\n\n\
         Items:\n{lines}\n\
         Subtotal: {subtotal}\n\
         Shipping: {shipping}\n\
         Total: {total} ({payment})\n\n\
         Delivery address: {address}\n\
         Order date: {date}\n",
        name = customer.name,
        number = order_number,
        lines = lines,
        subtotal = cart.subtotal,
        shipping = cart.shipping,
        total = cart.total,
        payment = payment,
        address = customer.address,
        date = created_at.format("%Y-%m-%d"),
    );

    if !customer.comments.is_empty() {
        text.push_str(&format!("Comments: {}\n", customer.comments));
    }

    EmailMessage {
        to: customer.email.clone(),
        subject: format!("Order No. {} confirmed", order_number),
        text,
    }
}

pub fn welcome_email(profile: &UserProfile) -> EmailMessage {
    let text = format!(
        "Welcome to the Cosmic Pharmacy, {name}!\n\n\
         Thanks for registering. You can now buy space medicine, top up your\n\
         balance and follow every purchase in your transaction history.\n\n\
         Email: {email}\n\
         Address: {address}\n\
         Balance: {balance}\n",
        name = profile.name,
        email = profile.email,
        address = profile.address.as_deref().unwrap_or("not provided"),
        balance = profile.balance,
    );

    EmailMessage {
        to: profile.email.clone(),
        subject: format!("Welcome to the Cosmic Pharmacy, {}!", profile.name),
        text,
    }
}
