use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::entities::order;

/// An outbound email, ready for delivery.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

/// Outbound email as consumed by the payment verifier. Delivery is
/// fire-and-forget from the caller's perspective: a failed send is logged
/// and reported as a degraded verification, never a rollback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
}

/// Delivers mail through an HTTP JSON email API with a bearer key.
#[derive(Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpEmailSender {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Delivery(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Delivery(format!(
                "email API answered {}",
                response.status()
            )));
        }

        info!("Order confirmation email delivered");
        Ok(())
    }
}

/// Stands in when no email API is configured; logs and succeeds.
#[derive(Clone, Default)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        warn!(to = %message.to, "Email delivery disabled; dropping order confirmation");
        Ok(())
    }
}

/// Picks the sender implementation from configuration.
pub fn sender_from_config(cfg: &AppConfig) -> Result<Box<dyn EmailSender>, NotificationError> {
    match (&cfg.email_api_url, &cfg.email_api_key) {
        (Some(url), Some(key)) => Ok(Box::new(HttpEmailSender::new(
            url.clone(),
            key.clone(),
            Duration::from_secs(cfg.email_timeout_secs),
        )?)),
        _ => {
            warn!("email_api_url/email_api_key not configured; outbound email disabled");
            Ok(Box::new(DisabledEmailSender))
        }
    }
}

/// Builds the order confirmation message from a persisted order.
pub fn order_confirmation(from: &str, order: &order::Model) -> EmailMessage {
    let lines: Vec<crate::cart::EnrichedLine> =
        serde_json::from_value(order.cart.clone()).unwrap_or_default();

    let items_html: String = lines
        .iter()
        .map(|l| format!("<li>{} x {}</li>", l.name, l.quantity))
        .collect();

    let customer_block = order
        .customer
        .as_ref()
        .and_then(|c| serde_json::from_value::<crate::cart::CustomerDetails>(c.clone()).ok());

    let mut html = String::from("<h3>Thank you for your order!</h3>");
    if let Some(customer) = &customer_block {
        html.push_str(&format!(
            "<p>Customer: {} {}</p>",
            customer.first_name, customer.last_name
        ));
    }
    html.push_str(&format!("<p>Items:</p><ul>{}</ul>", items_html));
    html.push_str(&format!(
        "<p>Total Paid: ₦{}</p>",
        format_naira(order.total_amount)
    ));
    if let Some(customer) = &customer_block {
        html.push_str(&format!("<p>Delivery Address: {}</p>", customer.address));
    }
    html.push_str(&format!("<p>Reference: {}</p>", order.reference));

    EmailMessage {
        from: from.to_string(),
        to: order.email.clone(),
        subject: "Your order is confirmed".to_string(),
        html,
    }
}

/// Thousands-separated naira amount, e.g. 900000 -> "900,000".
fn format_naira(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn paid_order() -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            customer: Some(json!({
                "first_name": "Ada",
                "last_name": "Obi",
                "phone": "0800",
                "address": "12 Market Road, Lagos"
            })),
            cart: json!([
                {"product_id": 1, "name": "Adire Fabric", "unit_price": 4500, "quantity": 2}
            ]),
            total_amount: 9000,
            reference: "R1".into(),
            paid: true,
            fulfilled: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn confirmation_lists_items_total_and_address() {
        let message = order_confirmation("orders@shop.test", &paid_order());
        assert_eq!(message.to, "a@b.com");
        assert!(message.html.contains("Adire Fabric x 2"));
        assert!(message.html.contains("₦9,000"));
        assert!(message.html.contains("12 Market Road, Lagos"));
        assert!(message.html.contains("Ada Obi"));
    }

    #[test]
    fn confirmation_without_customer_block_still_renders() {
        let mut order = paid_order();
        order.customer = None;
        let message = order_confirmation("orders@shop.test", &order);
        assert!(message.html.contains("Thank you for your order!"));
        assert!(!message.html.contains("Customer:"));
    }

    #[test]
    fn naira_formatting_groups_thousands() {
        assert_eq!(format_naira(0), "0");
        assert_eq!(format_naira(950), "950");
        assert_eq!(format_naira(9000), "9,000");
        assert_eq!(format_naira(1234567), "1,234,567");
    }
}
