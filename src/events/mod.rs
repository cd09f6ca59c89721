use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the services. The processor is a log sink;
/// it exists so new consumers attach without touching the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CheckoutInitiated {
        reference: String,
        email: String,
        total_amount: i64,
    },
    OrderPaid {
        order_id: Uuid,
        reference: String,
    },
    OrderFulfilled(Uuid),
    PaymentFlagCorrected {
        order_id: Uuid,
        paid: bool,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. Event delivery is best-effort;
    /// callers log and continue on failure.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::CheckoutInitiated {
                reference,
                email,
                total_amount,
            } => {
                info!(reference, email, total_amount, "checkout initiated");
            }
            Event::OrderPaid {
                order_id,
                reference,
            } => {
                info!(%order_id, reference, "order paid");
            }
            Event::OrderFulfilled(order_id) => {
                info!(%order_id, "order fulfilled");
            }
            Event::PaymentFlagCorrected { order_id, paid } => {
                info!(%order_id, paid, "payment flag corrected");
            }
        }
    }
}
