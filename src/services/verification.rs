use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::{GatewayVerification, PaymentGateway, SettledTransaction};
use crate::notifications::{order_confirmation, EmailSender};
use crate::services::orders::{OrderService, PaidOrder};

/// Minor-unit factor: gateway amounts arrive in kobo.
const KOBO_PER_NAIRA: i64 = 100;

/// What a verification call reports back to the client.
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    /// The gateway confirmed payment and the order row is in place.
    Verified {
        order_id: Uuid,
        reference: String,
        total_amount: i64,
        /// False when the confirmation email could not be delivered; the
        /// order write stands regardless.
        email_sent: bool,
        /// False when an earlier verification already settled this
        /// reference and this call was a no-op.
        newly_paid: bool,
    },
    /// The gateway reported anything other than success.
    NotVerified { gateway_status: String },
}

/// Settles payments: asks the gateway for the authoritative transaction
/// state and reconciles the order store against it. The client-side popup
/// result is never trusted; it only triggers this call.
pub struct VerificationService {
    gateway: Arc<dyn PaymentGateway>,
    orders: OrderService,
    mailer: Arc<dyn EmailSender>,
    event_sender: EventSender,
    email_from: String,
}

impl VerificationService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        orders: OrderService,
        mailer: Arc<dyn EmailSender>,
        event_sender: EventSender,
        email_from: String,
    ) -> Self {
        Self {
            gateway,
            orders,
            mailer,
            event_sender,
            email_from,
        }
    }

    /// Verifies one gateway reference. Idempotent: repeating the call for
    /// a settled reference converges on the same order row and sends no
    /// second email. Performs no local write unless the gateway confirms
    /// success, so a transport failure is always safe to retry.
    #[instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<VerificationOutcome, ServiceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ServiceError::MissingReference);
        }

        let settled = match self.gateway.verify_transaction(reference).await? {
            GatewayVerification::Settled(settled) => settled,
            GatewayVerification::Unsettled { status } => {
                info!(reference, gateway_status = %status, "Payment not verified");
                return Ok(VerificationOutcome::NotVerified {
                    gateway_status: status,
                });
            }
        };

        let transition = self.orders.mark_paid(self.to_paid_order(&settled)).await?;
        let order = transition.order;

        let mut email_sent = false;
        if transition.newly_paid {
            let message = order_confirmation(&self.email_from, &order);
            match self.mailer.send(message).await {
                Ok(()) => email_sent = true,
                Err(e) => {
                    // Degraded but successful: the order write stands.
                    warn!(error = %e, reference, "Order confirmation email failed");
                }
            }

            if let Err(e) = self
                .event_sender
                .send(Event::OrderPaid {
                    order_id: order.id,
                    reference: reference.to_string(),
                })
                .await
            {
                warn!(error = %e, "Failed to send order paid event");
            }
        }

        Ok(VerificationOutcome::Verified {
            order_id: order.id,
            reference: reference.to_string(),
            total_amount: order.total_amount,
            email_sent,
            newly_paid: transition.newly_paid,
        })
    }

    fn to_paid_order(&self, settled: &SettledTransaction) -> PaidOrder {
        let (cart, customer) = match &settled.metadata {
            Some(metadata) => (
                serde_json::to_value(&metadata.cart).unwrap_or_else(|_| json!([])),
                metadata
                    .customer
                    .as_ref()
                    .and_then(|c| serde_json::to_value(c).ok()),
            ),
            None => {
                warn!(
                    reference = %settled.reference,
                    "Verify response carried no metadata; persisting order without cart snapshot"
                );
                (json!([]), None)
            }
        };

        PaidOrder {
            reference: settled.reference.clone(),
            email: settled.email.clone(),
            customer,
            cart,
            total_amount: settled.amount_kobo / KOBO_PER_NAIRA,
        }
    }
}
