use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::cart::{self, CheckoutRequest};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::{InitializeRequest, PaymentGateway, TransactionMetadata};

/// Minor-unit factor: the gateway bills in kobo, the catalog is in naira.
const KOBO_PER_NAIRA: i64 = 100;

/// What the client needs to hand off to the gateway's popup/redirect flow.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub reference: String,
    pub authorization_url: String,
    pub public_key: String,
}

/// Validates a checkout request and opens a transaction with the gateway.
/// Writes nothing locally: the order row is created at verification time.
#[derive(Clone)]
pub struct CheckoutService {
    gateway: Arc<dyn PaymentGateway>,
    event_sender: EventSender,
    currency: String,
    public_key: String,
}

impl CheckoutService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        event_sender: EventSender,
        currency: String,
        public_key: String,
    ) -> Self {
        Self {
            gateway,
            event_sender,
            currency,
            public_key,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn initiate(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, ServiceError> {
        request.validate()?;

        // The client total is untrusted input: recompute from catalog
        // prices and reject on any disagreement.
        let enriched = cart::enrich(&request.cart)?;
        let computed = cart::recompute_total(&request.cart)?;
        if computed <= 0 {
            return Err(ServiceError::Validation(
                "cart total must be positive".into(),
            ));
        }
        if request.total_amount != computed {
            warn!(
                submitted = request.total_amount,
                computed, "Rejecting checkout with mismatched total"
            );
            return Err(ServiceError::AmountMismatch {
                submitted: request.total_amount,
                computed,
            });
        }

        let initialized = self
            .gateway
            .initialize_transaction(InitializeRequest {
                email: request.email.clone(),
                amount: computed * KOBO_PER_NAIRA,
                currency: self.currency.clone(),
                metadata: TransactionMetadata {
                    cart: enriched,
                    customer: request.customer.clone(),
                },
            })
            .await?;

        info!(reference = %initialized.reference, "Checkout initiated");

        if let Err(e) = self
            .event_sender
            .send(Event::CheckoutInitiated {
                reference: initialized.reference.clone(),
                email: request.email.clone(),
                total_amount: computed,
            })
            .await
        {
            warn!(error = %e, "Failed to send checkout event");
        }

        Ok(CheckoutReceipt {
            reference: initialized.reference,
            authorization_url: initialized.authorization_url,
            public_key: self.public_key.clone(),
        })
    }
}
