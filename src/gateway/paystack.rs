use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use super::{
    GatewayVerification, InitializeRequest, InitializedTransaction, PaymentGateway,
    SettledTransaction, TransactionMetadata,
};
use crate::config::AppConfig;
use crate::errors::ServiceError;

/// HTTP client for the Paystack transaction API.
///
/// Failure detection goes by the `status` field in the response body, not
/// the HTTP status line: Paystack answers 200 with `status: false` for
/// several failure modes.
#[derive(Clone)]
pub struct PaystackGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

/// Paystack wraps every response in the same envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyData {
    status: String,
    amount: i64,
    #[serde(default)]
    customer: Option<CustomerData>,
    #[serde(default)]
    metadata: Option<TransactionMetadata>,
}

#[derive(Debug, Deserialize)]
struct CustomerData {
    #[serde(default)]
    email: Option<String>,
}

impl PaystackGateway {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.gateway_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cfg.paystack_base_url.trim_end_matches('/').to_string(),
            secret_key: cfg.paystack_secret_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(skip(self, request), fields(email = %request.email, amount = request.amount))]
    async fn initialize_transaction(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializedTransaction, ServiceError> {
        let response = self
            .client
            .post(self.endpoint("/transaction/initialize"))
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gateway initialize call failed");
                ServiceError::Gateway(format!("initialize transaction: {e}"))
            })?;

        let envelope: Envelope<InitializeData> = response.json().await.map_err(|e| {
            error!(error = %e, "Gateway initialize response was not valid JSON");
            ServiceError::Gateway("malformed initialize response".to_string())
        })?;

        match envelope {
            Envelope {
                status: true,
                data: Some(data),
                ..
            } => {
                debug!(reference = %data.reference, "Transaction initialized");
                Ok(InitializedTransaction {
                    reference: data.reference,
                    authorization_url: data.authorization_url,
                })
            }
            Envelope { message, .. } => {
                warn!(message = ?message, "Gateway refused to initialize transaction");
                Err(ServiceError::Gateway(
                    message.unwrap_or_else(|| "failed to initialize payment".to_string()),
                ))
            }
        }
    }

    #[instrument(skip(self))]
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayVerification, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/transaction/verify/{reference}")))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, reference, "Gateway verify call failed");
                ServiceError::Gateway(format!("verify transaction: {e}"))
            })?;

        let envelope: Envelope<VerifyData> = response.json().await.map_err(|e| {
            error!(error = %e, reference, "Gateway verify response was not valid JSON");
            ServiceError::Gateway("malformed verify response".to_string())
        })?;

        let data = match envelope {
            Envelope {
                status: true,
                data: Some(data),
                ..
            } => data,
            Envelope { message, .. } => {
                // An unrecognized reference comes back as status:false.
                return Ok(GatewayVerification::Unsettled {
                    status: message.unwrap_or_else(|| "unknown reference".to_string()),
                });
            }
        };

        if data.status != "success" {
            return Ok(GatewayVerification::Unsettled {
                status: data.status,
            });
        }

        let email = data
            .customer
            .and_then(|c| c.email)
            .ok_or_else(|| ServiceError::Gateway("verify response missing customer email".into()))?;

        Ok(GatewayVerification::Settled(SettledTransaction {
            reference: reference.to_string(),
            amount_kobo: data.amount,
            email,
            metadata: data.metadata,
        }))
    }
}
