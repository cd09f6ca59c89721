use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cart::{CustomerDetails, EnrichedLine};
use crate::errors::ServiceError;

pub mod paystack;

pub use paystack::PaystackGateway;

/// Opaque payload sent to the gateway at initialization and echoed back
/// verbatim at verification, so the verifier never needs to trust the
/// browser or perform a second local lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionMetadata {
    pub cart: Vec<EnrichedLine>,
    #[serde(default)]
    pub customer: Option<CustomerDetails>,
}

/// Parameters for the gateway's initialize-transaction operation.
/// `amount` is already in the gateway's minor unit (kobo).
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    pub amount: i64,
    pub currency: String,
    pub metadata: TransactionMetadata,
}

/// Successful initialization: the gateway-issued reference plus the
/// handle the client redirects to (or opens in a popup).
#[derive(Debug, Clone)]
pub struct InitializedTransaction {
    pub reference: String,
    pub authorization_url: String,
}

/// What the gateway reports for a reference at verification time.
#[derive(Debug, Clone)]
pub enum GatewayVerification {
    /// The gateway settled the transaction as paid.
    Settled(SettledTransaction),
    /// Anything else: failed, abandoned, still pending, or a reference
    /// the gateway does not recognize.
    Unsettled { status: String },
}

/// The authoritative facts about a settled transaction, as reported by
/// the gateway. These, not the client's callback, are what gets persisted.
#[derive(Debug, Clone)]
pub struct SettledTransaction {
    pub reference: String,
    pub amount_kobo: i64,
    pub email: String,
    pub metadata: Option<TransactionMetadata>,
}

/// The payment gateway as consumed by the checkout and verification
/// services. Tests substitute a mock; production wires up [`PaystackGateway`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializedTransaction, ServiceError>;

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayVerification, ServiceError>;
}
