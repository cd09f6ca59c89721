use axum::{extract::State, Json};
use serde::Serialize;

use crate::cart::CheckoutRequest;
use crate::errors::ServiceError;
use crate::AppState;

pub async fn initiate_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ServiceError> {
    let receipt = state.services.checkout.initiate(payload).await?;

    Ok(Json(CheckoutResponse {
        status: "success",
        reference: receipt.reference,
        authorization_url: receipt.authorization_url,
        public_key: receipt.public_key,
    }))
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub status: &'static str,
    pub reference: String,
    pub authorization_url: String,
    pub public_key: String,
}
