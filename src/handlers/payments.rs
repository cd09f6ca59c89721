use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::services::verification::VerificationOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReferenceParams {
    #[serde(default)]
    pub reference: Option<String>,
}

/// Settles a payment against the gateway. Safe to call repeatedly for
/// the same reference; the client polls this after the popup closes.
pub async fn verify_payment(
    State(state): State<AppState>,
    Query(params): Query<ReferenceParams>,
) -> Result<Json<VerifyResponse>, ServiceError> {
    let reference = params.reference.unwrap_or_default();
    let outcome = state.services.verification.verify(&reference).await?;

    let response = match outcome {
        VerificationOutcome::Verified {
            email_sent,
            newly_paid,
            ..
        } => VerifyResponse {
            status: "success",
            message: if newly_paid {
                "Payment verified and order saved".to_string()
            } else {
                "Payment already verified".to_string()
            },
            paid: true,
            email_sent,
        },
        VerificationOutcome::NotVerified { gateway_status } => VerifyResponse {
            status: "failed",
            message: format!("Payment not verified ({gateway_status})"),
            paid: false,
            email_sent: false,
        },
    };

    Ok(Json(response))
}

/// Customer-facing order status lookup by gateway reference.
pub async fn order_status(
    State(state): State<AppState>,
    Query(params): Query<ReferenceParams>,
) -> Result<Json<OrderStatusResponse>, ServiceError> {
    let reference = params.reference.unwrap_or_default();
    if reference.trim().is_empty() {
        return Err(ServiceError::MissingReference);
    }

    let order = state
        .services
        .orders
        .find_by_reference(reference.trim())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no order for reference {reference}")))?;

    Ok(Json(OrderStatusResponse {
        reference: order.reference,
        paid: order.paid,
        fulfilled: order.fulfilled,
        total_amount: order.total_amount,
        created_at: order.created_at,
    }))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    pub message: String,
    pub paid: bool,
    pub email_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    pub reference: String,
    pub paid: bool,
    pub fulfilled: bool,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
}
