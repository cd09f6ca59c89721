use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::entities::order;
use crate::errors::ServiceError;
use crate::events::Event;
use crate::AppState;

/// Admin: every order, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    let orders = state.services.orders.list_all().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Admin: mark an order fulfilled.
pub async fn fulfill_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order = state.services.orders.set_fulfilled(id).await?;

    if let Err(e) = state.event_sender.send(Event::OrderFulfilled(id)).await {
        warn!(error = %e, "Failed to send order fulfilled event");
    }

    Ok(Json(OrderResponse::from(order)))
}

/// Admin: correct the paid flag on an order.
pub async fn update_payment_flag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order = state
        .services
        .orders
        .set_paid_flag(id, payload.paid)
        .await?;

    if let Err(e) = state
        .event_sender
        .send(Event::PaymentFlagCorrected {
            order_id: id,
            paid: payload.paid,
        })
        .await
    {
        warn!(error = %e, "Failed to send payment flag event");
    }

    Ok(Json(OrderResponse::from(order)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub paid: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub email: String,
    pub customer: Option<JsonValue>,
    pub cart: JsonValue,
    pub total_amount: i64,
    pub reference: String,
    pub paid: bool,
    pub fulfilled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            customer: model.customer,
            cart: model.cart,
            total_amount: model.total_amount,
            reference: model.reference,
            paid: model.paid,
            fulfilled: model.fulfilled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
