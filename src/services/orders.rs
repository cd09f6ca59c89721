use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::order::{self, Entity as OrderEntity};
use crate::errors::ServiceError;

/// The authoritative facts persisted when a payment settles. Assembled by
/// the verifier from the gateway's verify response, never from the client.
#[derive(Debug, Clone)]
pub struct PaidOrder {
    pub reference: String,
    pub email: String,
    pub customer: Option<Json>,
    pub cart: Json,
    pub total_amount: i64,
}

/// Result of [`OrderService::mark_paid`]: the converged row plus whether
/// this call performed the unpaid-to-paid transition. The notification is
/// bound to `newly_paid`, which is what keeps it at most once.
#[derive(Debug, Clone)]
pub struct PaidTransition {
    pub order: order::Model,
    pub newly_paid: bool,
}

/// Persistence accessor for orders. No business logic beyond the unique
/// `reference` invariant lives here.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        OrderEntity::find()
            .filter(order::Column::Reference.eq(reference))
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, reference, "Failed to fetch order by reference");
                ServiceError::Database(e)
            })
    }

    /// All orders, newest first. Cheap and side-effect free; the admin
    /// view polls this at sub-minute intervals.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<order::Model>, ServiceError> {
        OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list orders");
                ServiceError::Database(e)
            })
    }

    /// Idempotent upsert keyed on the unique `reference` column.
    ///
    /// Exactly one caller observes `newly_paid == true` per reference:
    /// the conditional update only matches an unpaid row, and a racing
    /// insert that trips the unique index falls back to a re-read.
    #[instrument(skip(self, paid), fields(reference = %paid.reference))]
    pub async fn mark_paid(&self, paid: PaidOrder) -> Result<PaidTransition, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        // First try the conditional transition on an existing row.
        let update = OrderEntity::update_many()
            .col_expr(order::Column::Paid, Expr::value(true))
            .col_expr(order::Column::Email, Expr::value(paid.email.clone()))
            .col_expr(order::Column::Customer, Expr::value(paid.customer.clone()))
            .col_expr(order::Column::Cart, Expr::value(paid.cart.clone()))
            .col_expr(
                order::Column::TotalAmount,
                Expr::value(paid.total_amount),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(
                order::Column::Reference
                    .eq(paid.reference.clone())
                    .and(order::Column::Paid.eq(false)),
            )
            .exec(db)
            .await?;

        if update.rows_affected > 0 {
            let order = self.expect_by_reference(&paid.reference).await?;
            info!(order_id = %order.id, "Order transitioned to paid");
            return Ok(PaidTransition {
                order,
                newly_paid: true,
            });
        }

        // No unpaid row matched: either the order is already paid, or it
        // does not exist yet.
        if let Some(order) = self.find_by_reference(&paid.reference).await? {
            info!(order_id = %order.id, "Order already paid; verify is a no-op");
            return Ok(PaidTransition {
                order,
                newly_paid: false,
            });
        }

        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(paid.email.clone()),
            customer: Set(paid.customer.clone()),
            cart: Set(paid.cart.clone()),
            total_amount: Set(paid.total_amount),
            reference: Set(paid.reference.clone()),
            paid: Set(true),
            fulfilled: Set(false),
            created_at: Set(now),
            updated_at: Set(None),
        };

        match model.insert(db).await {
            Ok(order) => {
                info!(order_id = %order.id, "Order created as paid");
                Ok(PaidTransition {
                    order,
                    newly_paid: true,
                })
            }
            Err(insert_err) => {
                // A concurrent verify may have inserted between our probe
                // and this insert; the unique reference index rejects the
                // duplicate. Converge on the surviving row.
                match self.find_by_reference(&paid.reference).await? {
                    Some(order) => {
                        warn!(
                            reference = %paid.reference,
                            "Concurrent verification detected; converging on existing order"
                        );
                        Ok(PaidTransition {
                            order,
                            newly_paid: false,
                        })
                    }
                    None => Err(ServiceError::Database(insert_err)),
                }
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn set_fulfilled(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        let mut active: order::ActiveModel = order.into();
        active.fulfilled = Set(true);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        info!(order_id = %id, "Order marked fulfilled");
        Ok(updated)
    }

    /// Admin correction of the paid flag, e.g. after an offline refund.
    #[instrument(skip(self))]
    pub async fn set_paid_flag(&self, id: Uuid, paid: bool) -> Result<order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        let mut active: order::ActiveModel = order.into();
        active.paid = Set(paid);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        info!(order_id = %id, paid, "Order payment flag updated");
        Ok(updated)
    }

    async fn expect_by_reference(&self, reference: &str) -> Result<order::Model, ServiceError> {
        self.find_by_reference(reference).await?.ok_or_else(|| {
            ServiceError::Internal(format!("order with reference {reference} vanished mid-upsert"))
        })
    }
}
