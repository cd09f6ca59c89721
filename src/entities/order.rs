use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted order. Rows exist only for payments the gateway confirmed;
/// `reference` is the gateway-issued transaction reference and is unique,
/// which is what makes the verify-time upsert idempotent.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub email: String,

    /// Customer details snapshot as submitted at checkout, if any
    #[sea_orm(column_type = "Json", nullable)]
    pub customer: Option<Json>,

    /// Cart lines enriched with product name and unit price
    #[sea_orm(column_type = "Json")]
    pub cart: Json,

    /// Whole naira
    pub total_amount: i64,

    #[sea_orm(unique)]
    pub reference: String,

    pub paid: bool,
    pub fulfilled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
