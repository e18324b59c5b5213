use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Durable record of a purchase. Orders are append-only financial records:
/// rows are inserted at checkout and mutated exactly once, when reconciliation
/// settles the payment. They are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-facing identifier, also the key the payment processor sees
    #[sea_orm(unique)]
    pub order_number: String,

    #[sea_orm(nullable)]
    pub buyer_id: Option<String>,

    // Billing snapshot taken at order creation, independent of later
    // profile or catalog changes.
    pub billing_name: String,
    pub billing_email: String,
    pub billing_phone: String,
    pub billing_line1: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_postal_code: String,
    pub billing_country: String,

    // Money in integer minor units.
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub currency: String,

    pub payment_status: PaymentStatus,

    /// Transaction reference reported by the processor once payment settles
    #[sea_orm(nullable)]
    pub external_payment_ref: Option<String>,

    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
    #[sea_orm(
        belongs_to = "super::buyer_profile::Entity",
        from = "Column::BuyerId",
        to = "super::buyer_profile::Column::Id"
    )]
    BuyerProfile,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::buyer_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BuyerProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payment state of an order.
///
/// Transitions are one-way: `Pending` settles into exactly one of the two
/// terminal states and stays there.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Display,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}
