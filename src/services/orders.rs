use crate::{
    auth::AuthenticatedBuyer,
    cart::{Cart, CartItem},
    entities::{
        order::{self, PaymentStatus},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing,
    services::profiles::BuyerProfileService,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Billing details captured at checkout and snapshotted onto the order.
/// Presence is what matters; only the email gets a shape check.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Ada Lovelace",
    "email": "ada@example.com",
    "phone": "9999999999",
    "address": {
        "line1": "12 Analytical Lane",
        "city": "Pune",
        "state": "MH",
        "postal_code": "411001",
        "country": "IN"
    }
}))]
pub struct BillingDetails {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate]
    pub address: BillingAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BillingAddress {
    #[validate(length(min = 1, max = 300))]
    pub line1: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 2))]
    pub country: String,
}

#[derive(Debug)]
pub struct CreateOrderInput {
    pub billing: BillingDetails,
    pub items: Vec<CartItem>,
}

/// An order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// What happened to a requested status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This call moved the order out of pending.
    Applied,
    /// The order was already terminal; the stored state is returned untouched.
    AlreadySettled(PaymentStatus),
}

/// Order repository: the single source of truth for what was purchased and
/// whether it was paid.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    profiles: Arc<BuyerProfileService>,
    tax_rate_bps: u32,
    currency: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        profiles: Arc<BuyerProfileService>,
        tax_rate_bps: u32,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            profiles,
            tax_rate_bps,
            currency,
        }
    }

    /// Creates a pending order from the buyer's cart.
    ///
    /// The buyer profile is ensured first and any failure there aborts the
    /// whole creation; order and items are inserted in one transaction, so
    /// there is never an order row without its lines.
    #[instrument(skip(self, buyer, input), fields(buyer_id = %buyer.id))]
    pub async fn create_order(
        &self,
        buyer: &AuthenticatedBuyer,
        input: CreateOrderInput,
    ) -> Result<OrderDetail, ServiceError> {
        input.billing.validate()?;

        // Mirror the client cart's dedup rule server-side.
        let cart = Cart::from_items(input.items);
        if cart.is_empty() {
            return Err(ServiceError::ValidationError("cart is empty".to_string()));
        }
        for item in cart.items() {
            item.validate()?;
        }

        let pricing = pricing::price_cart(cart.items(), self.tax_rate_bps)?;

        self.profiles.ensure_profile(buyer).await?;

        let order_id = Uuid::new_v4();
        let order_number = generate_order_number();
        let now = Utc::now();
        let billing = &input.billing;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            buyer_id: Set(Some(buyer.id.clone())),
            billing_name: Set(billing.name.clone()),
            billing_email: Set(billing.email.clone()),
            billing_phone: Set(billing.phone.clone()),
            billing_line1: Set(billing.address.line1.clone()),
            billing_city: Set(billing.address.city.clone()),
            billing_state: Set(billing.address.state.clone()),
            billing_postal_code: Set(billing.address.postal_code.clone()),
            billing_country: Set(billing.address.country.clone()),
            subtotal: Set(pricing.subtotal),
            tax_amount: Set(pricing.tax_amount),
            total_amount: Set(pricing.total_amount),
            currency: Set(self.currency.clone()),
            payment_status: Set(PaymentStatus::Pending),
            external_payment_ref: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let txn = self.db.begin().await?;

        let order = order_model.insert(&txn).await?;

        let mut items = Vec::with_capacity(cart.len());
        for cart_item in cart.items() {
            let item_model = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                course_id: Set(cart_item.course_id.clone()),
                plan: Set(cart_item.plan),
                course_name: Set(cart_item.course_name.clone()),
                unit_price: Set(pricing::parse_price(&cart_item.price)?),
                created_at: Set(now),
            };
            items.push(item_model.insert(&txn).await?);
        }

        txn.commit().await?;

        let _ = self
            .event_sender
            .send(Event::OrderCreated {
                order_id,
                order_number: order_number.clone(),
            })
            .await;

        info!(
            %order_number,
            total_amount = order.total_amount,
            items = items.len(),
            "order created"
        );

        Ok(OrderDetail { order, items })
    }

    pub async fn get_order(&self, order_number: &str) -> Result<OrderDetail, ServiceError> {
        let order = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", order_number))
            })?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        Ok(OrderDetail { order, items })
    }

    /// Point read with an ownership check; buyers only see their own orders.
    pub async fn get_order_for_buyer(
        &self,
        buyer_id: &str,
        order_number: &str,
    ) -> Result<OrderDetail, ServiceError> {
        let detail = self.get_order(order_number).await?;
        if detail.order.buyer_id.as_deref() != Some(buyer_id) {
            return Err(ServiceError::Forbidden(
                "order belongs to a different buyer".to_string(),
            ));
        }
        Ok(detail)
    }

    pub async fn list_orders(&self, buyer_id: &str) -> Result<Vec<OrderDetail>, ServiceError> {
        let rows = order::Entity::find()
            .filter(order::Column::BuyerId.eq(buyer_id))
            .order_by_desc(order::Column::CreatedAt)
            .find_with_related(order_item::Entity)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, items)| OrderDetail { order, items })
            .collect())
    }

    /// Settles an order's payment status using the shared connection pool.
    pub async fn update_status(
        &self,
        order_id: Uuid,
        target: PaymentStatus,
        external_ref: Option<String>,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.update_status_on(&*self.db, order_id, target, external_ref)
            .await
    }

    /// Settles an order's payment status on an explicit connection, so the
    /// caller can bundle it with dependent writes in one transaction.
    ///
    /// The write is conditional on the row still being pending. Concurrent
    /// settlement attempts therefore serialize at the database: exactly one
    /// caller observes `Applied`, everyone else gets the stored terminal
    /// state back. Terminal states are never overwritten.
    pub async fn update_status_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        target: PaymentStatus,
        external_ref: Option<String>,
    ) -> Result<TransitionOutcome, ServiceError> {
        if !target.is_terminal() {
            return Err(ServiceError::InvalidTransition(format!(
                "orders cannot transition back to {}",
                target
            )));
        }

        let result = order::Entity::update_many()
            .col_expr(order::Column::PaymentStatus, Expr::value(target))
            .col_expr(
                order::Column::ExternalPaymentRef,
                Expr::value(external_ref),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Pending))
            .exec(conn)
            .await?;

        if result.rows_affected == 1 {
            info!(%order_id, status = %target, "order settled");
            return Ok(TransitionOutcome::Applied);
        }

        let stored = order::Entity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        Ok(TransitionOutcome::AlreadySettled(stored.payment_status))
    }
}

/// Human-facing order number: date plus a random suffix. Unique enough to be
/// a display and idempotency key; the uuid primary key is the real identity.
fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4()
        .to_string()
        .split('-')
        .next()
        .unwrap()
        .to_uppercase();
    format!("ORD-{}-{}", date, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_carry_date_and_suffix() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD-"));
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn consecutive_order_numbers_differ() {
        assert_ne!(generate_order_number(), generate_order_number());
    }
}
