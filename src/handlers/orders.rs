use crate::{
    auth::AuthenticatedBuyer,
    entities::order::PaymentStatus,
    entities::order_item::Plan,
    errors::ServiceError,
    services::orders::OrderDetail,
    services::reconciliation::ReconcileOutcome,
    ApiResponse, AppState,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub course_id: String,
    pub plan: Plan,
    pub course_name: String,
    /// Price in integer minor units
    pub unit_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_number: String,
    pub payment_status: PaymentStatus,
    pub subtotal: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub currency: String,
    pub external_payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderDetail> for OrderResponse {
    fn from(detail: OrderDetail) -> Self {
        Self {
            order_number: detail.order.order_number,
            payment_status: detail.order.payment_status,
            subtotal: detail.order.subtotal,
            tax_amount: detail.order.tax_amount,
            total_amount: detail.order.total_amount,
            currency: detail.order.currency,
            external_payment_ref: detail.order.external_payment_ref,
            created_at: detail.order.created_at,
            updated_at: detail.order.updated_at,
            items: detail
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    course_id: item.course_id,
                    plan: item.plan,
                    course_name: item.course_name,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

/// List the calling buyer's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Buyer's orders", body = ApiResponse<Vec<OrderResponse>>),
        (status = 401, description = "Unauthenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state.services.orders.list_orders(&buyer.id).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(OrderResponse::from).collect(),
    )))
}

/// Fetch one of the calling buyer's orders by order number
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_number}",
    params(
        ("order_number" = String, Path, description = "Human-facing order number")
    ),
    responses(
        (status = 200, description = "Order with line items", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Order belongs to another buyer", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let detail = state
        .services
        .orders
        .get_order_for_buyer(&buyer.id, &order_number)
        .await?;
    Ok(Json(ApiResponse::success(OrderResponse::from(detail))))
}

/// Re-run reconciliation for an order.
///
/// Safe to call any number of times; a settled order reports its stored
/// state. Used by status pages when a buyer returns long after paying.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_number}/reconcile",
    params(
        ("order_number" = String, Path, description = "Human-facing order number")
    ),
    responses(
        (status = 200, description = "Authoritative payment outcome", body = ApiResponse<ReconcileOutcome>),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unavailable; outcome unknown, retry", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn reconcile_order(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<ReconcileOutcome>>, ServiceError> {
    state
        .services
        .orders
        .get_order_for_buyer(&buyer.id, &order_number)
        .await?;

    let outcome = state.services.reconciliation.reconcile(&order_number).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:order_number", get(get_order))
        .route("/:order_number/reconcile", post(reconcile_order))
}
