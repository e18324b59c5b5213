use crate::{
    auth::AuthenticatedBuyer,
    cart::CartItem,
    errors::ServiceError,
    gateway::CreateSessionRequest,
    services::orders::{BillingDetails, CreateOrderInput},
    services::pricing::Pricing,
    services::reconciliation::ReconcileOutcome,
    ApiResponse, AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "billing": {
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
    },
    "items": [
        {"course_id": "c-programming", "plan": "short", "course_name": "C Programming Masterclass", "price": "₹299"}
    ]
}))]
pub struct CheckoutRequest {
    #[validate]
    pub billing: BillingDetails,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_number: String,
    /// Gateway session backing this checkout attempt
    pub session_id: String,
    /// Where the client must send the buyer to pay
    pub redirect_url: String,
    pub pricing: Pricing,
    pub currency: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ConfirmParams {
    /// Order number carried back on the processor's return URL
    pub order_number: String,
}

/// Submit the cart for payment.
///
/// Creates a pending order (billing and line items snapshotted, totals
/// computed server-side) and opens a session at the payment processor. The
/// buyer is then sent to the returned redirect URL; the order settles later,
/// through verification, never through this response.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created and gateway session opened", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Invalid cart or billing details", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthenticated", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway unavailable; order stays pending, retry", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn start_checkout(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), ServiceError> {
    request.validate()?;

    let detail = state
        .services
        .orders
        .create_order(
            &buyer,
            CreateOrderInput {
                billing: request.billing.clone(),
                items: request.items,
            },
        )
        .await?;

    let return_url = format!(
        "{}?order_number={}",
        state.config.gateway.return_url, detail.order.order_number
    );

    // If this call fails the order simply stays pending; the buyer keeps
    // their cart and can submit checkout again.
    let session = state
        .gateway
        .create_session(CreateSessionRequest {
            order_number: detail.order.order_number.clone(),
            amount_minor: detail.order.total_amount,
            currency: detail.order.currency.clone(),
            buyer_id: buyer.id.clone(),
            buyer_name: request.billing.name.clone(),
            buyer_email: request.billing.email.clone(),
            buyer_phone: request.billing.phone.clone(),
            return_url,
        })
        .await?;

    let response = CheckoutResponse {
        order_number: detail.order.order_number.clone(),
        session_id: session.session_id,
        redirect_url: session.redirect_url,
        pricing: Pricing {
            subtotal: detail.order.subtotal,
            tax_amount: detail.order.tax_amount,
            total_amount: detail.order.total_amount,
        },
        currency: detail.order.currency,
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// Return-URL target for the payment processor.
///
/// Arriving here proves nothing: a buyer can be redirected to a success URL
/// without having paid. The handler always re-verifies against the
/// processor before reporting an outcome, and tells the client to clear its
/// cart only when the order actually completed.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/confirm",
    params(ConfirmParams),
    responses(
        (status = 200, description = "Authoritative payment outcome", body = ApiResponse<ReconcileOutcome>),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unavailable; outcome unknown, retry", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn confirm_checkout(
    State(state): State<AppState>,
    buyer: AuthenticatedBuyer,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ApiResponse<ReconcileOutcome>>, ServiceError> {
    // Ownership check before touching the gateway.
    state
        .services
        .orders
        .get_order_for_buyer(&buyer.id, &params.order_number)
        .await?;

    let outcome = state
        .services
        .reconciliation
        .reconcile(&params.order_number)
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

/// Checkout routes
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(start_checkout))
        .route("/confirm", get(confirm_checkout))
}
