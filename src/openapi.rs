use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CourseDesk API",
        description = "Order and payment backend for the CourseDesk course marketplace",
        version = "0.1.0"
    ),
    paths(
        crate::handlers::checkout::start_checkout,
        crate::handlers::checkout::confirm_checkout,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::reconcile_order,
        crate::handlers::enrollments::list_enrollments,
        crate::handlers::profile::get_profile,
        crate::handlers::profile::update_profile,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::cart::CartItem,
        crate::entities::order::PaymentStatus,
        crate::entities::order_item::Plan,
        crate::errors::ErrorResponse,
        crate::handlers::checkout::CheckoutRequest,
        crate::handlers::checkout::CheckoutResponse,
        crate::handlers::enrollments::EnrollmentResponse,
        crate::handlers::orders::OrderItemResponse,
        crate::handlers::orders::OrderResponse,
        crate::services::orders::BillingAddress,
        crate::services::orders::BillingDetails,
        crate::services::pricing::Pricing,
        crate::services::profiles::ProfileResponse,
        crate::services::profiles::UpdateProfileInput,
        crate::services::reconciliation::ReconcileOutcome,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Checkout", description = "Cart submission and payment confirmation"),
        (name = "Orders", description = "Order records and reconciliation"),
        (name = "Enrollments", description = "Course access grants"),
        (name = "Profile", description = "Buyer profile"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at /docs, serving the document at /api-docs/openapi.json.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
