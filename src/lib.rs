//! CourseDesk API Library
//!
//! Order and payment backend for the CourseDesk course marketplace: carts
//! are priced server-side, orders are durable financial records, payment
//! outcomes come only from the processor's status API, and course access is
//! granted strictly as a consequence of a completed payment.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub gateway: Arc<dyn gateway::PaymentGateway>,
    pub services: AppServices,
}

/// Service singletons shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<services::OrderService>,
    pub profiles: Arc<services::BuyerProfileService>,
    pub enrollments: Arc<services::EnrollmentService>,
    pub reconciliation: Arc<services::ReconciliationService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<events::EventSender>,
        gateway: Arc<dyn gateway::PaymentGateway>,
        config: &config::AppConfig,
    ) -> Self {
        let profiles = Arc::new(services::BuyerProfileService::new(db.clone()));
        let orders = Arc::new(services::OrderService::new(
            db.clone(),
            event_sender.clone(),
            profiles.clone(),
            config.tax_rate_bps,
            config.currency.clone(),
        ));
        let enrollments = Arc::new(services::EnrollmentService::new(db.clone()));
        let reconciliation = Arc::new(services::ReconciliationService::new(
            db,
            gateway,
            orders.clone(),
            enrollments.clone(),
            event_sender,
        ));

        Self {
            orders,
            profiles,
            enrollments,
            reconciliation,
        }
    }
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<axum::Json<ApiResponse<T>>, errors::ServiceError>;

/// All v1 API routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/enrollments", handlers::enrollments::enrollment_routes())
        .nest("/profile", handlers::profile::profile_routes())
}

/// Full application router: status, v1 API, Swagger UI, request tracing.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "coursedesk-api up" }))
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
