//! Payment gateway adapter.
//!
//! Two server-side calls against the external processor: open a payment
//! session, and read back the authoritative status of an order. The status
//! endpoint is the only source of truth for whether money moved; nothing the
//! buyer's browser sends (including the success redirect itself) can settle
//! an order.

pub mod rest;
pub mod stub;

use crate::config::{GatewayConfig, GatewayMode};
use crate::errors::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use rest::RestPaymentGateway;
pub use stub::StubPaymentGateway;

/// Everything the processor needs to open a checkout session.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    /// Our order number doubles as the processor-side order id
    pub order_number: String,
    /// Amount in integer minor units
    pub amount_minor: i64,
    pub currency: String,
    pub buyer_id: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    /// Where the processor sends the buyer after the attempt
    pub return_url: String,
}

/// A live checkout session at the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    pub session_id: String,
    /// Where the client must send the buyer to complete payment
    pub redirect_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Success,
    Failed,
}

/// The processor's authoritative answer for one order.
#[derive(Debug, Clone)]
pub struct GatewayVerdict {
    pub status: GatewayPaymentStatus,
    pub amount_minor: i64,
    pub currency: String,
    /// Processor-side transaction reference, when one exists
    pub reference: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment session. Network trouble or a non-2xx answer surfaces
    /// as `GatewayUnavailable`; the order stays pending and the buyer retries.
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, ServiceError>;

    /// Reads the authoritative payment status for an order.
    ///
    /// A reachable processor reporting anything but paid is a `Failed`
    /// verdict; an unreachable processor is `GatewayUnavailable` and must not
    /// be treated as a payment failure.
    async fn verify(&self, order_number: &str) -> Result<GatewayVerdict, ServiceError>;
}

/// Builds the configured gateway. The stub is an explicit configuration
/// choice for disconnected operation, not an environment-sniffing fallback.
pub fn from_config(config: &GatewayConfig) -> Result<Arc<dyn PaymentGateway>, ServiceError> {
    match config.mode {
        GatewayMode::Rest => Ok(Arc::new(RestPaymentGateway::new(config)?)),
        GatewayMode::Stub => {
            let default_outcome = match config.stub_outcome.to_ascii_lowercase().as_str() {
                "success" => GatewayPaymentStatus::Success,
                "failed" => GatewayPaymentStatus::Failed,
                other => {
                    return Err(ServiceError::ConfigError(format!(
                        "unknown stub outcome: {}",
                        other
                    )))
                }
            };
            Ok(Arc::new(StubPaymentGateway::new(default_outcome)))
        }
    }
}
