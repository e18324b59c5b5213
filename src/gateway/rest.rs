use super::{
    CreateSessionRequest, GatewayPaymentStatus, GatewaySession, GatewayVerdict, PaymentGateway,
};
use crate::config::GatewayConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Order status value the processor uses for a settled payment. Everything
/// else (active, expired, terminated, ...) means the money did not move.
const PAID_STATUS: &str = "PAID";

/// HTTP client for the payment processor's REST API.
///
/// Credentials ride in headers on every call and exist only server-side;
/// the browser never sees them.
#[derive(Clone)]
pub struct RestPaymentGateway {
    client: reqwest::Client,
    endpoint: String,
    app_id: String,
    secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    order_id: String,
    /// Major-unit decimal amount, the shape this processor expects
    order_amount: Decimal,
    order_currency: String,
    customer_details: CustomerDetails,
    order_meta: OrderMeta,
}

#[derive(Debug, Serialize)]
struct CustomerDetails {
    customer_id: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
}

#[derive(Debug, Serialize)]
struct OrderMeta {
    return_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    payment_session_id: String,
    #[serde(default)]
    payment_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderStatusResponse {
    order_status: String,
    order_amount: Decimal,
    order_currency: String,
    #[serde(default)]
    transaction_reference: Option<String>,
}

impl RestPaymentGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::ConfigError(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Minor units to the major-unit decimal this processor's API takes.
    fn to_major(amount_minor: i64) -> Decimal {
        Decimal::new(amount_minor, 2)
    }

    /// Back from the processor's major-unit decimal into minor units.
    fn to_minor(amount_major: Decimal) -> i64 {
        (amount_major * Decimal::from(100)).round().to_i64().unwrap_or(0)
    }
}

#[async_trait]
impl PaymentGateway for RestPaymentGateway {
    #[instrument(skip(self, request), fields(order_number = %request.order_number))]
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, ServiceError> {
        let body = CreateOrderBody {
            order_id: request.order_number.clone(),
            order_amount: Self::to_major(request.amount_minor),
            order_currency: request.currency.clone(),
            customer_details: CustomerDetails {
                customer_id: request.buyer_id,
                customer_name: request.buyer_name,
                customer_email: request.buyer_email,
                customer_phone: request.buyer_phone,
            },
            order_meta: OrderMeta {
                return_url: request.return_url,
            },
        };

        let response = self
            .client
            .post(format!("{}/orders", self.endpoint))
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "gateway rejected session create");
            return Err(ServiceError::GatewayUnavailable(format!(
                "session create returned {}",
                status
            )));
        }

        let created: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayUnavailable(format!("malformed response: {}", e)))?;

        let redirect_url = created.payment_link.unwrap_or_else(|| {
            format!(
                "{}/sessions/{}/pay",
                self.endpoint, created.payment_session_id
            )
        });

        info!(session_id = %created.payment_session_id, "gateway session opened");

        Ok(GatewaySession {
            session_id: created.payment_session_id,
            redirect_url,
        })
    }

    #[instrument(skip(self))]
    async fn verify(&self, order_number: &str) -> Result<GatewayVerdict, ServiceError> {
        let response = self
            .client
            .get(format!("{}/orders/{}", self.endpoint, order_number))
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "gateway rejected status read");
            return Err(ServiceError::GatewayUnavailable(format!(
                "status read returned {}",
                status
            )));
        }

        let status_body: OrderStatusResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayUnavailable(format!("malformed response: {}", e)))?;

        let status = if status_body.order_status == PAID_STATUS {
            GatewayPaymentStatus::Success
        } else {
            GatewayPaymentStatus::Failed
        };

        info!(
            order_status = %status_body.order_status,
            "gateway verdict received"
        );

        Ok(GatewayVerdict {
            status,
            amount_minor: Self::to_minor(status_body.order_amount),
            currency: status_body.order_currency,
            reference: status_body.transaction_reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_major_conversion_round_trips() {
        assert_eq!(RestPaymentGateway::to_major(3892), dec!(38.92));
        assert_eq!(RestPaymentGateway::to_minor(dec!(38.92)), 3892);
        assert_eq!(RestPaymentGateway::to_minor(dec!(0)), 0);
    }
}
