use super::{
    CreateSessionRequest, GatewayPaymentStatus, GatewaySession, GatewayVerdict, PaymentGateway,
};
use crate::errors::ServiceError;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct RecordedSession {
    amount_minor: i64,
    currency: String,
}

/// In-memory gateway for disconnected operation.
///
/// Sessions redirect straight back to the return URL and verdicts come from
/// an in-memory script (falling back to the configured default outcome).
/// Orders this gateway has never opened a session for verify as failed, so a
/// forged callback URL cannot conjure a paid order even in stub mode.
pub struct StubPaymentGateway {
    default_outcome: GatewayPaymentStatus,
    sessions: DashMap<String, RecordedSession>,
    scripted: DashMap<String, GatewayPaymentStatus>,
}

impl StubPaymentGateway {
    pub fn new(default_outcome: GatewayPaymentStatus) -> Self {
        Self {
            default_outcome,
            sessions: DashMap::new(),
            scripted: DashMap::new(),
        }
    }

    /// Pins the verdict the next `verify` calls will report for an order.
    pub fn script(&self, order_number: &str, outcome: GatewayPaymentStatus) {
        self.scripted.insert(order_number.to_string(), outcome);
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<GatewaySession, ServiceError> {
        self.sessions.insert(
            request.order_number.clone(),
            RecordedSession {
                amount_minor: request.amount_minor,
                currency: request.currency.clone(),
            },
        );

        let session_id = format!("stub_{}", Uuid::new_v4().simple());
        info!(order_number = %request.order_number, %session_id, "stub gateway session opened");

        Ok(GatewaySession {
            session_id,
            redirect_url: request.return_url,
        })
    }

    async fn verify(&self, order_number: &str) -> Result<GatewayVerdict, ServiceError> {
        let session = self.sessions.get(order_number);

        let status = match self.scripted.get(order_number) {
            Some(outcome) => *outcome,
            // No session was ever opened for this order: nothing was paid.
            None if session.is_none() => GatewayPaymentStatus::Failed,
            None => self.default_outcome,
        };

        let (amount_minor, currency) = session
            .map(|s| (s.amount_minor, s.currency.clone()))
            .unwrap_or((0, "INR".to_string()));

        let reference = match status {
            GatewayPaymentStatus::Success => Some(format!("stub_txn_{}", order_number)),
            GatewayPaymentStatus::Failed => None,
        };

        Ok(GatewayVerdict {
            status,
            amount_minor,
            currency,
            reference,
        })
    }
}
