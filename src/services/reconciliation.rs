use crate::{
    entities::order::{self, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{GatewayPaymentStatus, PaymentGateway},
    services::enrollments::EnrollmentService,
    services::orders::{OrderService, TransitionOutcome},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

/// What a reconciliation run concluded about an order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconcileOutcome {
    pub order_number: String,
    pub payment_status: PaymentStatus,
    /// The client clears its cart exactly when this is true
    pub clear_cart: bool,
}

impl ReconcileOutcome {
    fn for_order(order: &order::Model) -> Self {
        Self {
            order_number: order.order_number.clone(),
            payment_status: order.payment_status,
            clear_cart: order.payment_status == PaymentStatus::Completed,
        }
    }
}

/// Applies the processor's verdict to the order record, exactly once.
///
/// Re-entrant by design: the buyer can land on the return URL any number of
/// times, revisit the status page days later, or race a duplicate tab, and
/// the order still settles once. The conditional status write in the order
/// repository is what serializes the winners.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    orders: Arc<OrderService>,
    enrollments: Arc<EnrollmentService>,
    event_sender: Arc<EventSender>,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        orders: Arc<OrderService>,
        enrollments: Arc<EnrollmentService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            gateway,
            orders,
            enrollments,
            event_sender,
        }
    }

    /// Fetches the authoritative verdict and settles the order.
    ///
    /// The verdict always comes from a fresh gateway call; the fact that the
    /// buyer arrived on a success URL proves nothing. If the gateway is
    /// unreachable while the order is still pending, the error propagates
    /// and the order stays pending for a later retry.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, order_number: &str) -> Result<ReconcileOutcome, ServiceError> {
        let detail = self.orders.get_order(order_number).await?;

        if detail.order.payment_status.is_terminal() {
            self.audit_terminal(&detail.order).await;
            return Ok(ReconcileOutcome::for_order(&detail.order));
        }

        let verdict = self.gateway.verify(order_number).await?;
        let target = match verdict.status {
            GatewayPaymentStatus::Success => PaymentStatus::Completed,
            GatewayPaymentStatus::Failed => PaymentStatus::Failed,
        };

        if target == PaymentStatus::Completed
            && verdict.amount_minor != detail.order.total_amount
        {
            warn!(
                order_number,
                expected = detail.order.total_amount,
                reported = verdict.amount_minor,
                "gateway-reported amount differs from order total"
            );
        }

        let txn = self.db.begin().await?;
        let outcome = self
            .orders
            .update_status_on(&txn, detail.order.id, target, verdict.reference.clone())
            .await?;

        let granted = match (&outcome, target) {
            (TransitionOutcome::Applied, PaymentStatus::Completed) => {
                self.enrollments
                    .grant_for_order_on(&txn, &detail.order, &detail.items)
                    .await?
            }
            _ => Vec::new(),
        };
        txn.commit().await?;

        match outcome {
            TransitionOutcome::Applied => {
                match target {
                    PaymentStatus::Completed => {
                        info!(order_number, "payment completed, access granted");
                        let _ = self
                            .event_sender
                            .send(Event::PaymentCompleted {
                                order_id: detail.order.id,
                                reference: verdict.reference,
                            })
                            .await;
                        for enrollment in &granted {
                            let _ = self
                                .event_sender
                                .send(Event::EnrollmentGranted {
                                    buyer_id: enrollment.buyer_id.clone(),
                                    course_id: enrollment.course_id.clone(),
                                    plan: enrollment.plan,
                                })
                                .await;
                        }
                    }
                    PaymentStatus::Failed => {
                        info!(order_number, "payment failed, cart preserved");
                        let _ = self
                            .event_sender
                            .send(Event::PaymentFailed {
                                order_id: detail.order.id,
                            })
                            .await;
                    }
                    PaymentStatus::Pending => unreachable!("settlement target is terminal"),
                }

                Ok(ReconcileOutcome {
                    order_number: order_number.to_string(),
                    payment_status: target,
                    clear_cart: target == PaymentStatus::Completed,
                })
            }
            TransitionOutcome::AlreadySettled(stored) => {
                // Lost the race to a concurrent settlement. Report the
                // stored state; flag it if this verdict disagrees.
                if stored != target {
                    self.report_anomaly(&detail.order, stored, target).await;
                }
                Ok(ReconcileOutcome {
                    order_number: order_number.to_string(),
                    payment_status: stored,
                    clear_cart: stored == PaymentStatus::Completed,
                })
            }
        }
    }

    /// Re-verifies an already settled order. The stored terminal state
    /// always stands; a disagreeing verdict is an operator-facing anomaly
    /// and an unreachable gateway is only a log line, since the stored
    /// answer is already known.
    async fn audit_terminal(&self, order: &order::Model) {
        match self.gateway.verify(&order.order_number).await {
            Ok(verdict) => {
                let reported = match verdict.status {
                    GatewayPaymentStatus::Success => PaymentStatus::Completed,
                    GatewayPaymentStatus::Failed => PaymentStatus::Failed,
                };
                if reported != order.payment_status {
                    self.report_anomaly(order, order.payment_status, reported)
                        .await;
                }
            }
            Err(e) => {
                warn!(
                    order_number = %order.order_number,
                    error = %e,
                    "gateway unavailable while re-verifying a settled order"
                );
            }
        }
    }

    async fn report_anomaly(
        &self,
        order: &order::Model,
        stored: PaymentStatus,
        reported: PaymentStatus,
    ) {
        error!(
            order_number = %order.order_number,
            stored = %stored,
            reported = %reported,
            "gateway verdict disagrees with settled order; keeping stored state"
        );
        let _ = self
            .event_sender
            .send(Event::ReconciliationAnomaly {
                order_id: order.id,
                stored,
                reported,
            })
            .await;
    }
}
