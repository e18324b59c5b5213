use crate::entities::order::PaymentStatus;
use crate::entities::order_item::Plan;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events emitted by the order and payment lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        order_number: String,
    },
    PaymentCompleted {
        order_id: Uuid,
        reference: Option<String>,
    },
    PaymentFailed {
        order_id: Uuid,
    },
    EnrollmentGranted {
        buyer_id: String,
        course_id: String,
        plan: Plan,
    },
    /// A fresh gateway verdict disagreed with a stored terminal order state.
    /// The stored state is never overwritten; this event exists for operators.
    ReconciliationAnomaly {
        order_id: Uuid,
        stored: PaymentStatus,
        reported: PaymentStatus,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background consumer for lifecycle events. Anomalies are escalated to the
/// error log; everything else is informational.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ReconciliationAnomaly {
                order_id,
                stored,
                reported,
            } => {
                error!(
                    %order_id,
                    stored = %stored,
                    reported = %reported,
                    "reconciliation anomaly: gateway verdict disagrees with stored terminal state"
                );
            }
            Event::PaymentFailed { order_id } => {
                warn!(%order_id, "payment failed");
            }
            other => {
                info!(event = ?other, "lifecycle event");
            }
        }
    }
}
