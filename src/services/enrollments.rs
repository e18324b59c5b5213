use crate::{
    entities::{enrollment, order, order_item},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Enrollment grants: the projection of a completed order's line items into
/// per-buyer course access. Nothing else writes this table.
#[derive(Clone)]
pub struct EnrollmentService {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Grants access for every line item of a completed order, on the
    /// caller's connection so the grant commits atomically with the status
    /// transition. Re-granting an already-held (course, plan) is skipped,
    /// which makes repeat settlement attempts harmless.
    #[instrument(skip(self, conn, order, items), fields(order_id = %order.id))]
    pub async fn grant_for_order_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: &order::Model,
        items: &[order_item::Model],
    ) -> Result<Vec<enrollment::Model>, ServiceError> {
        let buyer_id = match &order.buyer_id {
            Some(id) => id.clone(),
            None => {
                warn!(order_id = %order.id, "completed order has no buyer; nothing to enroll");
                return Ok(Vec::new());
            }
        };

        let mut granted = Vec::new();
        for item in items {
            let exists = enrollment::Entity::find()
                .filter(enrollment::Column::BuyerId.eq(buyer_id.clone()))
                .filter(enrollment::Column::CourseId.eq(item.course_id.clone()))
                .filter(enrollment::Column::Plan.eq(item.plan))
                .one(conn)
                .await?
                .is_some();
            if exists {
                continue;
            }

            let model = enrollment::ActiveModel {
                id: Set(Uuid::new_v4()),
                buyer_id: Set(buyer_id.clone()),
                course_id: Set(item.course_id.clone()),
                plan: Set(item.plan),
                course_name: Set(item.course_name.clone()),
                order_id: Set(order.id),
                enrolled_at: Set(Utc::now()),
                access_granted: Set(true),
            };
            granted.push(model.insert(conn).await?);
        }

        Ok(granted)
    }

    pub async fn list_enrollments(
        &self,
        buyer_id: &str,
    ) -> Result<Vec<enrollment::Model>, ServiceError> {
        enrollment::Entity::find()
            .filter(enrollment::Column::BuyerId.eq(buyer_id))
            .order_by_desc(enrollment::Column::EnrolledAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }
}
