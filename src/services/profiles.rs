use crate::{auth::AuthenticatedBuyer, entities::buyer_profile, errors::ServiceError};
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, DatabaseConnection, EntityTrait, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Buyer profile management.
///
/// Profiles are created lazily the first time a buyer places an order, from
/// whatever the identity provider knows about them; the buyer can fill in
/// the rest later.
#[derive(Clone)]
pub struct BuyerProfileService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub avatar_ref: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar_ref: Option<String>,
    pub bio: Option<String>,
}

impl From<buyer_profile::Model> for ProfileResponse {
    fn from(model: buyer_profile::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            avatar_ref: model.avatar_ref,
            bio: model.bio,
        }
    }
}

impl BuyerProfileService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Makes sure a profile row exists for the buyer, creating one from the
    /// identity provider's claims when absent. Order creation calls this
    /// first and aborts if it fails, so an order can never reference a
    /// missing profile.
    #[instrument(skip(self, buyer), fields(buyer_id = %buyer.id))]
    pub async fn ensure_profile(
        &self,
        buyer: &AuthenticatedBuyer,
    ) -> Result<buyer_profile::Model, ServiceError> {
        if let Some(existing) = self.find_profile(&buyer.id).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = buyer_profile::ActiveModel {
            id: Set(buyer.id.clone()),
            name: Set(buyer.display_name()),
            email: Set(buyer.email.clone()),
            phone: Set(String::new()),
            avatar_ref: Set(None),
            bio: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };

        // Two first orders can race here; whoever loses the insert just
        // reads the winner's row back.
        buyer_profile::Entity::insert(model)
            .on_conflict(
                OnConflict::column(buyer_profile::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await
            .map_err(|e| ServiceError::ProfileCreationFailed(e.to_string()))?;

        let profile = self
            .find_profile(&buyer.id)
            .await?
            .ok_or_else(|| {
                ServiceError::ProfileCreationFailed(format!(
                    "profile for buyer {} missing after upsert",
                    buyer.id
                ))
            })?;

        info!(buyer_id = %buyer.id, "buyer profile created");
        Ok(profile)
    }

    pub async fn get_profile(
        &self,
        buyer_id: &str,
    ) -> Result<buyer_profile::Model, ServiceError> {
        self.find_profile(buyer_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Profile for buyer {} not found", buyer_id))
        })
    }

    /// Partial update of the buyer-editable fields.
    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        buyer: &AuthenticatedBuyer,
        input: UpdateProfileInput,
    ) -> Result<buyer_profile::Model, ServiceError> {
        input.validate()?;

        // An update before any order exists simply creates the profile.
        let profile = self.ensure_profile(buyer).await?;

        let mut active: buyer_profile::ActiveModel = profile.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(avatar_ref) = input.avatar_ref {
            active.avatar_ref = Set(Some(avatar_ref));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    async fn find_profile(
        &self,
        buyer_id: &str,
    ) -> Result<Option<buyer_profile::Model>, ServiceError> {
        buyer_profile::Entity::find_by_id(buyer_id.to_string())
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)
    }
}
