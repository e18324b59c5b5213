//! Identity-provider integration.
//!
//! Buyers authenticate against an external identity provider; this service
//! only verifies the provider's bearer token and lifts `{sub, email, name}`
//! out of it. Checkout and account surfaces are gated on a valid token, so
//! unauthenticated buyers never reach order creation.

use crate::errors::ServiceError;
use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by the identity provider's token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Provider-issued opaque buyer id
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
}

/// The buyer behind the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedBuyer {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl AuthenticatedBuyer {
    /// Best-effort display name for the lazy profile create: the provider's
    /// name claim, falling back to the local part of the email address.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(self.email.as_str())
                .to_string(),
        }
    }
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ServiceError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ServiceError::Unauthorized(format!("invalid bearer token: {}", e)))
}

/// Issues a token the way the identity provider would. Used by local tooling
/// and the integration harness; production tokens come from the provider.
pub fn mint_token(
    secret: &str,
    buyer_id: &str,
    email: &str,
    name: Option<&str>,
    ttl_secs: u64,
) -> Result<String, ServiceError> {
    let claims = Claims {
        sub: buyer_id.to_string(),
        email: email.to_string(),
        name: name.map(|n| n.to_string()),
        exp: (chrono::Utc::now().timestamp() as usize) + ttl_secs as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {}", e)))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedBuyer
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?
            .trim();

        let claims = verify_token(&app_state.config.jwt_secret, token)?;

        Ok(AuthenticatedBuyer {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}
