use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::api::routes::AppState;
use crate::db::User;
use crate::error::AppError;

/// The authenticated caller, resolved from the bearer token. Rejects with
/// Unauthorized when the token is missing, expired, or orphaned.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user_id = state
            .sessions
            .resolve(&token)
            .ok_or(AppError::Unauthorized)?;
        let user = state
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentUser { user, token })
    }
}
