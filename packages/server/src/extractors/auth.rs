use axum::{extract::FromRequestParts, http::request::Parts};

use crate::entity::app_user::ROLE_ADMIN;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header,
/// or from a `token` query parameter so download links can be opened directly.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Returns `Ok(())` for admins, `Err(PermissionDenied)` otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

fn token_from_query(query: &str) -> Option<&str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
        {
            Some(header) => header
                .strip_prefix("Bearer ")
                .ok_or(AppError::TokenInvalid)?,
            None => parts
                .uri
                .query()
                .and_then(token_from_query)
                .ok_or(AppError::TokenMissing)?,
        };

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.role,
        })
    }
}
