use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use footfall_core::{config::AuthMode, event::UserRole};

use crate::{error::AppError, state::AppState};

use super::jwt::decode_jwt;

/// Cookie the web client stores the provider access token in.
pub const SESSION_COOKIE: &str = "footfall_session";

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

/// Optional caller identity. Never rejects: a missing, malformed or expired
/// token simply yields `None`.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

/// A caller holding the admin role.
///
/// Rejects with 401 when no valid token is present and 403 when the user's
/// profile is missing or not `admin`. With `FOOTFALL_AUTH=none` every caller
/// passes and `user_id` is `None`.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub user_id: Option<String>,
}

/// Pull the bearer token from `Authorization`, falling back to the session
/// cookie.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookie_str| {
            cookie_str
                .split(';')
                .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
                .map(|t| t.to_string())
        })
}

/// Verify the request's token against the configured secret.
pub fn identity_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Identity> {
    let AuthMode::Jwt(secret) = &state.config.auth_mode else {
        return None;
    };
    let token = token_from_headers(headers)?;
    match decode_jwt(&token, secret) {
        Ok(claims) => Some(Identity {
            user_id: claims.sub,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid access token");
            None
        }
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(identity_from_headers(state, &parts.headers)))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if state.config.auth_mode == AuthMode::None {
            return Ok(AdminIdentity { user_id: None });
        }

        let identity = identity_from_headers(state, &parts.headers).ok_or(AppError::Unauthorized)?;
        match state.analytics.user_role(&identity.user_id).await? {
            Some(UserRole::Admin) => Ok(AdminIdentity {
                user_id: Some(identity.user_id),
            }),
            _ => {
                tracing::warn!(user_id = %identity.user_id, "Non-admin caller denied analytics access");
                Err(AppError::Forbidden)
            }
        }
    }
}
