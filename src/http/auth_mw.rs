//! Bearer-token extraction (§6 Authentication): every handler that needs
//! a caller pulls one via [`axum::extract::FromRequestParts`], which
//! resolves the token through [`crate::auth::TokenService`] or the
//! API-key store and then hydrates the full [`User`] record so RBAC
//! checks have roles/permissions to work with.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::{authenticate_api_key, TokenService};
use crate::http::error::ApiError;
use crate::rbac::User;
use crate::users::{ApiKeyStore, UserStore};

/// Collaborators an authenticated-caller extractor needs; any app state
/// that derefs to one satisfies the extractor bound via [`FromRef`].
pub struct AuthContext {
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
}

/// The authenticated caller for a request, already hydrated into a full
/// [`User`] so handlers can check permissions directly.
pub struct Caller(pub User);

/// Extracts the bearer token from an `Authorization` header, shared by the
/// `Caller` extractor and the `/auth/logout` handler (which needs the raw
/// token to revoke it, not just the caller it resolves to).
pub fn bearer_token_from_headers(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthenticated("missing bearer token"))
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    bearer_token_from_headers(&parts.headers)
}

impl<S> FromRequestParts<S> for Caller
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_ref(state);
        let token = bearer_token(parts)?;

        let authenticated = if token.starts_with("sk-") {
            let keys = ctx.api_keys.list_active().await?;
            authenticate_api_key(token, &keys).map_err(ApiError::from)?
        } else {
            ctx.tokens.validate(token).await.map_err(ApiError::from)?
        };

        let user = ctx.users.get(&authenticated.user_id).await?;
        if !user.active {
            return Err(ApiError::unauthenticated("account deactivated"));
        }
        Ok(Caller(user))
    }
}

/// Checks `permission` against the caller, returning a 403 that still
/// carries the correlation id (§6: "every handler checks required
/// permission via the RBAC service before proceeding").
pub fn require_permission(caller: &User, permission: &str) -> Result<(), ApiError> {
    if caller.has_permission(permission) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("missing permission {permission}")))
    }
}
