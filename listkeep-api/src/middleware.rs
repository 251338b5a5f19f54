//! Axum Middleware for User Context Resolution
//!
//! `user_context_middleware` runs in front of every `/api` route. It
//! resolves the acting user from the request headers and stores it in the
//! request extensions:
//! - valid credentials insert a [`UserInfo`]
//! - missing credentials insert nothing
//! - invalid credentials short-circuit with 401
//!
//! Handlers then pick the policy they need with [`CurrentUser`] (user
//! required) or [`MaybeUser`] (user optional).

use crate::auth::{AuthConfig, Credential};
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use listkeep_core::UserInfo;
use std::sync::Arc;

/// Resolve the acting user and stash it in request extensions.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/todo/all", get(list_todos))
///     .layer(middleware::from_fn_with_state(auth_config, user_context_middleware));
/// ```
pub async fn user_context_middleware(
    State(config): State<Arc<AuthConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = Credential::from_headers(request.headers())
        .and_then(|credential| credential.map(|c| config.resolve(c)).transpose());

    match resolved {
        Ok(Some(user)) => {
            tracing::debug!(user_id = %user.id, "resolved user context");
            request.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(err) => {
            tracing::debug!(code = %err.code, "rejected credentials");
            return err.into_response();
        }
    }

    next.run(request).await
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// The acting user, required.
///
/// Rejects with 401 when the request resolved to no user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserInfo);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserInfo>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                ApiError::unauthorized(
                    "Authentication required: provide X-API-Key or Authorization header",
                )
            })
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = UserInfo;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The acting user, if any. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserInfo>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<UserInfo>().cloned()))
    }
}
