//! `POST /auth/token`: mint a bearer token for any user id.
//!
//! Mounted only when `LISTKEEP_DEV_TOKENS` is set. Anyone who can reach it
//! can act as any user, so it is for local development and demos.

use axum::{extract::State, routing::post, Json, Router};
use listkeep_core::UserInfo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::AuthConfig,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevTokenRequest {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl DevTokenRequest {
    fn into_user(self) -> ApiResult<UserInfo> {
        let id = self.user_id.trim();
        if id.is_empty() {
            return Err(ApiError::validation_failed("user_id must not be empty"));
        }
        let user = UserInfo::new(id).with_roles(self.roles);
        Ok(match self.email {
            Some(email) => user.with_email(email),
            None => user,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevTokenResponse {
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user_id: String,
}

pub async fn issue_dev_token(
    State(auth): State<Arc<AuthConfig>>,
    Json(request): Json<DevTokenRequest>,
) -> ApiResult<Json<DevTokenResponse>> {
    let user = request.into_user()?;
    let access_token = auth.issue_token(&user)?;
    tracing::info!(user_id = %user.id, "issued development token");

    Ok(Json(DevTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: auth.token_ttl_secs,
        user_id: user.id.to_string(),
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/token", post(issue_dev_token))
}
