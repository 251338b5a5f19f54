//! Credential resolution.
//!
//! A request names its acting user with either an `X-API-Key` header or an
//! `Authorization: Bearer <jwt>` header. [`Credential::from_headers`] picks
//! the credential out of the headers and [`AuthConfig::resolve`] turns it
//! into a [`UserInfo`]. A request with neither header has no credential;
//! whether that is acceptable is decided per route in [`crate::middleware`].
//!
//! Tokens are HS256 JWTs whose `sub` claim becomes the user id. Expiry is
//! checked against an injectable [`JwtClock`] rather than inside
//! `jsonwebtoken`, so tests can pin time.

use crate::error::{ApiError, ApiResult};
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use listkeep_core::{ConfigError, UserId, UserInfo};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_LEEWAY_SECS: i64 = 60;

/// Number of key characters kept in an API-key principal's user id.
const API_KEY_PRINCIPAL_PREFIX: usize = 8;

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "now" for token issue and expiry.
pub trait JwtClock: Send + Sync {
    /// Unix epoch seconds. Negative only when the host clock is broken.
    fn now_epoch_secs(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// SIGNING SECRET
// ============================================================================

/// HMAC signing secret. Its `Debug` output never contains the value.
#[derive(Clone)]
pub struct SigningSecret(SecretString);

impl SigningSecret {
    pub fn new(secret: String) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            });
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Blank input falls back to the built-in development secret.
    fn or_default(secret: String) -> Self {
        Self::new(secret).unwrap_or_else(|_| Self::insecure_default())
    }

    fn insecure_default() -> Self {
        Self(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into()))
    }

    fn bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }

    fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// A credential presented by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    ApiKey(&'a str),
    Bearer(&'a str),
}

impl<'a> Credential<'a> {
    /// Pick the request's credential. `X-API-Key` wins when both headers are
    /// present; an `Authorization` header with any scheme other than
    /// `Bearer` is an error, not an absent credential.
    pub fn from_headers(headers: &'a HeaderMap) -> ApiResult<Option<Self>> {
        if let Some(value) = headers.get("x-api-key") {
            let key = value
                .to_str()
                .map_err(|_| ApiError::unauthorized("X-API-Key is not valid text"))?;
            return Ok(Some(Credential::ApiKey(key)));
        }

        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value
            .to_str()
            .map_err(|_| ApiError::invalid_token("Authorization header is not valid text"))?;

        match value.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(Credential::Bearer(token.trim()))),
            None => Err(ApiError::invalid_token(
                "Authorization header must use Bearer scheme",
            )),
        }
    }
}

// ============================================================================
// CLAIMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The acting user's id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    fn for_user(user: &UserInfo, now: i64, ttl_secs: i64) -> Self {
        Self {
            sub: user.id.as_str().to_string(),
            iat: now,
            exp: now + ttl_secs,
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }

    pub fn into_user_info(self) -> UserInfo {
        let user = UserInfo::new(UserId::new(self.sub)).with_roles(self.roles);
        match self.email {
            Some(email) => user.with_email(email),
            None => user,
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub struct AuthConfig {
    /// Accepted `X-API-Key` values.
    pub api_keys: HashSet<String>,
    pub secret: SigningSecret,
    pub algorithm: Algorithm,
    /// Lifetime of issued tokens.
    pub token_ttl_secs: i64,
    /// Grace period past `exp` before a token counts as expired.
    pub leeway_secs: i64,
    pub clock: Arc<dyn JwtClock>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_keys", &format!("[{} keys]", self.api_keys.len()))
            .field("secret", &self.secret)
            .field("algorithm", &self.algorithm)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: HashSet::new(),
            secret: SigningSecret::insecure_default(),
            algorithm: Algorithm::HS256,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            leeway_secs: DEFAULT_LEEWAY_SECS,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Read `LISTKEEP_API_KEYS` (comma separated), `LISTKEEP_JWT_SECRET`,
    /// `LISTKEEP_JWT_EXPIRATION_SECS` and `LISTKEEP_JWT_CLOCK_SKEW_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_keys: HashSet<String> = lookup("LISTKEEP_API_KEYS")
            .map(|keys| {
                keys.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let secs = |key: &str, default: i64| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            api_keys,
            secret: lookup("LISTKEEP_JWT_SECRET")
                .map(SigningSecret::or_default)
                .unwrap_or_else(SigningSecret::insecure_default),
            token_ttl_secs: secs("LISTKEEP_JWT_EXPIRATION_SECS", DEFAULT_TOKEN_TTL_SECS),
            leeway_secs: secs("LISTKEEP_JWT_CLOCK_SKEW_SECS", DEFAULT_LEEWAY_SECS),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = SigningSecret::or_default(secret.into());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn JwtClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.insert(key.into());
        self
    }

    pub fn warn_if_insecure(&self) {
        if self.secret.is_insecure_default() {
            tracing::warn!(
                "Using the built-in JWT secret. Set LISTKEEP_JWT_SECRET before deploying."
            );
        } else if self.secret.len() < 32 {
            tracing::warn!(
                secret_len = self.secret.len(),
                "JWT secret is shorter than 32 characters"
            );
        }
    }

    /// The user a credential speaks for.
    ///
    /// An API key resolves to a service principal named after the key's
    /// first characters; a bearer token resolves to its `sub` claim.
    pub fn resolve(&self, credential: Credential<'_>) -> ApiResult<UserInfo> {
        match credential {
            Credential::ApiKey(key) => {
                if !self.api_keys.contains(key) {
                    return Err(ApiError::unauthorized("Invalid API key"));
                }
                let prefix: String = key.chars().take(API_KEY_PRINCIPAL_PREFIX).collect();
                Ok(UserInfo::new(format!("api_key_{}", prefix)))
            }
            Credential::Bearer(token) => {
                let claims = self.verify_token(token)?;
                if claims.sub.trim().is_empty() {
                    return Err(ApiError::invalid_token("Token subject is empty"));
                }
                Ok(claims.into_user_info())
            }
        }
    }

    /// Sign a token for `user`, valid for `token_ttl_secs` from now.
    pub fn issue_token(&self, user: &UserInfo) -> ApiResult<String> {
        let claims = Claims::for_user(user, self.clock.now_epoch_secs(), self.token_ttl_secs);
        encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.bytes()),
        )
        .map_err(|e| ApiError::internal_error(format!("Failed to sign token: {}", e)))
    }

    /// Check a token's signature, then its expiry against the clock.
    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token is invalid: {}", e)),
        })?
        .claims;

        let now = self.clock.now_epoch_secs();
        if now < 0 {
            tracing::error!(timestamp = now, "system clock is before the Unix epoch");
            return Err(ApiError::internal_error("Server clock misconfigured"));
        }
        if claims.exp < now - self.leeway_secs {
            return Err(ApiError::token_expired());
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::HeaderValue;

    /// 2024-01-01 00:00:00 UTC
    const NOW: i64 = 1_704_067_200;

    fn config_at(now: i64) -> AuthConfig {
        AuthConfig::default()
            .with_secret("test_secret_for_unit_tests_0123456789")
            .with_clock(Arc::new(FixedClock(now)))
            .with_api_key("valid_key_123")
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_token_carries_user_details() -> ApiResult<()> {
        let config = config_at(NOW);
        let user = UserInfo::new("alice")
            .with_email("alice@example.com")
            .with_roles(vec!["admin".to_string()]);

        let token = config.issue_token(&user)?;
        assert_eq!(config.resolve(Credential::Bearer(&token))?, user);
        Ok(())
    }

    #[test]
    fn test_token_from_yesterday_is_expired() -> ApiResult<()> {
        let token = config_at(NOW - 86_400).issue_token(&UserInfo::new("alice"))?;

        let err = config_at(NOW).verify_token(&token);
        assert!(matches!(err, Err(e) if e.code == ErrorCode::TokenExpired));
        Ok(())
    }

    #[test]
    fn test_expiry_within_leeway_accepted() -> ApiResult<()> {
        let token = config_at(NOW - 3600 - 30).issue_token(&UserInfo::new("alice"))?;
        assert!(config_at(NOW).verify_token(&token).is_ok());
        Ok(())
    }

    #[test]
    fn test_token_signed_elsewhere_rejected() -> ApiResult<()> {
        let token = config_at(NOW)
            .with_secret("another_secret_entirely_0123456789")
            .issue_token(&UserInfo::new("alice"))?;

        let err = config_at(NOW).verify_token(&token);
        assert!(matches!(err, Err(e) if e.code == ErrorCode::InvalidToken));
        Ok(())
    }

    #[test]
    fn test_api_key_principal() -> ApiResult<()> {
        let user = config_at(NOW).resolve(Credential::ApiKey("valid_key_123"))?;
        assert_eq!(user.id, UserId::new("api_key_valid_ke"));
        Ok(())
    }

    #[test]
    fn test_unknown_api_key_rejected() {
        let err = config_at(NOW).resolve(Credential::ApiKey("nope"));
        assert!(matches!(err, Err(e) if e.code == ErrorCode::Unauthorized));
    }

    #[test]
    fn test_header_selection() -> ApiResult<()> {
        assert_eq!(Credential::from_headers(&headers(&[]))?, None);
        assert_eq!(
            Credential::from_headers(&headers(&[("authorization", "Bearer  abc ")]))?,
            Some(Credential::Bearer("abc"))
        );
        assert_eq!(
            Credential::from_headers(&headers(&[
                ("x-api-key", "k1"),
                ("authorization", "Bearer abc"),
            ]))?,
            Some(Credential::ApiKey("k1"))
        );
        Ok(())
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let map = headers(&[("authorization", "Basic abc")]);
        let err = Credential::from_headers(&map);
        assert!(matches!(err, Err(e) if e.code == ErrorCode::InvalidToken));
    }

    #[test]
    fn test_secret_is_redacted() {
        let rendered = format!("{:?}", config_at(NOW));
        assert!(!rendered.contains("test_secret_for_unit_tests"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_blank_secret_falls_back_to_default() {
        assert!(AuthConfig::default().with_secret("   ").secret.is_insecure_default());
    }

    #[test]
    fn test_env_lookup() {
        let config = AuthConfig::from_lookup(|key| match key {
            "LISTKEEP_API_KEYS" => Some(" k1, ,k2 ".to_string()),
            "LISTKEEP_JWT_EXPIRATION_SECS" => Some("120".to_string()),
            _ => None,
        });
        assert_eq!(config.api_keys.len(), 2);
        assert!(config.api_keys.contains("k2"));
        assert_eq!(config.token_ttl_secs, 120);
        assert_eq!(config.leeway_secs, DEFAULT_LEEWAY_SECS);
        assert!(config.secret.is_insecure_default());
    }
}
