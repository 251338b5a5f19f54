//! API Configuration Module
//!
//! Configuration for CORS, the enclosing request timeout, listing page sizes
//! and development token issuance. Values are loaded from environment
//! variables with sensible defaults for development.

use std::time::Duration;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, timeouts and listing limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://listkeep.dev,https://app.listkeep.dev"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Request Handling
    // ========================================================================
    /// Enclosing timeout for every request. A timed-out request drops its
    /// handler, which cancels any in-flight retrieval.
    pub request_timeout: Duration,

    /// Page size used when a listing request omits one.
    pub default_page_size: u32,

    /// Upper bound on the page size a client may request.
    pub max_page_size: u32,

    /// Whether `POST /auth/token` is mounted.
    pub dev_tokens: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: 86400, // 24 hours

            request_timeout: Duration::from_secs(30),
            default_page_size: 10,
            max_page_size: 100,
            dev_tokens: false,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `LISTKEEP_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `LISTKEEP_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `LISTKEEP_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `LISTKEEP_REQUEST_TIMEOUT_SECS`: Enclosing request timeout (default: 30)
    /// - `LISTKEEP_DEFAULT_PAGE_SIZE`: Listing page size when omitted (default: 10)
    /// - `LISTKEEP_MAX_PAGE_SIZE`: Largest accepted page size (default: 100)
    /// - `LISTKEEP_DEV_TOKENS`: Mount the dev token endpoint (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to
    /// the default for that field.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("LISTKEEP_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let flag = |key: &str| lookup(key).map(|s| s == "true" || s == "1");

        let default_page_size = parsed("LISTKEEP_DEFAULT_PAGE_SIZE")
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.default_page_size);
        let max_page_size = parsed("LISTKEEP_MAX_PAGE_SIZE")
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_page_size)
            .max(default_page_size);

        Self {
            cors_origins,
            cors_allow_credentials: flag("LISTKEEP_CORS_ALLOW_CREDENTIALS")
                .unwrap_or(defaults.cors_allow_credentials),
            cors_max_age_secs: parsed("LISTKEEP_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            request_timeout: parsed("LISTKEEP_REQUEST_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            default_page_size,
            max_page_size,
            dev_tokens: flag("LISTKEEP_DEV_TOKENS").unwrap_or(defaults.dev_tokens),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_dev_tokens(mut self, enabled: bool) -> Self {
        self.dev_tokens = enabled;
        self
    }

    /// Check if an origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.listkeep.dev
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern))
                        || origin_domain == pattern;
                }
            }
            false
        })
    }

    /// Resolve the page size for a listing request, clamped to the maximum.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}
