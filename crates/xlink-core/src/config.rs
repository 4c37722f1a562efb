//! ============================================================================
//! Link Configuration - Environment-sourced settings
//! ============================================================================
//! Required: X_CONSUMER_KEY, X_CONSUMER_SECRET, SESSION_SECRET, X_CALLBACK_URL
//! Optional: X_API_BASE, PENDING_TOKEN_TTL_SECS, HTTP_TIMEOUT_SECS,
//!           CORRELATION_MODE (session | url)
//! ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::types::LinkError;

/// Default X API host
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Request tokens are only honoured by X for a few minutes
pub const DEFAULT_PENDING_TTL_SECS: i64 = 900;

/// Bound on provider unavailability
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// How the request-token secret survives the authorize redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationMode {
    /// Park the pending token server-side, keyed by the echoed `oauth_token`
    #[default]
    Session,
    /// Append the token pair (HMAC-tagged) to the authorize URL and expect
    /// X to echo it back. Not part of OAuth 1.0a; X may strip the params.
    Url,
}

impl FromStr for CorrelationMode {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "session" | "" => Ok(CorrelationMode::Session),
            "url" => Ok(CorrelationMode::Url),
            other => Err(LinkError::Configuration(format!(
                "Unknown CORRELATION_MODE '{}'. Valid values: session, url",
                other
            ))),
        }
    }
}

/// Provider endpoint set, derived from the API base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub request_token: String,
    pub authorize: String,
    pub access_token: String,
    pub verify_credentials: String,
}

impl ProviderEndpoints {
    pub fn from_base(api_base: &str) -> Self {
        let base = api_base.trim_end_matches('/');
        Self {
            request_token: format!("{}/oauth/request_token", base),
            authorize: format!("{}/oauth/authorize", base),
            access_token: format!("{}/oauth/access_token", base),
            verify_credentials: format!("{}/1.1/account/verify_credentials.json", base),
        }
    }
}

/// Application configuration for the linking backend
#[derive(Clone)]
pub struct LinkConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Keys the HMAC tags on redirect parameters
    pub session_secret: String,
    pub callback_url: String,
    pub api_base: String,
    pub pending_ttl_secs: i64,
    pub http_timeout_secs: u64,
    pub correlation_mode: CorrelationMode,
}

impl LinkConfig {
    /// Load configuration from the process environment.
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, LinkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LinkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, LinkError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(LinkError::Configuration(format!(
                    "{} is not set. Add it to your environment or .env file.",
                    key
                ))),
            }
        };

        let consumer_key = required("X_CONSUMER_KEY")?;
        let consumer_secret = required("X_CONSUMER_SECRET")?;
        let session_secret = required("SESSION_SECRET")?;
        let callback_url = required("X_CALLBACK_URL")?;

        url::Url::parse(&callback_url).map_err(|e| {
            LinkError::Configuration(format!("X_CALLBACK_URL is not a valid URL: {}", e))
        })?;

        let api_base = lookup("X_API_BASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let pending_ttl_secs = parse_or("PENDING_TOKEN_TTL_SECS", &lookup, DEFAULT_PENDING_TTL_SECS)?;
        if pending_ttl_secs <= 0 {
            return Err(LinkError::Configuration(format!(
                "PENDING_TOKEN_TTL_SECS must be positive, got {}",
                pending_ttl_secs
            )));
        }
        let http_timeout_secs = parse_or("HTTP_TIMEOUT_SECS", &lookup, DEFAULT_HTTP_TIMEOUT_SECS)?;

        let correlation_mode = match lookup("CORRELATION_MODE") {
            Some(raw) => raw.parse()?,
            None => CorrelationMode::default(),
        };

        Ok(Self {
            consumer_key,
            consumer_secret,
            session_secret,
            callback_url,
            api_base,
            pending_ttl_secs,
            http_timeout_secs,
            correlation_mode,
        })
    }

    /// Check the values every request path depends on
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.consumer_key.is_empty() || self.consumer_secret.is_empty() {
            return Err(LinkError::Configuration(
                "X API credentials (X_CONSUMER_KEY, X_CONSUMER_SECRET) are not set".to_string(),
            ));
        }
        if self.session_secret.is_empty() {
            return Err(LinkError::Configuration("SESSION_SECRET is not set".to_string()));
        }
        Ok(())
    }

    pub fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints::from_base(&self.api_base)
    }
}

impl fmt::Debug for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConfig")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("api_base", &self.api_base)
            .field("pending_ttl_secs", &self.pending_ttl_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("correlation_mode", &self.correlation_mode)
            .finish()
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, LinkError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| LinkError::Configuration(format!("{} is invalid: {}", key, e))),
        None => Ok(default),
    }
}
