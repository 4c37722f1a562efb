//! ============================================================================
//! Core Types for X Account Linking
//! ============================================================================
//! Credentials, pending request tokens, normalized profiles and the error
//! taxonomy shared by the flow controller, token store and profile fetcher.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-lived credential pair for one linked X user.
///
/// Only ever built from a successful access-token exchange, so the token and
/// its secret are always populated together.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    pub provider_user_id: String,
    pub access_token: String,
    pub access_token_secret: String,
    /// Handle (`screen_name`) reported by the exchange
    pub display_name: String,
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("provider_user_id", &self.provider_user_id)
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Temporary request token pair for a single authorization attempt
#[derive(Clone, PartialEq, Eq)]
pub struct PendingRequestToken {
    pub request_token: String,
    pub request_token_secret: String,
    /// Unix timestamp when the provider issued the pair
    pub created_at: i64,
}

impl PendingRequestToken {
    pub fn new(request_token: String, request_token_secret: String) -> Self {
        Self {
            request_token,
            request_token_secret,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether the pair is older than `ttl_secs` at `now`
    pub fn is_expired_at(&self, now: i64, ttl_secs: i64) -> bool {
        now - self.created_at >= ttl_secs
    }
}

impl fmt::Debug for PendingRequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequestToken")
            .field("request_token", &self.request_token)
            .field("request_token_secret", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Where to send the user after a flow starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    /// Provider authorize URL, request token attached
    pub url: String,
    /// Key the pending token was parked under
    pub correlation_id: String,
}

/// Normalized profile returned by `/profile/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Error types for the linking flow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("X API error: {0}")]
    Upstream(String),

    #[error("Request token not found or expired. Start the connection again from /connect.")]
    MissingToken,

    #[error("OAuth verifier missing from callback. Authorization on X was not granted.")]
    MissingVerifier,

    #[error("Stored X credential was rejected (revoked or expired). The user must reconnect.")]
    InvalidCredential,
}

impl LinkError {
    /// Errors the user can fix by restarting the flow
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            LinkError::MissingToken | LinkError::MissingVerifier | LinkError::InvalidCredential
        )
    }
}
