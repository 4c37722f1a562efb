//! ============================================================================
//! Provider Module - The external OAuth 1.0a provider (X)
//! ============================================================================
//! `OAuthProvider` is the seam between the flow controller / profile fetcher
//! and the network. `TwitterProvider` talks to the real X API; tests inject
//! their own implementations.
//! ============================================================================

mod twitter;

pub use twitter::TwitterProvider;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{AccessCredential, LinkError, PendingRequestToken};

/// Raw user object returned by `account/verify_credentials`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedUser {
    pub id_str: String,
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
}

/// The three OAuth 1.0a legs plus the credential check
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Leg 1: obtain a temporary request token bound to `callback_url`
    async fn request_token(&self, callback_url: &str) -> Result<PendingRequestToken, LinkError>;

    /// Leg 2: where the user approves the request token
    fn authorize_url(&self, request_token: &str) -> String;

    /// Leg 3: trade the request token and verifier for an access token
    async fn access_token(
        &self,
        pending: &PendingRequestToken,
        verifier: &str,
    ) -> Result<AccessCredential, LinkError>;

    /// Signed call to the credential verification endpoint
    async fn verify_credentials(
        &self,
        credential: &AccessCredential,
    ) -> Result<VerifiedUser, LinkError>;
}
