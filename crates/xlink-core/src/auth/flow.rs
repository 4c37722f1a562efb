//! ============================================================================
//! OAuth 1.0a Flow Controller
//! ============================================================================
//! Drives one three-legged authorization per `/connect`:
//!   NotStarted -> RequestTokenIssued -> AwaitingCallback -> Exchanged | Failed
//! The request-token secret is parked in the pending cache keyed by the
//! request token, which X echoes back as `oauth_token` on the callback.
//! ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::pending::PendingTokenCache;
use super::tag::RedirectTagger;
use crate::config::{CorrelationMode, LinkConfig};
use crate::provider::OAuthProvider;
use crate::types::{AccessCredential, LinkError, PendingRequestToken, RedirectTarget};

/// Fallback-mode query params appended to the authorize URL
const URL_TOKEN_PARAM: &str = "xlink_token";
const URL_SECRET_PARAM: &str = "xlink_token_secret";
const URL_ISSUED_PARAM: &str = "xlink_ts";
const URL_SIG_PARAM: &str = "xlink_sig";

/// Lifecycle of a single authorization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    NotStarted,
    RequestTokenIssued,
    AwaitingCallback,
    Exchanged,
    Failed,
}

impl FlowState {
    /// Forward-only transitions; `Exchanged` and `Failed` are terminal
    pub fn can_advance_to(self, next: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (NotStarted, RequestTokenIssued)
                | (NotStarted, Failed)
                | (RequestTokenIssued, AwaitingCallback)
                | (RequestTokenIssued, Failed)
                | (AwaitingCallback, Exchanged)
                | (AwaitingCallback, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Exchanged | FlowState::Failed)
    }
}

/// Tracks the state of one attempt for logging
#[derive(Debug)]
struct FlowAttempt {
    state: FlowState,
}

impl FlowAttempt {
    fn new() -> Self {
        Self {
            state: FlowState::NotStarted,
        }
    }

    fn resume() -> Self {
        Self {
            state: FlowState::AwaitingCallback,
        }
    }

    fn advance(&mut self, next: FlowState) {
        if self.state.can_advance_to(next) {
            debug!("OAuth flow: {:?} -> {:?}", self.state, next);
            self.state = next;
        } else {
            warn!("Ignoring invalid OAuth flow transition {:?} -> {:?}", self.state, next);
        }
    }
}

/// Orchestrates the request-token, authorize and access-token legs
pub struct OAuthFlow {
    config: LinkConfig,
    provider: Arc<dyn OAuthProvider>,
    pending: PendingTokenCache,
    tagger: RedirectTagger,
}

impl OAuthFlow {
    pub fn new(config: LinkConfig, provider: Arc<dyn OAuthProvider>) -> Result<Self, LinkError> {
        let pending = PendingTokenCache::new(config.pending_ttl_secs);
        let tagger = RedirectTagger::new(&config.session_secret)?;
        Ok(Self {
            config,
            provider,
            pending,
            tagger,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Number of authorizations waiting for their callback
    pub async fn pending_count(&self) -> usize {
        self.pending.len().await
    }

    /// Leg 1 + 2: fetch a fresh request token and build the authorize redirect
    pub async fn start(&self, callback_url: &str) -> Result<RedirectTarget, LinkError> {
        self.config.validate()?;

        let mut attempt = FlowAttempt::new();
        let pending = match self.provider.request_token(callback_url).await {
            Ok(pending) => pending,
            Err(e) => {
                attempt.advance(FlowState::Failed);
                return Err(e);
            }
        };
        attempt.advance(FlowState::RequestTokenIssued);

        let correlation_id = pending.request_token.clone();
        let mut url = self.provider.authorize_url(&pending.request_token);

        match self.config.correlation_mode {
            CorrelationMode::Session => {
                self.pending.insert(correlation_id.clone(), pending).await;
            }
            CorrelationMode::Url => {
                url.push_str(&self.fallback_params(&pending));
            }
        }
        attempt.advance(FlowState::AwaitingCallback);

        info!("Redirecting to X authorization page");
        Ok(RedirectTarget {
            url,
            correlation_id,
        })
    }

    /// Leg 3: consume the pending token and exchange the verifier
    pub async fn complete(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<AccessCredential, LinkError> {
        if let Some(denied) = params.get("denied") {
            self.pending.discard(denied).await;
            info!("User denied the X authorization request");
            return Err(LinkError::MissingVerifier);
        }

        let verifier = params
            .get("oauth_verifier")
            .filter(|v| !v.is_empty())
            .ok_or(LinkError::MissingVerifier)?;

        let pending = self.recover_pending(params).await.ok_or_else(|| {
            warn!("Callback without a usable pending request token");
            LinkError::MissingToken
        })?;

        let mut attempt = FlowAttempt::resume();
        match self.provider.access_token(&pending, verifier).await {
            Ok(credential) => {
                attempt.advance(FlowState::Exchanged);
                Ok(credential)
            }
            Err(e) => {
                attempt.advance(FlowState::Failed);
                Err(e)
            }
        }
    }

    async fn recover_pending(&self, params: &HashMap<String, String>) -> Option<PendingRequestToken> {
        match self.config.correlation_mode {
            CorrelationMode::Session => {
                let token = params.get("oauth_token").filter(|t| !t.is_empty())?;
                self.pending.take(token).await
            }
            CorrelationMode::Url => {
                let pending = self.recover_from_url(params)?;
                self.pending.claim(&pending).await.then_some(pending)
            }
        }
    }

    /// `&xlink_token=..&xlink_token_secret=..&xlink_ts=..&xlink_sig=..`
    fn fallback_params(&self, pending: &PendingRequestToken) -> String {
        let issued = pending.created_at.to_string();
        let sig = self.tagger.tag(&[
            pending.request_token.as_str(),
            pending.request_token_secret.as_str(),
            issued.as_str(),
        ]);
        format!(
            "&{}={}&{}={}&{}={}&{}={}",
            URL_TOKEN_PARAM,
            urlencoding::encode(&pending.request_token),
            URL_SECRET_PARAM,
            urlencoding::encode(&pending.request_token_secret),
            URL_ISSUED_PARAM,
            issued,
            URL_SIG_PARAM,
            sig
        )
    }

    fn recover_from_url(&self, params: &HashMap<String, String>) -> Option<PendingRequestToken> {
        let token = params.get(URL_TOKEN_PARAM)?;
        let secret = params.get(URL_SECRET_PARAM)?;
        let issued = params.get(URL_ISSUED_PARAM)?;
        let sig = params.get(URL_SIG_PARAM)?;

        if !self.tagger.verify(&[token.as_str(), secret.as_str(), issued.as_str()], sig) {
            warn!("Rejected callback with invalid {} tag", URL_SIG_PARAM);
            return None;
        }

        // The echoed oauth_token, when present, must match the tagged one
        if let Some(echoed) = params.get("oauth_token") {
            if echoed != token {
                warn!("Callback oauth_token does not match the tagged request token");
                return None;
            }
        }

        let pending = PendingRequestToken {
            request_token: token.clone(),
            request_token_secret: secret.clone(),
            created_at: issued.parse().ok()?,
        };

        let now = chrono::Utc::now().timestamp();
        if pending.is_expired_at(now, self.config.pending_ttl_secs) {
            debug!("Fallback request token expired");
            return None;
        }
        Some(pending)
    }
}
