//! ============================================================================
//! X (Twitter) OAuth 1.0a Provider
//! ============================================================================
//! Signed calls against the X API:
//! - POST oauth/request_token  (form-encoded response)
//! - GET  oauth/authorize      (browser redirect, built here)
//! - POST oauth/access_token   (form-encoded response)
//! - GET  1.1/account/verify_credentials.json
//! ============================================================================

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{OAuthProvider, VerifiedUser};
use crate::auth::{OAuthSigner, TokenPair};
use crate::config::{LinkConfig, ProviderEndpoints};
use crate::types::{AccessCredential, LinkError, PendingRequestToken};

/// Query sent to verify_credentials: no entities, no status payload
const VERIFY_PARAMS: [(&str, &str); 2] = [("include_entities", "false"), ("skip_status", "true")];

/// X API client for the account-linking flow
pub struct TwitterProvider {
    client: Client,
    signer: OAuthSigner,
    endpoints: ProviderEndpoints,
}

impl TwitterProvider {
    /// Create a provider with its own HTTP client
    pub fn new(
        signer: OAuthSigner,
        endpoints: ProviderEndpoints,
        timeout: Duration,
    ) -> Result<Self, LinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LinkError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, signer, endpoints))
    }

    /// Create a provider sharing an existing HTTP client
    pub fn with_client(client: Client, signer: OAuthSigner, endpoints: ProviderEndpoints) -> Self {
        Self {
            client,
            signer,
            endpoints,
        }
    }

    pub fn from_config(config: &LinkConfig) -> Result<Self, LinkError> {
        Self::new(
            OAuthSigner::new(&config.consumer_key, &config.consumer_secret),
            config.endpoints(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// POST to a token endpoint and decode the form-encoded reply
    async fn post_token_request(
        &self,
        step: &str,
        url: &str,
        token: Option<TokenPair<'_>>,
        oauth_extra: &[(&str, &str)],
    ) -> Result<HashMap<String, String>, LinkError> {
        let authorization = self
            .signer
            .authorization_header("POST", url, token, oauth_extra, &[])?;

        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await
            .map_err(|e| LinkError::Upstream(format!("{} request failed: {}", step, e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("{} failed: {} - {}", step, status, body);
            return Err(LinkError::Upstream(format!(
                "{} failed ({}): {}{}",
                step,
                status,
                body.trim(),
                token_failure_hint(status)
            )));
        }

        serde_urlencoded::from_str(&body)
            .map_err(|e| LinkError::Upstream(format!("Failed to parse {} response: {}", step, e)))
    }
}

fn token_failure_hint(status: StatusCode) -> &'static str {
    match status {
        StatusCode::UNAUTHORIZED => {
            ". Check the consumer key/secret and that the callback URL is registered, \
             or the request token may be expired or already used"
        }
        StatusCode::FORBIDDEN => ". The app may lack permission for this operation",
        s if s.is_server_error() => ". X appears to be unavailable, try again later",
        _ => "",
    }
}

/// Pull a required, non-empty field out of a token response
fn required_field(fields: &HashMap<String, String>, key: &str, step: &str) -> Result<String, LinkError> {
    fields
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| LinkError::Upstream(format!("{} response is missing {}", step, key)))
}

#[async_trait]
impl OAuthProvider for TwitterProvider {
    async fn request_token(&self, callback_url: &str) -> Result<PendingRequestToken, LinkError> {
        const STEP: &str = "Request token";
        debug!("Requesting request token from {}", self.endpoints.request_token);

        let fields = self
            .post_token_request(
                STEP,
                &self.endpoints.request_token,
                None,
                &[("oauth_callback", callback_url)],
            )
            .await?;

        if fields.get("oauth_callback_confirmed").map(String::as_str) != Some("true") {
            return Err(LinkError::Upstream(
                "X did not confirm the callback URL (oauth_callback_confirmed != true)".to_string(),
            ));
        }

        let request_token = required_field(&fields, "oauth_token", STEP)?;
        let request_token_secret = required_field(&fields, "oauth_token_secret", STEP)?;

        info!("Obtained request token");
        Ok(PendingRequestToken::new(request_token, request_token_secret))
    }

    fn authorize_url(&self, request_token: &str) -> String {
        format!(
            "{}?oauth_token={}",
            self.endpoints.authorize,
            urlencoding::encode(request_token)
        )
    }

    async fn access_token(
        &self,
        pending: &PendingRequestToken,
        verifier: &str,
    ) -> Result<AccessCredential, LinkError> {
        const STEP: &str = "Access token exchange";
        info!("Exchanging verifier for access token");

        let fields = self
            .post_token_request(
                STEP,
                &self.endpoints.access_token,
                Some(TokenPair {
                    token: &pending.request_token,
                    secret: &pending.request_token_secret,
                }),
                &[("oauth_verifier", verifier)],
            )
            .await?;

        // All three must be present before a credential exists at all
        let access_token = required_field(&fields, "oauth_token", STEP)?;
        let access_token_secret = required_field(&fields, "oauth_token_secret", STEP)?;
        let provider_user_id = required_field(&fields, "user_id", STEP)?;
        let display_name = fields.get("screen_name").cloned().unwrap_or_default();

        info!("Access token issued for X user {} (@{})", provider_user_id, display_name);

        Ok(AccessCredential {
            provider_user_id,
            access_token,
            access_token_secret,
            display_name,
        })
    }

    async fn verify_credentials(
        &self,
        credential: &AccessCredential,
    ) -> Result<VerifiedUser, LinkError> {
        let url = &self.endpoints.verify_credentials;
        let authorization = self.signer.authorization_header(
            "GET",
            url,
            Some(TokenPair {
                token: &credential.access_token,
                secret: &credential.access_token_secret,
            }),
            &[],
            &VERIFY_PARAMS,
        )?;

        let response = self
            .client
            .get(url)
            .query(&VERIFY_PARAMS)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| LinkError::Upstream(format!("Failed to fetch X profile: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            info!(
                "Credential for X user {} rejected: {}",
                credential.provider_user_id, body
            );
            return Err(LinkError::InvalidCredential);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("verify_credentials failed: {} - {}", status, body);
            return Err(LinkError::Upstream(format!(
                "Failed to fetch X profile ({}): {}. Check X API status.",
                status,
                body.trim()
            )));
        }

        response
            .json::<VerifiedUser>()
            .await
            .map_err(|e| LinkError::Upstream(format!("Failed to parse X profile: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> TwitterProvider {
        TwitterProvider::new(
            OAuthSigner::new("ck", "cs"),
            ProviderEndpoints::from_base(&server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn pending() -> PendingRequestToken {
        PendingRequestToken::new("rt1".to_string(), "rts1".to_string())
    }

    fn credential() -> AccessCredential {
        AccessCredential {
            provider_user_id: "42".to_string(),
            access_token: "at1".to_string(),
            access_token_secret: "ats1".to_string(),
            display_name: "alice".to_string(),
        }
    }

    fn authorization_of(request: &wiremock::Request) -> String {
        request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn test_request_token_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/request_token"))
            .and(header_regex("authorization", "^OAuth "))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "oauth_token=rt1&oauth_token_secret=rts1&oauth_callback_confirmed=true",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let pending = provider.request_token("https://host/callback").await.unwrap();

        assert_eq!(pending.request_token, "rt1");
        assert_eq!(pending.request_token_secret, "rts1");

        let requests = server.received_requests().await.unwrap();
        let auth = authorization_of(&requests[0]);
        assert!(auth.contains("oauth_callback=\"https%3A%2F%2Fhost%2Fcallback\""));
        assert!(auth.contains("oauth_consumer_key=\"ck\""));
        assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
    }

    #[tokio::test]
    async fn test_request_token_unconfirmed_callback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/request_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "oauth_token=rt1&oauth_token_secret=rts1&oauth_callback_confirmed=false",
            ))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .request_token("https://host/callback")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_request_token_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/request_token"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string("{\"errors\":[{\"code\":32,\"message\":\"Could not authenticate you.\"}]}"),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .request_token("https://host/callback")
            .await
            .unwrap_err();
        match err {
            LinkError::Upstream(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("Could not authenticate you."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authorize_url() {
        let server = MockServer::start().await;
        let provider = provider_for(&server);
        assert_eq!(
            provider.authorize_url("rt 1"),
            format!("{}/oauth/authorize?oauth_token=rt%201", server.uri())
        );
    }

    #[tokio::test]
    async fn test_access_token_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "oauth_token=at1&oauth_token_secret=ats1&user_id=42&screen_name=alice",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let credential = provider_for(&server)
            .access_token(&pending(), "v1")
            .await
            .unwrap();

        assert_eq!(credential.provider_user_id, "42");
        assert_eq!(credential.access_token, "at1");
        assert_eq!(credential.access_token_secret, "ats1");
        assert_eq!(credential.display_name, "alice");

        let requests = server.received_requests().await.unwrap();
        let auth = authorization_of(&requests[0]);
        assert!(auth.contains("oauth_verifier=\"v1\""));
        assert!(auth.contains("oauth_token=\"rt1\""));
    }

    #[tokio::test]
    async fn test_access_token_partial_response_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("oauth_token=at1&user_id=42"),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .access_token(&pending(), "v1")
            .await
            .unwrap_err();
        match err {
            LinkError::Upstream(msg) => assert!(msg.contains("oauth_token_secret")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_access_token_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid request token."))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .access_token(&pending(), "v1")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_verify_credentials_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .and(query_param("include_entities", "false"))
            .and(query_param("skip_status", "true"))
            .and(header_regex("authorization", "oauth_token=\"at1\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "id_str": "42",
                "screen_name": "alice",
                "name": "Alice",
                "profile_image_url_https": "https://pbs.twimg.com/alice.png"
            })))
            .mount(&server)
            .await;

        let user = provider_for(&server)
            .verify_credentials(&credential())
            .await
            .unwrap();

        assert_eq!(user.id_str, "42");
        assert_eq!(user.screen_name, "alice");
        assert_eq!(user.name, "Alice");
        assert_eq!(
            user.profile_image_url_https.as_deref(),
            Some("https://pbs.twimg.com/alice.png")
        );
    }

    #[tokio::test]
    async fn test_verify_credentials_revoked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid or expired token."))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .verify_credentials(&credential())
            .await
            .unwrap_err();
        assert_eq!(err, LinkError::InvalidCredential);
    }

    #[tokio::test]
    async fn test_verify_credentials_outage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .verify_credentials(&credential())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let provider = TwitterProvider::new(
            OAuthSigner::new("ck", "cs"),
            ProviderEndpoints::from_base("http://127.0.0.1:9"),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider.request_token("https://host/callback").await.unwrap_err();
        assert!(matches!(err, LinkError::Upstream(_)));
    }
}
