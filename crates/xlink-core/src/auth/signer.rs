//! ============================================================================
//! OAuth 1.0a Request Signer (HMAC-SHA1, RFC 5849)
//! ============================================================================
//! Builds the `Authorization: OAuth ...` header for X API calls:
//! - Signature base string from method, base URL and all request params
//! - HMAC-SHA1 keyed by consumer secret & token secret
//! ============================================================================

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;

use crate::types::LinkError;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal, everything else is encoded
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LEN: usize = 32;

/// Percent-encode per RFC 5849 section 3.6
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Token half of the signing key (request token or access token)
#[derive(Debug, Clone, Copy)]
pub struct TokenPair<'a> {
    pub token: &'a str,
    pub secret: &'a str,
}

/// Signs requests on behalf of the application's consumer credentials
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl OAuthSigner {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Build the Authorization header for a request.
    ///
    /// `oauth_extra` carries protocol params such as `oauth_callback` or
    /// `oauth_verifier`; `params` are the query and form params sent with the
    /// request. Both take part in the signature.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        token: Option<TokenPair<'_>>,
        oauth_extra: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> Result<String, LinkError> {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, url, token, oauth_extra, params, &nonce, &timestamp)
    }

    /// Same as `authorization_header` with a fixed nonce and timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        token: Option<TokenPair<'_>>,
        oauth_extra: &[(&str, &str)],
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, LinkError> {
        let mut oauth_params = self.oauth_params(token, oauth_extra, nonce, timestamp);
        let token_secret = token.map(|t| t.secret).unwrap_or("");
        let signature = self.signature(method, url, &oauth_params, params, token_secret)?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let fields = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", fields))
    }

    fn oauth_params(
        &self,
        token: Option<TokenPair<'_>>,
        oauth_extra: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Vec<(String, String)> {
        let mut oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        if let Some(token) = token {
            oauth_params.push(("oauth_token".to_string(), token.token.to_string()));
        }
        for (key, value) in oauth_extra {
            oauth_params.push((key.to_string(), value.to_string()));
        }
        oauth_params
    }

    /// HMAC-SHA1 signature, base64 encoded
    fn signature(
        &self,
        method: &str,
        url: &str,
        oauth_params: &[(String, String)],
        params: &[(&str, &str)],
        token_secret: &str,
    ) -> Result<String, LinkError> {
        let base_string = signature_base_string(method, url, oauth_params, params)?;
        let key = format!("{}&{}", encode(&self.consumer_secret), encode(token_secret));

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| LinkError::Configuration(format!("Invalid signing key: {}", e)))?;
        mac.update(base_string.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&base_url&normalized_params`, each part percent-encoded.
/// Query params already on `url` are folded into the parameter set.
pub fn signature_base_string(
    method: &str,
    url: &str,
    oauth_params: &[(String, String)],
    params: &[(&str, &str)],
) -> Result<String, LinkError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| LinkError::Configuration(format!("Invalid provider URL '{}': {}", url, e)))?;

    // Url::port() is None for the scheme's default port, which must be omitted
    let host = parsed.host_str().unwrap_or_default();
    let base_url = match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    };

    let mut encoded: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .collect();
    encoded.extend(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))));
    encoded.extend(params.iter().map(|(k, v)| (encode(k), encode(v))));
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(&base_url),
        encode(&normalized)
    ))
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
