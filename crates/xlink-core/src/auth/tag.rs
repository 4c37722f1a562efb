//! HMAC-SHA256 tags over values that round-trip through a browser redirect,
//! keyed by the session secret.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::LinkError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct RedirectTagger {
    /// Keyed once; cloned per tag
    keyed: HmacSha256,
}

impl RedirectTagger {
    pub fn new(session_secret: &str) -> Result<Self, LinkError> {
        let keyed = HmacSha256::new_from_slice(session_secret.as_bytes())
            .map_err(|e| LinkError::Configuration(format!("Invalid session secret: {}", e)))?;
        Ok(Self { keyed })
    }

    fn mac(&self, parts: &[&str]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        for part in parts {
            mac.update(&(part.len() as u64).to_be_bytes());
            mac.update(part.as_bytes());
        }
        mac
    }

    /// Tag an ordered list of values
    pub fn tag(&self, parts: &[&str]) -> String {
        URL_SAFE_NO_PAD.encode(self.mac(parts).finalize().into_bytes())
    }

    /// Constant-time check of a tag produced by `tag`
    pub fn verify(&self, parts: &[&str], tag: &str) -> bool {
        match URL_SAFE_NO_PAD.decode(tag) {
            Ok(bytes) => self.mac(parts).verify_slice(&bytes).is_ok(),
            Err(_) => false,
        }
    }
}
