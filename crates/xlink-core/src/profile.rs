//! ============================================================================
//! Profile Fetcher - Normalized X profile from a stored credential
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, warn};

use crate::provider::{OAuthProvider, VerifiedUser};
use crate::types::{AccessCredential, LinkError, Profile};

pub struct ProfileFetcher {
    provider: Arc<dyn OAuthProvider>,
}

impl ProfileFetcher {
    pub fn new(provider: Arc<dyn OAuthProvider>) -> Self {
        Self { provider }
    }

    /// Signed verify_credentials call projected onto `Profile`.
    /// A revoked credential surfaces as `InvalidCredential`.
    pub async fn fetch(&self, credential: &AccessCredential) -> Result<Profile, LinkError> {
        debug!("Fetching X profile for user {}", credential.provider_user_id);

        let user = self
            .provider
            .verify_credentials(credential)
            .await
            .inspect_err(|e| {
                if *e == LinkError::InvalidCredential {
                    warn!(
                        "X user {} revoked access or the token expired",
                        credential.provider_user_id
                    );
                }
            })?;

        Ok(normalize(user))
    }
}

fn normalize(user: VerifiedUser) -> Profile {
    Profile {
        id: user.id_str,
        username: user.screen_name,
        display_name: user.name,
        avatar_url: user.profile_image_url_https.filter(|url| !url.is_empty()),
    }
}
