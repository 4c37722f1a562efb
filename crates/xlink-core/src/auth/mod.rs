//! ============================================================================
//! Auth Module - OAuth 1.0a Account Linking
//! ============================================================================
//! - OAuthSigner: HMAC-SHA1 request signing
//! - OAuthFlow: request token -> authorize -> access token
//! - PendingTokenCache: single-use, expiring request-token storage
//! - RedirectTagger: HMAC tags for values carried through redirects
//! ============================================================================

mod flow;
mod pending;
mod signer;
mod tag;

pub use flow::{FlowState, OAuthFlow};
pub use pending::{PendingTokenCache, MAX_PENDING_ENTRIES};
pub use signer::{encode, signature_base_string, OAuthSigner, TokenPair};
pub use tag::RedirectTagger;
