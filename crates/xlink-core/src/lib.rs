//! ============================================================================
//! XLINK-CORE: X Account Linking
//! ============================================================================
//! Backend logic for linking an X (Twitter) identity to an application
//! account over OAuth 1.0a:
//! - Request signing (HMAC-SHA1) and the three-legged flow
//! - Single-use pending request-token cache
//! - Credential store and profile lookup
//! ============================================================================

pub mod auth;
pub mod config;
pub mod profile;
pub mod provider;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use auth::{FlowState, OAuthFlow, OAuthSigner};
pub use config::{CorrelationMode, LinkConfig, ProviderEndpoints};
pub use profile::ProfileFetcher;
pub use provider::{OAuthProvider, TwitterProvider, VerifiedUser};
pub use store::{MemoryTokenStore, TokenStore};
pub use types::*;
