//! ============================================================================
//! XLINK-SERVER: HTTP surface for X account linking
//! ============================================================================
//! Routes:
//! - GET /                      - landing text
//! - GET /connect               - 302 to the X authorize page
//! - GET /callback              - verifier exchange, stores the credential
//! - GET /connected             - success page
//! - GET /profile/{id}          - normalized profile JSON
//! ============================================================================

pub mod api;
pub mod error;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/connect", get(api::link::connect))
        .route("/callback", get(api::link::callback))
        .route("/connected", get(api::link::connected))
        .route("/profile/{provider_user_id}", get(api::profile::get_profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
