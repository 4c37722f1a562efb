pub mod link;
pub mod profile;

use std::sync::Arc;

use axum::extract::State;

use crate::state::AppState;

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> String {
    format!(
        "X account linking backend. Visit /connect to link your X account. \
         Linked accounts: {}.",
        state.store.len().await
    )
}
