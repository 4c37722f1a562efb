use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use xlink_core::Profile;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /profile/{provider_user_id}
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(provider_user_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let credential = state
        .store
        .get(&provider_user_id)
        .await
        .ok_or_else(|| ApiError::NotFound(provider_user_id.clone()))?;

    let profile = state.profiles.fetch(&credential).await?;
    Ok(Json(profile))
}
