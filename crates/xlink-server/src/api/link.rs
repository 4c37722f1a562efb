//! Linking endpoints: start the authorization, accept the X callback,
//! and render the success page.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// 302 Found with a Location header
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// GET /connect
pub async fn connect(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let callback_url = state.config().callback_url.clone();
    let target = state.flow.start(&callback_url).await?;
    Ok(found(&target.url))
}

/// GET /callback?oauth_token=..&oauth_verifier=..
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let credential = state.flow.complete(&params).await?;

    let user_id = credential.provider_user_id.clone();
    let screen_name = credential.display_name.clone();
    state.store.put(&user_id, credential).await;
    info!("Linked X account @{} ({})", screen_name, user_id);

    let sig = state.tagger.tag(&[user_id.as_str(), screen_name.as_str()]);
    let location = format!(
        "/connected?user_id={}&screen_name={}&sig={}",
        urlencoding::encode(&user_id),
        urlencoding::encode(&screen_name),
        sig
    );
    Ok(found(&location))
}

/// GET /connected?user_id=..&screen_name=..&sig=..
///
/// Always 200. Account details are shown only when the tag verifies, so a
/// crafted URL cannot claim someone else's handle.
pub async fn connected(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let details = match (
        params.get("user_id"),
        params.get("screen_name"),
        params.get("sig"),
    ) {
        (Some(user_id), Some(screen_name), Some(sig))
            if state
                .tagger
                .verify(&[user_id.as_str(), screen_name.as_str()], sig) =>
        {
            Some((user_id, screen_name))
        }
        (None, None, None) => None,
        _ => {
            warn!("Success page hit with unverifiable account details");
            None
        }
    };

    match details {
        Some((user_id, screen_name)) => format!(
            "Connected to X as @{}! User ID: {}. You can now fetch the profile at /profile/{}.",
            screen_name, user_id, user_id
        ),
        None => "Connected to X, but the account details are missing or invalid. \
                 Check the linking flow."
            .to_string(),
    }
}
