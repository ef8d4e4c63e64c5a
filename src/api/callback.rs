use std::sync::Arc;

use axum::{Extension, extract::Query, http::StatusCode};
use tokio::sync::{Mutex, oneshot};

pub const SUCCESS_BODY: &str = "Authorization complete. You can now close this window.";
pub const FAILURE_BODY: &str = "Authorization failed: no authorization code received.";

/// Single-use channel to the task waiting on the callback. `None` once a
/// request has been delivered.
pub type CallbackSlot = Arc<Mutex<Option<oneshot::Sender<Option<String>>>>>;

/// Handles Spotify's redirect back to the local server.
///
/// Only the first non-empty `code` parameter counts; a blank `code=` is
/// treated as no code at all.
///
/// # Responses
///
/// - `200` with [`SUCCESS_BODY`] when a code is present
/// - `400` with [`FAILURE_BODY`] otherwise
pub async fn callback(
    Query(params): Query<Vec<(String, String)>>,
    Extension(slot): Extension<CallbackSlot>,
) -> (StatusCode, &'static str) {
    let code = first_code(params);
    let response = match code {
        Some(_) => (StatusCode::OK, SUCCESS_BODY),
        None => (StatusCode::BAD_REQUEST, FAILURE_BODY),
    };

    // Take sender from slot; only the first request is delivered
    if let Some(sender) = slot.lock().await.take() {
        let _ = sender.send(code);
    }

    response
}

fn first_code(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, value)| key == "code" && !value.is_empty())
        .map(|(_, value)| value)
}
