use std::sync::Arc;

use tracing::error;

use crate::{app_state::AppState, payloads::ListReply, response::Response};

const FETCH_FAILED: &str = "Failed to fetch messages";

/// `GET /api/messages`: the whole feed, newest first.
///
/// This is the one endpoint whose storage failures change the status code.
pub(crate) async fn handle_list(state: Arc<AppState>) -> Response {
    match state.store.list_all().await {
        Ok(messages) => Response::new().json(&ListReply::ok(messages)),
        Err(e) => {
            error!("Error while fetching messages: {}", e);
            Response::new()
                .status_line("HTTP/1.1 500 Internal Server Error")
                .json(&ListReply::failed(FETCH_FAILED))
        }
    }
}
