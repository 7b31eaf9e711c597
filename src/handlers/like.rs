use std::sync::Arc;

use tracing::{error, warn};

use crate::{
    app_state::AppState,
    payloads::{LikeBody, LikeReply, MessageIdArg},
    response::Response,
};

use super::{bad_json, parse_body};

const INVALID_PARAMS: &str = "Invalid parameters";
const LIKE_FAILED: &str = "Failed to like";
const READ_BACK_FAILED: &str = "Failed to fetch like count";

/// `POST /api/like`: increment, then read the counter back.
///
/// An unknown id answers exactly like a failed read-back; only the log tells them apart.
pub(crate) async fn handle_like(body: Option<&String>, state: Arc<AppState>) -> Response {
    let response = Response::new();

    let body: LikeBody = match parse_body(body) {
        Ok(v) => v,
        Err(e) => return bad_json(e),
    };

    let id = match body.message_id() {
        MessageIdArg::Id(id) => id,
        MessageIdArg::Missing => return response.json(&LikeReply::failed(INVALID_PARAMS)),
        MessageIdArg::Unmatched => {
            warn!("Like for unusable message id {:?}", body.message_id);
            return response.json(&LikeReply::failed(READ_BACK_FAILED));
        }
    };

    if let Err(e) = state.store.increment_like(id).await {
        if e.is_not_found() {
            warn!("Like for unknown message {}", id);
            return response.json(&LikeReply::failed(READ_BACK_FAILED));
        }
        error!("Failed to like message {}: {}", id, e);
        return response.json(&LikeReply::failed(LIKE_FAILED));
    }

    // a concurrent like may land between the two statements; the count read
    // back is still authoritative
    match state.store.like_count(id).await {
        Ok(count) => response.json(&LikeReply::ok(count)),
        Err(e) => {
            error!("Failed to read like count of message {}: {}", id, e);
            response.json(&LikeReply::failed(READ_BACK_FAILED))
        }
    }
}
