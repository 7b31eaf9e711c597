use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::{
    app_state::AppState,
    payloads::{PostedMessage, SubmitBody, SubmitReply},
    response::Response,
};

use super::{bad_json, parse_body};

const EMPTY_FIELDS: &str = "Nickname and content must not be empty!";
const POSTED: &str = "Message posted!";
const SUBMIT_FAILED: &str = "Failed to submit, please retry";

/// `POST /api/messages`. Clients validate too, but nothing they send is trusted.
pub(crate) async fn handle_submit(body: Option<&String>, state: Arc<AppState>) -> Response {
    let response = Response::new();

    let SubmitBody { nickname, content } = match parse_body::<SubmitBody>(body) {
        Ok(v) => v,
        Err(e) => return bad_json(e),
    };

    let (nickname, content) = match (non_blank(&nickname), non_blank(&content)) {
        (Some(nickname), Some(content)) => (nickname, content),
        _ => return response.json(&SubmitReply::failed(EMPTY_FIELDS)),
    };

    match state.store.insert(nickname.trim(), content.trim()).await {
        Ok(id) => {
            info!("Message {} posted by {:?}", id, nickname.trim());
            // echo what the caller sent, the row holds the trimmed text
            response.json(&SubmitReply::ok(
                POSTED,
                PostedMessage {
                    id,
                    nickname: nickname.to_string(),
                    content: content.to_string(),
                },
            ))
        }
        Err(e) => {
            error!("Failed to insert message: {}", e);
            response.json(&SubmitReply::failed(SUBMIT_FAILED))
        }
    }
}

fn non_blank(value: &Option<Value>) -> Option<&str> {
    value
        .as_ref()
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
