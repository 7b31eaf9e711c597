use std::sync::Arc;

use crate::{app_state::AppState, response::Response};

pub(crate) async fn handle_static(path: &str, state: Arc<AppState>) -> Response {
    match state.assets.get(path).await {
        Some(asset) => Response::new()
            .append_header(format!("Content-Type: {}", asset.content_type))
            .body(asset.bytes),
        None => Response::new()
            .status_line("HTTP/1.1 404 Not Found")
            .text(format!("GET uri not found, {}", path)),
    }
}
