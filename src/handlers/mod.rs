use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tracing::{debug, error, warn};

use crate::{
    app_state::AppState,
    error::Result,
    request::{method::Method, Request},
    response::Response,
    Error,
};

use self::{like::handle_like, list::handle_list, static_files::handle_static, submit::handle_submit};

mod like;
mod list;
mod static_files;
mod submit;

/// Reads one request from `stream`, answers it and closes the exchange.
pub async fn handle_connection<S>(mut stream: S, state: Arc<AppState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let read = timeout(state.request_timeout, Request::from_stream(&mut stream)).await;
    let response = match read {
        Err(_) => {
            warn!("Client took longer than {:?} to send its request", state.request_timeout);
            Response::new()
                .status_line("HTTP/1.1 408 Request Timeout")
                .text("Request timed out.")
        }
        Ok(Ok(request)) => {
            let method = request.method();
            let uri = request.uri().to_string();
            let response = route(request, state).await;
            debug!("{:?} {} -> {}", method, uri, response.status_code());
            response
        }
        Ok(Err(Error::HeaderTooLarge(limit))) => {
            warn!("Rejected request head over {} bytes", limit);
            Response::new()
                .status_line("HTTP/1.1 431 Request Header Fields Too Large")
                .text("Request header fields too large.")
        }
        Ok(Err(Error::PayloadTooLarge(len))) => {
            warn!("Rejected request body of {} bytes", len);
            Response::new()
                .status_line("HTTP/1.1 413 Payload Too Large")
                .text("Request body too large.")
        }
        Ok(Err(Error::MalformedRequest(reason))) => {
            warn!("Malformed request: {}", reason);
            Response::new()
                .status_line("HTTP/1.1 400 Bad Request")
                .text(reason)
        }
        Ok(Err(e)) => {
            error!("Failed to read from stream: {}", e);
            Response::new()
                .status_line("HTTP/1.1 500 Internal Server Error")
                .text("Internal Server Error")
        }
    };

    if let Err(e) = stream.write_all(&response.into_bytes()).await {
        error!("Failed to send response: {}", e);
        return;
    }
    if let Err(e) = stream.shutdown().await {
        debug!("Failed to shut down stream: {}", e);
    }
}

pub(crate) async fn route(request: Request, state: Arc<AppState>) -> Response {
    match (request.method(), request.path()) {
        (Method::Options, _) => Response::new()
            .status_line("HTTP/1.1 204 No Content")
            .append_header("Access-Control-Allow-Methods: GET, POST, OPTIONS")
            .append_header("Access-Control-Allow-Headers: Content-Type"),
        (Method::Get, "/api/messages") => handle_list(state).await,
        (Method::Post, "/api/messages") => handle_submit(request.body(), state).await,
        (Method::Post, "/api/like") => handle_like(request.body(), state).await,
        (_, "/api/messages") => method_not_allowed("GET, POST, OPTIONS"),
        (_, "/api/like") => method_not_allowed("POST, OPTIONS"),
        (_, path) if path == "/api" || path.starts_with("/api/") => Response::new()
            .status_line("HTTP/1.1 404 Not Found")
            .text(format!("uri not found, {}", path)),
        (Method::Get, path) => handle_static(path, state).await,
        _ => method_not_allowed("GET, OPTIONS"),
    }
}

fn method_not_allowed(allow: &str) -> Response {
    Response::new()
        .status_line("HTTP/1.1 405 Method Not Allowed")
        .append_header(format!("Allow: {}", allow))
        .text("Method not allowed.")
}

/// Parses a JSON request body. A missing or blank body reads as `T::default()`.
pub(crate) fn parse_body<T>(body: Option<&String>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match body.map(|b| b.trim()) {
        None | Some("") => Ok(T::default()),
        Some(body) => Ok(serde_json::from_str(body)?),
    }
}

pub(crate) fn bad_json(e: Error) -> Response {
    warn!("Rejected request body: {}", e);
    Response::new()
        .status_line("HTTP/1.1 400 Bad Request")
        .text(e.to_string())
}
