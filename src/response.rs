use serde::Serialize;
use tracing::error;

pub(crate) struct Response {
    pub(crate) status_line: &'static str,
    pub(crate) headers: Vec<String>,
    pub(crate) content: Option<Vec<u8>>,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self {
            status_line: "HTTP/1.1 200 OK",
            headers: vec!["Access-Control-Allow-Origin: *".to_string()],
            content: None,
        }
    }

    pub(crate) fn status_line(mut self, status_line: &'static str) -> Self {
        self.status_line = status_line;
        self
    }

    pub(crate) fn append_header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    pub(crate) fn body(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Plain text body, used for transport level errors.
    pub(crate) fn text(self, content: impl Into<String>) -> Self {
        self.append_header("Content-Type: text/plain; charset=utf-8")
            .body(content.into())
    }

    /// Serializes `value` as the JSON body.
    pub(crate) fn json<T: Serialize>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => self
                .append_header("Content-Type: application/json; charset=utf-8")
                .body(body),
            Err(e) => {
                error!("Failed to serialize response body: {}", e);
                Self::new()
                    .status_line("HTTP/1.1 500 Internal Server Error")
                    .text("Internal Server Error")
            }
        }
    }

    pub(crate) fn status_code(&self) -> u16 {
        self.status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap_or(0)
    }

    /// The full response as written to the socket. Framing headers are added here.
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        let content = self.content.unwrap_or_default();
        let mut response = Vec::with_capacity(256 + content.len());
        response.extend_from_slice(self.status_line.as_bytes());
        response.extend_from_slice(b"\r\n");
        for header in self.headers.iter() {
            response.extend_from_slice(header.as_bytes());
            response.extend_from_slice(b"\r\n");
        }
        response.extend_from_slice(format!("Content-Length: {}\r\n", content.len()).as_bytes());
        response.extend_from_slice(b"Connection: close\r\n\r\n");
        response.extend_from_slice(&content);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_status_headers_and_body() {
        let bytes = Response::new()
            .status_line("HTTP/1.1 404 Not Found")
            .text("missing")
            .into_bytes();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.contains("Content-Length: 7\r\n"));
        assert!(text.ends_with("Connection: close\r\n\r\nmissing"));
    }

    #[test]
    fn status_code_is_read_from_the_status_line() {
        let response = Response::new().status_line("HTTP/1.1 500 Internal Server Error");
        assert_eq!(response.status_code(), 500);
    }
}
