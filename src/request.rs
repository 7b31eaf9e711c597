pub mod method;

use ahash::AHashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::{error::Result, Error};

use self::method::Method;

/// Largest request body the server is willing to buffer.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Budget shared by the request line and every header line.
pub const MAX_HEADER_BYTES: usize = 16 * 1024;

const MAX_CHUNK_LINE_BYTES: usize = 1024;

#[derive(Default, Debug)]
pub struct Request {
    method: Method,
    uri: String,
    headers: AHashMap<String, String>,
    body: Option<String>,
}

enum Line {
    /// A full line, newline included, and the number of bytes it took.
    Complete(String, usize),
    /// The stream ended before the newline.
    Eof,
    /// `limit` bytes went by without a newline.
    TooLong,
}

async fn read_line_within<R>(reader: &mut R, limit: usize) -> Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    (&mut *reader)
        .take(limit as u64)
        .read_until(b'\n', &mut raw)
        .await?;

    if raw.last() == Some(&b'\n') {
        Ok(Line::Complete(String::from_utf8_lossy(&raw).into_owned(), raw.len()))
    } else if raw.len() >= limit {
        Ok(Line::TooLong)
    } else {
        Ok(Line::Eof)
    }
}

fn truncated_body(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            Error::MalformedRequest("body shorter than announced".to_string())
        }
        _ => e.into(),
    }
}

/// Decodes a `Transfer-Encoding: chunked` body, trailers included.
async fn read_chunked<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let size_line = match read_line_within(reader, MAX_CHUNK_LINE_BYTES).await? {
            Line::Complete(line, _) => line,
            Line::Eof => return Err(Error::MalformedRequest("truncated chunked body".to_string())),
            Line::TooLong => return Err(Error::MalformedRequest("chunk size line too long".to_string())),
        };
        // chunk extensions follow a ';'
        let size = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size, 16)
            .map_err(|_| Error::MalformedRequest(format!("invalid chunk size {size:?}")))?;
        if size == 0 {
            break;
        }
        if size > MAX_BODY_BYTES - body.len() {
            return Err(Error::PayloadTooLarge(body.len().saturating_add(size)));
        }

        let start = body.len();
        body.resize(start + size, 0);
        reader
            .read_exact(&mut body[start..])
            .await
            .map_err(truncated_body)?;

        match read_line_within(reader, 2).await? {
            Line::Complete(line, _) if line.trim_end().is_empty() => {}
            _ => return Err(Error::MalformedRequest("chunk not followed by CRLF".to_string())),
        }
    }

    // trailer section, discarded
    loop {
        match read_line_within(reader, MAX_CHUNK_LINE_BYTES).await? {
            Line::Complete(line, _) if line.trim_end().is_empty() => break,
            Line::Complete(..) => {}
            _ => return Err(Error::MalformedRequest("truncated chunked trailer".to_string())),
        }
    }
    Ok(body)
}

impl Request {
    /// Read data from the stream and create a new HTTP `Request`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRequest`] if the data is not a valid HTTP request,
    /// [`Error::HeaderTooLarge`] if the head exceeds [`MAX_HEADER_BYTES`],
    /// [`Error::PayloadTooLarge`] if the body exceeds [`MAX_BODY_BYTES`],
    /// and [`Error::Io`] if reading from the stream fails.
    pub async fn from_stream<S>(stream: &mut S) -> Result<Self>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf_reader = BufReader::new(stream);
        let mut budget = MAX_HEADER_BYTES;

        // read status line
        let status_line = match read_line_within(&mut buf_reader, budget).await? {
            Line::Complete(line, len) => {
                budget -= len;
                line
            }
            Line::Eof => return Err(Error::MalformedRequest("empty request".to_string())),
            Line::TooLong => return Err(Error::HeaderTooLarge(MAX_HEADER_BYTES)),
        };
        let status_line = status_line.trim_end();

        let mut request = Self::default();

        // extract method and uri
        let mut status_line_iter = status_line.split_whitespace();
        let method = status_line_iter.next().unwrap_or("");
        request
            .set_method(method)
            .map_err(|e| Error::MalformedRequest(format!("{e}: {method:?}")))?;
        let uri = status_line_iter
            .next()
            .ok_or_else(|| Error::MalformedRequest("missing request target".to_string()))?;
        request.set_uri(uri.to_string());

        // read through the header section
        loop {
            let header_line = match read_line_within(&mut buf_reader, budget).await? {
                Line::Complete(line, len) => {
                    budget -= len;
                    line
                }
                Line::Eof => {
                    return Err(Error::MalformedRequest(
                        "connection closed inside headers".to_string(),
                    ))
                }
                Line::TooLong => return Err(Error::HeaderTooLarge(MAX_HEADER_BYTES)),
            };
            let trimmed = header_line.trim_end();

            // end of header section
            if trimmed.is_empty() {
                break;
            }

            let (name, value) = trimmed
                .split_once(':')
                .ok_or_else(|| Error::MalformedRequest(format!("bad header line {trimmed:?}")))?;
            request
                .headers
                .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        let chunked = match request.header("transfer-encoding") {
            None => false,
            Some(coding) if coding.eq_ignore_ascii_case("chunked") => true,
            Some(coding) => {
                return Err(Error::MalformedRequest(format!(
                    "unsupported transfer-encoding {coding:?}"
                )))
            }
        };

        let content_length = match request.header("content-length") {
            Some(value) => Some(value.parse::<usize>().map_err(|_| {
                Error::MalformedRequest(format!("invalid content-length {value:?}"))
            })?),
            None => None,
        };

        // read body if any; chunked framing wins over content-length
        if chunked {
            let body = read_chunked(&mut buf_reader).await?;
            request.set_body(Some(String::from_utf8_lossy(&body).into_owned()));
        } else if let Some(len) = content_length {
            if len > MAX_BODY_BYTES {
                return Err(Error::PayloadTooLarge(len));
            }
            let mut body = vec![0; len];
            buf_reader
                .read_exact(&mut body)
                .await
                .map_err(truncated_body)?;
            request.set_body(Some(String::from_utf8_lossy(&body).into_owned()));
        }

        Ok(request)
    }

    /// The request target including any query string.
    pub fn uri(&self) -> &str {
        self.uri.as_ref()
    }

    /// The request target without its query string.
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    pub fn set_uri(&mut self, uri: String) {
        self.uri = uri;
    }

    /// Looks up a header by its case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&String> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Option<String>) {
        self.body = body;
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Sets the method of this [`Request`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the method is not one the server knows.
    pub fn set_method(&mut self, method: &str) -> Result<(), &'static str> {
        self.method = method.parse()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(raw: &str) -> Result<Request> {
        let mut bytes = raw.as_bytes();
        Request::from_stream(&mut bytes).await
    }

    #[tokio::test]
    async fn parses_request_line_headers_and_body() {
        let request = parse(
            "POST /api/like?x=1 HTTP/1.1\r\nHost: localhost\r\nCONTENT-LENGTH: 15\r\n\r\n{\"messageId\":1}",
        )
        .await
        .unwrap();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.uri(), "/api/like?x=1");
        assert_eq!(request.path(), "/api/like");
        assert_eq!(request.header("Host"), Some("localhost"));
        assert_eq!(request.body().map(String::as_str), Some("{\"messageId\":1}"));
    }

    #[tokio::test]
    async fn request_without_content_length_has_no_body() {
        let request = parse("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        assert_eq!(request.method(), Method::Get);
        assert!(request.body().is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_methods_and_truncated_headers() {
        assert!(matches!(
            parse("BREW /pot HTTP/1.1\r\n\r\n").await,
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            parse("GET / HTTP/1.1\r\nHost: localhost\r\n").await,
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(parse("").await, Err(Error::MalformedRequest(_))));
    }

    #[tokio::test]
    async fn rejects_oversized_bodies() {
        let raw = format!("POST /api/messages HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_BODY_BYTES + 1);
        assert!(matches!(parse(&raw).await, Err(Error::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn rejects_oversized_header_sections() {
        let one_huge = format!(
            "GET /api/messages HTTP/1.1\r\nX-Big: {}\r\n\r\n",
            "a".repeat(8 * 1024 * 1024)
        );
        assert!(matches!(parse(&one_huge).await, Err(Error::HeaderTooLarge(_))));

        let many_small = format!(
            "GET /api/messages HTTP/1.1\r\n{}\r\n",
            "X-Small: abcdefghijklmnop\r\n".repeat(MAX_HEADER_BYTES / 16)
        );
        assert!(matches!(parse(&many_small).await, Err(Error::HeaderTooLarge(_))));

        let long_target = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_HEADER_BYTES));
        assert!(matches!(parse(&long_target).await, Err(Error::HeaderTooLarge(_))));
    }

    #[tokio::test]
    async fn decodes_chunked_bodies() {
        let request = parse(
            "POST /api/messages HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n\
             f\r\n{\"nickname\":\"A\"\r\n\
             13;ext=1\r\n,\"content\":\"hello\"}\r\n\
             0\r\nX-Trailer: yes\r\n\r\n",
        )
        .await
        .unwrap();

        assert_eq!(
            request.body().map(String::as_str),
            Some("{\"nickname\":\"A\",\"content\":\"hello\"}")
        );
    }

    #[tokio::test]
    async fn rejects_bad_chunked_bodies() {
        let raw = format!(
            "POST /api/messages HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n",
            MAX_BODY_BYTES + 1
        );
        assert!(matches!(parse(&raw).await, Err(Error::PayloadTooLarge(_))));

        for raw in [
            "POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
            "POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nab",
            "POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nabc\r\n0\r\n\r\n",
            "POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n",
        ] {
            assert!(matches!(parse(raw).await, Err(Error::MalformedRequest(_))), "{raw:?}");
        }
    }

    #[tokio::test]
    async fn short_bodies_are_malformed() {
        let raw = "POST /api/messages HTTP/1.1\r\nContent-Length: 50\r\n\r\n{\"nickname\":1}";
        assert!(matches!(parse(raw).await, Err(Error::MalformedRequest(_))));
    }
}
