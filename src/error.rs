use derive_more::{Display, From};

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Display, From, derive_more::Error)]
pub enum Error {
    #[display("io error: {_0}")]
    #[from]
    Io(std::io::Error),
    #[display("database error: {_0}")]
    #[from]
    Database(sqlx::Error),
    #[display("json error: {_0}")]
    #[from]
    Json(serde_json::Error),
    #[display("http client error: {_0}")]
    #[from]
    Http(reqwest::Error),
    /// No message row matches the requested id.
    #[display("message {_0} not found")]
    NotFound(#[error(not(source))] i64),
    #[display("malformed request: {_0}")]
    MalformedRequest(#[error(not(source))] String),
    #[display("request body of {_0} bytes exceeds the limit")]
    PayloadTooLarge(#[error(not(source))] usize),
    #[display("request head exceeds {_0} bytes")]
    HeaderTooLarge(#[error(not(source))] usize),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
