use papermate_core::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {0} timed out after {1}s")]
    Timeout(String, u64),

    #[error("API error from {url}: HTTP {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_decode() => FetchError::Parse(e.to_string()),
            ClientError::Http(e) => FetchError::Network(e.to_string()),
            ClientError::Timeout(_, secs) => FetchError::Timeout(secs),
            ClientError::Api {
                status, message, ..
            } => FetchError::Http { status, message },
            ClientError::NotFound(what) => FetchError::NotFound(what),
            ClientError::Parse(msg) => FetchError::Parse(msg),
            ClientError::InvalidUrl(msg) => FetchError::Network(format!("invalid URL: {msg}")),
        }
    }
}
