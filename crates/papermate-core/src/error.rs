use serde::Serialize;
use thiserror::Error;

/// Failure of a single request against the papers API.
///
/// Cloneable so the list and detail controllers can keep the last error on
/// their snapshots while handing copies to the view.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("paper not found: {0}")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl FetchError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// All errors that can occur in papermate-core.
#[derive(Debug, Error)]
pub enum PaperMateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid filter value: {0}")]
    InvalidFilter(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PaperMateError>;

pub type FetchResult<T> = std::result::Result<T, FetchError>;
