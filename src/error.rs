//! Error types shared by every provider.

pub use crate::http::ServerError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server: {0}")]
    Server(#[from] ServerError),
    #[error("api: {0}")]
    Api(#[from] ApiError),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("encode: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0} is not implemented by this provider")]
    NotImplemented(&'static str),
}

impl Error {
    /// Whether the remote side rejected the call, either with a bare status
    /// code or with a structured error payload.
    pub fn is_service_error(&self) -> bool {
        matches!(self, Error::Server(_) | Error::Api(_))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Server(err) => Some(err.status_code),
            Error::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// Error payload reported by a translation API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("code {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    /// Provider specific detail, e.g. `domain/reason` for Google.
    pub details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("{0}")]
    Malformed(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.into())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::Decode(err.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
