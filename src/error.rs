//! Error taxonomy for calls against the catalog server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// No username/password in the local store.
    #[error("no stored credentials, please log in again")]
    MissingCredentials,

    /// The response body was not the JSON we expected.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The local store could not be read or written.
    #[error("local storage error: {0}")]
    Storage(String),

    /// Refused locally; no request was sent.
    #[error("{0}")]
    Rejected(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Malformed(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self { ClientError::Malformed(e.to_string()) }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
