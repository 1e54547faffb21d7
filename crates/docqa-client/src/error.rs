//! Error types for the document QA client.

use thiserror::Error;

use crate::controls::Control;
use crate::session::RequestKind;

/// A result type using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// Status code returned by the backend.
        status: u16,
        /// Message extracted from the error body, if any.
        message: String,
    },

    /// The response body was missing or a read failed mid-stream.
    #[error("stream error: {0}")]
    Stream(String),

    /// A JSON body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The local file to upload could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The user submitted without the required input.
    #[error("{0}")]
    EmptyInput(&'static str),

    /// The client configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A summary was requested before any document was uploaded.
    #[error("no document uploaded yet")]
    NoFileUploaded,
}

impl ClientError {
    /// Short label shown in the status line for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Stream(_) => "stream",
            Self::Parse(_) => "parse",
            Self::Io { .. } => "io",
            Self::EmptyInput(_) => "input",
            Self::Config(_) => "config",
            Self::NoFileUploaded => "session",
        }
    }
}

/// Errors from the in-flight request guard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Another request is still running.
    #[error("a {0} request is already in progress")]
    Busy(RequestKind),
}

/// Errors raised while initializing the client surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required control is not provided by the view.
    #[error("required control `{}` is not available", .0.id())]
    MissingControl(Control),

    /// The configured base URL is unusable.
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// What is wrong with it.
        reason: String,
    },
}
