//! Per-session state: the uploaded document and the in-flight request.

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, SessionError};

/// The document the next summary request targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadedFile {
    /// Nothing has been uploaded in this session.
    #[default]
    NotUploaded,
    /// The most recent successful upload.
    Uploaded {
        /// File name sent to the backend.
        file_name: String,
    },
}

impl UploadedFile {
    /// File name, if one was uploaded.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::NotUploaded => None,
            Self::Uploaded { file_name } => Some(file_name),
        }
    }
}

/// Kind of backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Document upload.
    Upload,
    /// Streamed summary.
    Summary,
    /// Question.
    Ask,
}

impl RequestKind {
    /// Lowercase name for messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Summary => "summary",
            Self::Ask => "ask",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct InFlight {
    kind: RequestKind,
    cancel: CancellationToken,
}

/// Explicit session context handed to every request handler.
#[derive(Debug, Default)]
pub struct SessionContext {
    uploaded: UploadedFile,
    in_flight: Option<InFlight>,
}

impl SessionContext {
    /// Fresh session: nothing uploaded, nothing running.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current upload slot.
    #[must_use]
    pub const fn uploaded(&self) -> &UploadedFile {
        &self.uploaded
    }

    /// Remember a successful upload. Overwrites any previous one.
    pub fn record_upload(&mut self, file_name: impl Into<String>) {
        self.uploaded = UploadedFile::Uploaded {
            file_name: file_name.into(),
        };
    }

    /// File name to request a summary for.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoFileUploaded` before the first successful upload.
    pub fn summary_target(&self) -> Result<&str, ClientError> {
        self.uploaded.file_name().ok_or(ClientError::NoFileUploaded)
    }

    // =========================================================================
    // In-flight Guard
    // =========================================================================

    /// Mark a request as started and get its cancellation handle.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if another request has not finished.
    pub fn begin(&mut self, kind: RequestKind) -> Result<CancellationToken, SessionError> {
        if let Some(current) = &self.in_flight {
            return Err(SessionError::Busy(current.kind));
        }
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            kind,
            cancel: cancel.clone(),
        });
        tracing::debug!(request = %kind, "request started");
        Ok(cancel)
    }

    /// Mark the in-flight request as done.
    pub fn finish(&mut self) {
        if let Some(done) = self.in_flight.take() {
            tracing::debug!(request = %done.kind, "request finished");
        }
    }

    /// Cancel the in-flight request.
    ///
    /// Returns `true` if there was one. The slot stays busy until the task
    /// reports back and calls `finish`.
    pub fn cancel(&mut self) -> bool {
        match &self.in_flight {
            Some(current) => {
                current.cancel.cancel();
                tracing::debug!(request = %current.kind, "request cancelled");
                true
            }
            None => false,
        }
    }

    /// Kind of the request currently running.
    #[must_use]
    pub fn in_flight(&self) -> Option<RequestKind> {
        self.in_flight.as_ref().map(|f| f.kind)
    }

    /// Whether any request is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}
