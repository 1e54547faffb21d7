//! Wire and transcript types.
//!
//! Response bodies mirror the JSON returned by the document QA backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Transcript Types
// =============================================================================

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The person using the client.
    User,
    /// The backend.
    Bot,
}

impl Sender {
    /// Label used when rendering the transcript.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Bot => "Bot",
        }
    }
}

/// Stable identifier of a message within one transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) u64);

/// One entry of the chat transcript.
///
/// Content is kept as a list of visual blocks so a streamed answer can grow
/// one block at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Identifier assigned by the transcript.
    pub id: MessageId,
    /// Author of the message.
    pub sender: Sender,
    /// Rendered blocks, in emission order.
    pub blocks: Vec<String>,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub(crate) fn new(id: MessageId, sender: Sender, content: impl Into<String>) -> Self {
        let content = content.into();
        let blocks = if content.is_empty() {
            Vec::new()
        } else {
            vec![content]
        };
        Self {
            id,
            sender,
            blocks,
            created_at: Utc::now(),
        }
    }

    /// Full text of the message, blocks joined by newlines.
    #[must_use]
    pub fn content(&self) -> String {
        self.blocks.join("\n")
    }

    /// Whether the message has no rendered content yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check if this is a user message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Response from `POST /upload/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Explicit success flag. Some backends omit it on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// User-facing status message.
    #[serde(default)]
    pub message: String,
    /// Server-side path of the stored file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Summary computed during upload, if the backend does that.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl UploadResponse {
    /// Whether the upload succeeded. A 2xx body without a flag counts as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(true)
    }
}

/// Response from `POST /ask/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer text.
    #[serde(default)]
    pub answer: Option<String>,
    /// Error reported in a 2xx body, e.g. when no document is loaded.
    #[serde(default)]
    pub error: Option<String>,
}

/// Placeholder shown when the backend returns no answer.
pub const NO_ANSWER: &str = "No response from server.";

impl AskResponse {
    /// Text to show in the transcript.
    #[must_use]
    pub fn into_text(self) -> String {
        match (self.answer, self.error) {
            (Some(answer), _) if !answer.trim().is_empty() => answer,
            (_, Some(error)) if !error.trim().is_empty() => error,
            _ => NO_ANSWER.to_string(),
        }
    }
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Backend status string.
    pub status: String,
}

/// Error body returned by the backend.
///
/// Framework errors use `detail`; handler errors use `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Framework-level error detail.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    /// Handler-level error message.
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// Best human-readable message in the body.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_without_flag_is_success() {
        let json = r#"{"message":"File uploaded successfully","file_path":"uploads/notes.pdf"}"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.file_path.as_deref(), Some("uploads/notes.pdf"));
        assert!(resp.summary.is_none());
    }

    #[test]
    fn upload_response_with_summary() {
        let json = r#"{"success":false,"message":"bad file","summary":"short"}"#;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.summary.as_deref(), Some("short"));
    }

    #[test]
    fn ask_response_prefers_answer() {
        let resp: AskResponse = serde_json::from_str(r#"{"answer":"42"}"#).unwrap();
        assert_eq!(resp.into_text(), "42");
    }

    #[test]
    fn ask_response_falls_back_to_error_then_placeholder() {
        let resp: AskResponse =
            serde_json::from_str(r#"{"error":"No document uploaded yet."}"#).unwrap();
        assert_eq!(resp.into_text(), "No document uploaded yet.");

        let resp: AskResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.into_text(), NO_ANSWER);

        let resp: AskResponse = serde_json::from_str(r#"{"answer":"  "}"#).unwrap();
        assert_eq!(resp.into_text(), NO_ANSWER);
    }

    #[test]
    fn api_error_message_sources() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":"File not found"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("File not found"));

        let body: ApiErrorResponse = serde_json::from_str(r#"{"error":"disk full"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("disk full"));

        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert!(body.message().unwrap().contains("field required"));
    }

    #[test]
    fn chat_message_content_joins_blocks() {
        let mut msg = ChatMessage::new(MessageId(1), Sender::Bot, "");
        assert!(msg.is_empty());
        msg.blocks.push("Section 1".to_string());
        msg.blocks.push("Section 2".to_string());
        assert_eq!(msg.content(), "Section 1\nSection 2");
        assert!(!msg.is_user());
    }
}
