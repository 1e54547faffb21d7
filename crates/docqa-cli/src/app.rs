//! Application state.
//!
//! Owns the session context, the transcript and the input fields, starts
//! backend requests, and folds their results back into the transcript.
//! Every request error is caught here and turned into a status line update,
//! plus an in-place chat message where a placeholder exists.

use std::path::PathBuf;
use std::sync::Arc;

use docqa_client::client::file_name_of;
use docqa_client::{
    ClientConfig, ClientError, ConfigError, Control, ControlSet, DocumentApi, MessageId, Pacing,
    RenderOutcome, RequestKind, Sender, SessionContext, StreamRenderer, Transcript,
    ERROR_INDICATOR,
};
use tokio::sync::mpsc;

use crate::requests::{self, AppEvent};

/// Placeholder shown while waiting for an answer.
pub const THINKING: &str = "Thinking...";

/// Shown when a question fails.
pub const ASK_FAILED: &str = "Failed to get a response!";

/// Replaces the placeholder of a cancelled question.
pub const ASK_CANCELLED: &str = "(question cancelled)";

// =============================================================================
// Input Fields
// =============================================================================

/// Which input field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Path of the document to upload.
    FilePath,
    /// Question text.
    #[default]
    Question,
}

impl Focus {
    /// Toggle to the other field.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::FilePath => Self::Question,
            Self::Question => Self::FilePath,
        }
    }
}

/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    text: String,
    /// Cursor position in characters.
    cursor: usize,
}

impl InputField {
    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Replace the contents and move the cursor to the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.char_len();
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Delete back to the previous space.
    pub fn delete_word(&mut self) {
        while self.cursor > 0 {
            self.backspace();
            let prev = self.cursor.checked_sub(1).and_then(|i| self.text.chars().nth(i));
            if prev == Some(' ') {
                break;
            }
        }
    }

    /// Move cursor left.
    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Move cursor to the start.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to the end.
    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Clear the field.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// What the startup health probe found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    /// Probe not answered yet.
    #[default]
    Unknown,
    /// Backend answered.
    Healthy(String),
    /// Backend could not be reached.
    Unreachable(String),
}

// =============================================================================
// Application State
// =============================================================================

/// Application state.
pub struct App {
    /// Backend transport.
    api: Arc<dyn DocumentApi>,
    /// Summary renderer (carries the pacing policy).
    renderer: StreamRenderer,
    /// Start a summary right after a successful upload.
    auto_summary: bool,
    /// Channel that request tasks report back on.
    events: mpsc::UnboundedSender<AppEvent>,
    /// Backend base URL for display.
    base_url: String,
    /// Uploaded document and in-flight request.
    pub session: SessionContext,
    /// Chat messages.
    pub transcript: Transcript,
    /// Document path field.
    pub file_input: InputField,
    /// Question field.
    pub question_input: InputField,
    /// Which field has focus.
    pub focus: Focus,
    /// Whether single-key commands are active.
    pub command_mode: bool,
    /// Status message to display.
    pub status_message: Option<String>,
    /// Error message to display.
    pub error_message: Option<String>,
    /// Health probe result.
    pub backend: BackendStatus,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Animation frame counter for loading indicators.
    pub animation_frame: usize,
}

impl App {
    /// Create the app and the channel its request tasks report on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingControl` if the UI does not provide every
    /// required control.
    pub fn new(
        api: Arc<dyn DocumentApi>,
        config: &ClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<AppEvent>), ConfigError> {
        Self::with_controls(api, config, crate::ui::provided_controls())
    }

    /// Like [`App::new`], checking an explicit set of provided controls.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingControl` naming the first control absent
    /// from `provided`.
    pub fn with_controls(
        api: Arc<dyn DocumentApi>,
        config: &ClientConfig,
        provided: impl IntoIterator<Item = Control>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<AppEvent>), ConfigError> {
        ControlSet::require(provided)?;
        let (events, rx) = mpsc::unbounded_channel();

        let app = Self {
            api,
            renderer: StreamRenderer::new(Pacing::new(config.pacing())),
            auto_summary: config.auto_summary,
            events,
            base_url: config.base_url.clone(),
            session: SessionContext::new(),
            transcript: Transcript::new(),
            file_input: InputField::default(),
            question_input: InputField::default(),
            focus: Focus::default(),
            command_mode: false,
            status_message: None,
            error_message: None,
            backend: BackendStatus::default(),
            should_quit: false,
            animation_frame: 0,
        };
        Ok((app, rx))
    }

    /// Backend URL for display.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The field that currently has focus.
    pub fn focused_input(&mut self) -> &mut InputField {
        match self.focus {
            Focus::FilePath => &mut self.file_input,
            Focus::Question => &mut self.question_input,
        }
    }

    /// Set the status message (also clears any error).
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.error_message = None;
    }

    /// Set the error message.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Clear the error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Tick the animation frame (call on each render).
    pub fn tick_animation(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    /// Get current spinner character for loading animation.
    #[must_use]
    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    /// Check if UI needs high-frequency redraws.
    #[must_use]
    pub fn needs_immediate_redraw(&self) -> bool {
        self.session.is_busy()
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Probe the backend once.
    pub fn check_health(&self) {
        requests::spawn_health(Arc::clone(&self.api), self.events.clone());
    }

    /// Upload the document named in the path field.
    pub fn start_upload(&mut self) {
        let raw = self.file_input.text().trim().to_string();
        if raw.is_empty() {
            self.set_error(ClientError::EmptyInput("Please select a file to upload.").to_string());
            return;
        }
        let path = PathBuf::from(raw);
        let file_name = match file_name_of(&path) {
            Ok(name) => name,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };
        let cancel = match self.session.begin(RequestKind::Upload) {
            Ok(token) => token,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        self.set_status("Uploading... (Esc to cancel)");
        requests::spawn_upload(
            Arc::clone(&self.api),
            path,
            file_name,
            cancel,
            self.events.clone(),
        );
    }

    /// Stream a summary of the last uploaded document.
    pub fn start_summary(&mut self) {
        let file_name = match self.session.summary_target() {
            Ok(name) => name.to_string(),
            Err(e) => {
                self.set_error(format!("Cannot summarize: {e}"));
                return;
            }
        };
        let cancel = match self.session.begin(RequestKind::Summary) {
            Ok(token) => token,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        let id = self.transcript.append(Sender::Bot, "", false);
        self.set_status(format!("Generating summary of {file_name}... (Esc to cancel)"));
        requests::spawn_summary(
            Arc::clone(&self.api),
            self.renderer,
            file_name,
            id,
            cancel,
            self.events.clone(),
        );
    }

    /// Send the text in the question field.
    pub fn submit_question(&mut self) {
        let query = self.question_input.text().trim().to_string();
        if query.is_empty() {
            self.set_error(ClientError::EmptyInput("Please enter a message.").to_string());
            return;
        }
        let cancel = match self.session.begin(RequestKind::Ask) {
            Ok(token) => token,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        self.question_input.clear();
        self.transcript.append(Sender::User, query.clone(), false);
        let id = self.transcript.append(Sender::Bot, THINKING, false);
        self.set_status("Waiting for answer... (Esc to cancel)");
        requests::spawn_ask(Arc::clone(&self.api), query, id, cancel, self.events.clone());
    }

    /// Cancel the in-flight request.
    ///
    /// Returns `true` if one was running.
    pub fn cancel_request(&mut self) -> bool {
        if self.session.cancel() {
            self.set_status("Cancelling...");
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Request Results
    // =========================================================================

    /// Fold a request result into the app state.
    ///
    /// Returns `true` if the UI should be redrawn.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Health(result) => {
                self.backend = match result {
                    Ok(status) => BackendStatus::Healthy(status),
                    Err(e) => BackendStatus::Unreachable(e.to_string()),
                };
            }
            AppEvent::UploadFinished { file_name, result } => {
                self.session.finish();
                self.finish_upload(file_name, result);
            }
            AppEvent::UploadCancelled { file_name } => {
                self.session.finish();
                self.set_status(format!("Upload of {file_name} cancelled"));
            }
            AppEvent::SummaryBlock { id, block } => {
                self.transcript.append_block(id, block);
            }
            AppEvent::SummaryReplaced { id, content } => {
                self.transcript.replace(id, content);
            }
            AppEvent::SummaryFinished { id, result } => {
                self.session.finish();
                self.finish_summary(id, result);
            }
            AppEvent::AnswerReceived { id, result } => {
                self.session.finish();
                match result {
                    Ok(resp) => {
                        self.transcript.append(Sender::Bot, resp.into_text(), true);
                        self.set_status("Answer received");
                    }
                    Err(e) => {
                        self.transcript.replace(id, ASK_FAILED);
                        self.set_error(format!("Ask failed ({}): {e}", e.kind()));
                    }
                }
            }
            AppEvent::AnswerCancelled { id } => {
                self.session.finish();
                self.transcript.replace(id, ASK_CANCELLED);
                self.set_status("Question cancelled");
            }
        }
        true
    }

    fn finish_upload(
        &mut self,
        file_name: String,
        result: Result<docqa_client::UploadResponse, ClientError>,
    ) {
        let resp = match result {
            Ok(resp) if resp.is_success() => resp,
            Ok(resp) => {
                let message = if resp.message.is_empty() {
                    "Upload rejected".to_string()
                } else {
                    resp.message
                };
                self.set_error(format!("Upload failed: {message}"));
                return;
            }
            Err(e) => {
                self.set_error(format!("Upload failed ({}): {e}", e.kind()));
                return;
            }
        };

        self.session.record_upload(file_name.clone());
        if resp.message.is_empty() {
            self.set_status(format!("Uploaded {file_name}"));
        } else {
            self.set_status(resp.message);
        }
        if let Some(summary) = resp.summary.filter(|s| !s.trim().is_empty()) {
            self.transcript.append(Sender::Bot, summary, false);
        }
        if self.auto_summary {
            self.start_summary();
        }
    }

    fn finish_summary(&mut self, id: MessageId, result: Result<RenderOutcome, ClientError>) {
        let empty = self.transcript.get(id).is_none_or(docqa_client::ChatMessage::is_empty);
        match result {
            Ok(RenderOutcome::Completed { blocks }) => {
                if empty {
                    self.transcript.replace(id, "No summary found.");
                }
                self.set_status(format!("Summary complete ({blocks} sections)"));
            }
            Ok(RenderOutcome::Cancelled { blocks }) => {
                if empty {
                    self.transcript.replace(id, "(summary cancelled)");
                }
                self.set_status(format!("Summary cancelled after {blocks} sections"));
            }
            Err(e) => {
                self.transcript.replace(id, ERROR_INDICATOR);
                self.set_error(format!("Summary failed ({}): {e}", e.kind()));
            }
        }
    }
}
