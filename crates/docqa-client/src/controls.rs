//! Controls a front end must provide.
//!
//! A front end declares which controls it renders; initialization refuses to
//! proceed when any of them is missing instead of degrading silently.

use std::collections::HashSet;

use crate::error::ConfigError;

/// A user-facing control with a stable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Field holding the document to upload.
    FileInput,
    /// Action that uploads the selected document.
    UploadButton,
    /// Action that streams a summary of the uploaded document.
    GenerateSummaryButton,
    /// Action that sends the question.
    SendButton,
    /// Field holding the question text.
    QuestionInput,
    /// Line showing request status.
    UploadStatus,
    /// The chat transcript view.
    Chatbox,
}

impl Control {
    /// Every control, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::FileInput,
        Self::UploadButton,
        Self::GenerateSummaryButton,
        Self::SendButton,
        Self::QuestionInput,
        Self::UploadStatus,
        Self::Chatbox,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::FileInput => "fileInput",
            Self::UploadButton => "uploadButton",
            Self::GenerateSummaryButton => "generateSummaryButton",
            Self::SendButton => "sendButton",
            Self::QuestionInput => "questionInput",
            Self::UploadStatus => "uploadStatus",
            Self::Chatbox => "chatbox",
        }
    }
}

/// Proof that a front end provides every control.
#[derive(Debug, Clone)]
pub struct ControlSet {
    available: HashSet<Control>,
}

impl ControlSet {
    /// Build the set, failing on the first missing control.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingControl` naming the first absent control.
    pub fn require(available: impl IntoIterator<Item = Control>) -> Result<Self, ConfigError> {
        let available: HashSet<Control> = available.into_iter().collect();
        if let Some(missing) = Control::ALL.into_iter().find(|c| !available.contains(c)) {
            tracing::error!(control = missing.id(), "required control missing");
            return Err(ConfigError::MissingControl(missing));
        }
        Ok(Self { available })
    }

    /// Whether a control is present.
    #[must_use]
    pub fn has(&self, control: Control) -> bool {
        self.available.contains(&control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_set_is_accepted() {
        let set = ControlSet::require(Control::ALL).unwrap();
        assert!(Control::ALL.iter().all(|c| set.has(*c)));
    }

    #[test]
    fn missing_control_fails_fast() {
        let partial = Control::ALL
            .into_iter()
            .filter(|c| *c != Control::GenerateSummaryButton);
        assert_eq!(
            ControlSet::require(partial).unwrap_err(),
            ConfigError::MissingControl(Control::GenerateSummaryButton)
        );
    }

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<&str> = Control::ALL.iter().map(Control::id).collect();
        assert_eq!(ids.len(), Control::ALL.len());
    }
}
