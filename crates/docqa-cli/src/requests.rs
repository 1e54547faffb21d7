//! Background request tasks.
//!
//! Each backend call runs on its own task and reports back to the event loop
//! through an unbounded channel, so the transcript is only ever mutated by
//! the UI task.

use std::path::PathBuf;
use std::sync::Arc;

use docqa_client::{
    AskResponse, ClientError, DocumentApi, MessageId, RenderOutcome, RenderTarget,
    StreamRenderer, UploadResponse,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Results delivered to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Health probe result.
    Health(Result<String, ClientError>),
    /// Upload request finished.
    UploadFinished {
        /// File name that was sent.
        file_name: String,
        /// Backend response.
        result: Result<UploadResponse, ClientError>,
    },
    /// Upload was cancelled before the backend answered.
    UploadCancelled {
        /// File name that was being sent.
        file_name: String,
    },
    /// One summary block is ready.
    SummaryBlock {
        /// Placeholder message.
        id: MessageId,
        /// Block text.
        block: String,
    },
    /// The placeholder content must be replaced wholesale.
    SummaryReplaced {
        /// Placeholder message.
        id: MessageId,
        /// New content.
        content: String,
    },
    /// The summary stream ended.
    SummaryFinished {
        /// Placeholder message.
        id: MessageId,
        /// How it ended.
        result: Result<RenderOutcome, ClientError>,
    },
    /// Answer to a question arrived.
    AnswerReceived {
        /// The "Thinking..." placeholder.
        id: MessageId,
        /// Backend response.
        result: Result<AskResponse, ClientError>,
    },
    /// Question was cancelled before the answer arrived.
    AnswerCancelled {
        /// The "Thinking..." placeholder.
        id: MessageId,
    },
}

/// Render target that forwards blocks to the event loop.
struct ChannelTarget {
    tx: UnboundedSender<AppEvent>,
    id: MessageId,
}

impl RenderTarget for ChannelTarget {
    fn push_block(&mut self, block: String) {
        let _ = self.tx.send(AppEvent::SummaryBlock { id: self.id, block });
    }

    fn fail(&mut self, indicator: &str) {
        let _ = self.tx.send(AppEvent::SummaryReplaced {
            id: self.id,
            content: indicator.to_string(),
        });
    }
}

/// Probe backend health.
pub fn spawn_health(api: Arc<dyn DocumentApi>, tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let result = api.health().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "health probe failed");
        }
        let _ = tx.send(AppEvent::Health(result));
    });
}

/// Upload a document.
pub fn spawn_upload(
    api: Arc<dyn DocumentApi>,
    path: PathBuf,
    file_name: String,
    cancel: CancellationToken,
    tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = api.upload(&path) => Some(result),
        };
        let event = match result {
            None => {
                tracing::debug!(file = %file_name, "upload cancelled");
                AppEvent::UploadCancelled { file_name }
            }
            Some(result) => {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, file = %file_name, "upload failed");
                }
                AppEvent::UploadFinished { file_name, result }
            }
        };
        let _ = tx.send(event);
    });
}

/// Stream a summary into the placeholder `id`.
pub fn spawn_summary(
    api: Arc<dyn DocumentApi>,
    renderer: StreamRenderer,
    file_name: String,
    id: MessageId,
    cancel: CancellationToken,
    tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            opened = api.summary_stream(&file_name) => Some(opened),
        };

        let result = match opened {
            None => Ok(RenderOutcome::Cancelled { blocks: 0 }),
            Some(Ok(body)) => {
                let mut target = ChannelTarget { tx: tx.clone(), id };
                renderer.render(body, &mut target, &cancel).await
            }
            Some(Err(e)) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(error = %e, file = %file_name, "summary failed");
        }
        let _ = tx.send(AppEvent::SummaryFinished { id, result });
    });
}

/// Ask a question; the answer replaces placeholder `id`.
pub fn spawn_ask(
    api: Arc<dyn DocumentApi>,
    query: String,
    id: MessageId,
    cancel: CancellationToken,
    tx: UnboundedSender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = api.ask(&query) => Some(result),
        };
        let event = match result {
            None => {
                tracing::debug!("question cancelled");
                AppEvent::AnswerCancelled { id }
            }
            Some(result) => {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "question failed");
                }
                AppEvent::AnswerReceived { id, result }
            }
        };
        let _ = tx.send(event);
    });
}
