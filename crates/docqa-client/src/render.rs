//! Incremental rendering of a streamed answer into one chat message.
//!
//! The renderer pulls reads from a byte stream, hands them to a
//! `ChunkAssembler`, and pushes each completed chunk into a `RenderTarget`
//! with a pacing delay in between. Pacing is presentation only; a zero
//! delay renders exactly the same blocks.

use std::fmt;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::stream::ChunkAssembler;
use crate::transcript::Transcript;
use crate::types::{MessageId, Sender};

/// Content that replaces the placeholder when the stream fails.
pub const ERROR_INDICATOR: &str = "⚠ Error generating summary.";

/// Delay between rendered blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    delay: Duration,
}

impl Pacing {
    /// Pace blocks `delay` apart.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Render blocks back to back.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

/// Where rendered blocks go.
pub trait RenderTarget {
    /// Append one block to the placeholder message.
    fn push_block(&mut self, block: String);

    /// Replace the placeholder's content with an error indicator.
    fn fail(&mut self, indicator: &str);
}

/// Renders straight into a transcript message.
#[derive(Debug)]
pub struct TranscriptTarget<'a> {
    transcript: &'a mut Transcript,
    id: MessageId,
}

impl<'a> TranscriptTarget<'a> {
    /// Open an empty bot placeholder and target it.
    pub fn open(transcript: &'a mut Transcript) -> Self {
        let id = transcript.append(Sender::Bot, "", false);
        Self { transcript, id }
    }

    /// Id of the placeholder message.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }
}

impl RenderTarget for TranscriptTarget<'_> {
    fn push_block(&mut self, block: String) {
        self.transcript.append_block(self.id, block);
    }

    fn fail(&mut self, indicator: &str) {
        self.transcript.replace(self.id, indicator);
    }
}

/// How a render ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The stream ended normally.
    Completed {
        /// Blocks rendered.
        blocks: usize,
    },
    /// The cancellation token fired first. Rendered blocks are kept.
    Cancelled {
        /// Blocks rendered before cancellation.
        blocks: usize,
    },
}

/// Turns a byte stream into paced chat blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamRenderer {
    pacing: Pacing,
}

impl StreamRenderer {
    /// Create a renderer with the given pacing.
    #[must_use]
    pub const fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// Render `body` into `target` until it ends, fails or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Stream` if a read fails. The target has already
    /// been switched to the error indicator in that case.
    pub async fn render<S, B, E, T>(
        &self,
        mut body: S,
        target: &mut T,
        cancel: &CancellationToken,
    ) -> Result<RenderOutcome, ClientError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: fmt::Display,
        T: RenderTarget + ?Sized,
    {
        let mut assembler = ChunkAssembler::new();
        let mut blocks = 0;

        loop {
            let read = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(RenderOutcome::Cancelled { blocks }),
                read = body.next() => read,
            };

            match read {
                Some(Ok(bytes)) => {
                    for chunk in assembler.push(bytes.as_ref()) {
                        target.push_block(chunk);
                        blocks += 1;

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => {
                                return Ok(RenderOutcome::Cancelled { blocks });
                            }
                            () = self.pacing.wait() => {}
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, blocks, "summary stream failed");
                    target.fail(ERROR_INDICATOR);
                    return Err(ClientError::Stream(e.to_string()));
                }
                None => break,
            }
        }

        if let Some(tail) = assembler.finish() {
            target.push_block(tail);
            blocks += 1;
        }

        tracing::debug!(blocks, "summary stream complete");
        Ok(RenderOutcome::Completed { blocks })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use futures::stream;

    use super::*;

    fn reads(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, io::Error>> + Unpin {
        let items: Vec<Result<Vec<u8>, io::Error>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(items)
    }

    async fn render_into_transcript(parts: &[&str]) -> (Transcript, MessageId, RenderOutcome) {
        let mut transcript = Transcript::new();
        let renderer = StreamRenderer::new(Pacing::none());
        let mut target = TranscriptTarget::open(&mut transcript);
        let id = target.id();
        let outcome = renderer
            .render(reads(parts), &mut target, &CancellationToken::new())
            .await
            .unwrap();
        (transcript, id, outcome)
    }

    #[tokio::test]
    async fn sections_render_as_two_blocks() {
        let (t, id, outcome) = render_into_transcript(&["Sect", "ion 1\nSection 2\n"]).await;
        assert_eq!(outcome, RenderOutcome::Completed { blocks: 2 });
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(id).unwrap().blocks, vec!["Section 1", "Section 2"]);
    }

    #[tokio::test]
    async fn partial_tail_renders_on_end() {
        let (t, id, outcome) = render_into_transcript(&["partial"]).await;
        assert_eq!(outcome, RenderOutcome::Completed { blocks: 1 });
        assert_eq!(t.get(id).unwrap().blocks, vec!["partial"]);
    }

    #[tokio::test]
    async fn empty_stream_leaves_empty_placeholder() {
        let (t, id, outcome) = render_into_transcript(&[]).await;
        assert_eq!(outcome, RenderOutcome::Completed { blocks: 0 });
        assert!(t.get(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_failure_replaces_placeholder() {
        let items: Vec<Result<Vec<u8>, io::Error>> = vec![
            Ok(b"Part 1\nPart".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            Ok(b" never seen\n".to_vec()),
        ];
        let mut transcript = Transcript::new();
        let mut target = TranscriptTarget::open(&mut transcript);
        let id = target.id();

        let err = StreamRenderer::new(Pacing::none())
            .render(stream::iter(items), &mut target, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Stream(ref m) if m.contains("connection reset")));
        assert_eq!(transcript.get(id).unwrap().blocks, vec![ERROR_INDICATOR]);
    }

    #[tokio::test]
    async fn cancelled_before_first_read() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut transcript = Transcript::new();
        let mut target = TranscriptTarget::open(&mut transcript);
        let id = target.id();

        let outcome = StreamRenderer::new(Pacing::none())
            .render(reads(&["a\nb\n"]), &mut target, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, RenderOutcome::Cancelled { blocks: 0 });
        assert!(transcript.get(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_mid_stream_keeps_rendered_blocks() {
        struct CancelAfterFirst {
            blocks: Vec<String>,
            cancel: CancellationToken,
        }
        impl RenderTarget for CancelAfterFirst {
            fn push_block(&mut self, block: String) {
                self.blocks.push(block);
                self.cancel.cancel();
            }
            fn fail(&mut self, indicator: &str) {
                self.blocks = vec![indicator.to_string()];
            }
        }

        let cancel = CancellationToken::new();
        let mut target = CancelAfterFirst {
            blocks: Vec::new(),
            cancel: cancel.clone(),
        };
        let outcome = StreamRenderer::new(Pacing::none())
            .render(reads(&["one\ntwo\n", "three\n"]), &mut target, &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, RenderOutcome::Cancelled { blocks: 1 });
        assert_eq!(target.blocks, vec!["one"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spaces_blocks_apart() {
        let start = tokio::time::Instant::now();
        let mut transcript = Transcript::new();
        let mut target = TranscriptTarget::open(&mut transcript);

        StreamRenderer::new(Pacing::new(Duration::from_millis(50)))
            .render(reads(&["a\nb\nc\n"]), &mut target, &CancellationToken::new())
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn rendered_blocks_reconstruct_text_for_any_read_size() {
        let text = "## Chapter 1\n- point α\n- point β\n\n## Chapter 2\nclosing 🦀";
        let expected: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();

        for size in 1..=8 {
            let items: Vec<Result<Vec<u8>, io::Error>> = text
                .as_bytes()
                .chunks(size)
                .map(|c| Ok(c.to_vec()))
                .collect();
            let mut transcript = Transcript::new();
            let mut target = TranscriptTarget::open(&mut transcript);
            let id = target.id();
            StreamRenderer::new(Pacing::none())
                .render(stream::iter(items), &mut target, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(transcript.get(id).unwrap().blocks, expected, "read size {size}");
        }
    }
}
