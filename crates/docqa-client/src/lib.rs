//! Client library for a document question-answering backend.
//!
//! This crate provides everything a front end needs to talk to the backend:
//!
//! - **Transport**: `DocumentApi` and its HTTP implementation for upload,
//!   summary streaming and questions
//! - **Rendering**: `ChunkAssembler` and `StreamRenderer`, which turn a
//!   streamed summary into paced, newline-delimited chat blocks
//! - **State**: `Transcript` for the chat log and `SessionContext` for the
//!   uploaded document and the in-flight request
//!
//! # Example
//!
//! ```
//! use docqa_client::{ChunkAssembler, Sender, Transcript};
//!
//! let mut transcript = Transcript::new();
//! let id = transcript.append(Sender::Bot, "", false);
//!
//! let mut assembler = ChunkAssembler::new();
//! for read in [&b"Sect"[..], &b"ion 1\nSection 2\n"[..]] {
//!     for block in assembler.push(read) {
//!         transcript.append_block(id, block);
//!     }
//! }
//!
//! assert_eq!(transcript.get(id).unwrap().content(), "Section 1\nSection 2");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod controls;
pub mod error;
pub mod render;
pub mod session;
pub mod stream;
pub mod transcript;
pub mod types;

pub use client::{ByteStream, DocumentApi, HttpDocumentClient};
pub use config::ClientConfig;
pub use controls::{Control, ControlSet};
pub use error::{ClientError, ConfigError, Result, SessionError};
pub use render::{
    Pacing, RenderOutcome, RenderTarget, StreamRenderer, TranscriptTarget, ERROR_INDICATOR,
};
pub use session::{RequestKind, SessionContext, UploadedFile};
pub use stream::{ChunkAssembler, Utf8Decoder};
pub use transcript::Transcript;
pub use types::{AskResponse, ChatMessage, MessageId, Sender, UploadResponse, NO_ANSWER};
