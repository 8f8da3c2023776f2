//! # chathtml
//!
//! A Rust library for turning extracted WhatsApp chat exports into
//! standalone HTML pages, one per conversation.
//!
//! ## Overview
//!
//! An export is a `_chat.txt` transcript plus the media files it refers to.
//! chathtml reads the transcript line by line and writes:
//!
//! - `<output_dir>/<recipient>.html` - the conversation as styled message blocks
//! - `<output_dir>/<recipient>/` - every photo, video and voice note, with
//!   audio the browser cannot play transcoded to mp3
//!
//! Message text gets WhatsApp-style inline markup (`*bold*`, `_italic_`,
//! `~strike~`, ```` ```code``` ````) and clickable links. Anything the
//! renderer does not understand is kept as escaped text rather than dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chathtml::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let ctx = RenderContext::new("Alice", "site", "exports/alice");
//!     let options = RenderOptions::new().with_skip_encryption_notice(true);
//!
//!     let stats = render_chat(&ctx, &options, &Templates::default(), &FfmpegTranscoder::new())?;
//!     println!("{} messages", stats.messages);
//!     Ok(())
//! }
//! ```
//!
//! ## Batches
//!
//! With the `batch` feature (on by default), [`batch::process_chats`]
//! renders a list of JSON jobs on a bounded thread pool. Malformed jobs are
//! reported separately from chats that failed while rendering.
//!
//! ## Module Structure
//!
//! - [`message`] - [`MessageRecord`], [`AttachmentReference`], [`FileType`]
//! - [`config`] - [`RenderContext`](config::RenderContext),
//!   [`RenderOptions`](config::RenderOptions), [`Templates`](config::Templates)
//! - [`parsing`] - the transcript grammar, line classifier and timestamps
//! - [`parser`] - message parsing and the streaming [`TranscriptReader`](parser::TranscriptReader)
//! - [`markup`] - escaping, emphasis, code spans and links
//! - [`attachment`] - media placement and the [`Transcoder`](attachment::Transcoder) trait
//! - [`render`] - the HTML writer and [`render_chat`](render::render_chat)
//! - [`assets`] - helper stylesheet / icon directory
//! - [`batch`] - job validation and the parallel batch runner
//! - [`error`] - [`ChatHtmlError`], [`Result`]
//! - [`logging`] - tracing subscriber setup
//! - [`prelude`] - Convenient re-exports

pub mod assets;
pub mod attachment;
#[cfg(feature = "batch")]
pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod markup;
pub mod message;
pub mod parser;
pub mod parsing;
pub mod render;

// Re-export the main types at the crate root for convenience
pub use error::{ChatHtmlError, Result};
pub use message::{AttachmentReference, FileType, MessageRecord};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chathtml::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ChatHtmlError, Result};
    pub use crate::message::{AttachmentReference, FileType, MessageRecord};

    // Configuration
    pub use crate::config::{RenderContext, RenderOptions, Templates};

    // Parsing
    pub use crate::parser::{TranscriptItem, TranscriptReader, parse_message};
    pub use crate::parsing::Grammar;

    // Rendering
    pub use crate::attachment::{FfmpegTranscoder, Transcoder};
    pub use crate::markup::render_inline;
    pub use crate::render::{RenderStats, render_chat};

    #[cfg(feature = "batch")]
    pub use crate::batch::{BatchConfig, BatchReport, ChatJob, process_chats};
}
