//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - top-level arguments
//! - [`Command`] - `render` for one chat, `batch` for a job file
//! - [`RenderArgs`] / [`BatchArgs`] - per-command arguments
//!
//! [`RenderArgs`] converts into the library's configuration types, so the
//! binary only wires them together:
//!
//! ```rust
//! use chathtml::cli::RenderArgs;
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Wrapper {
//!     #[command(flatten)]
//!     render: RenderArgs,
//! }
//!
//! let w = Wrapper::parse_from(["x", "export/", "--recipient", "Alice", "--output", "out/", "--group"]);
//! let ctx = w.render.context();
//! assert_eq!(ctx.recipient_name, "Alice");
//! assert!(w.render.options().group_chat);
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::attachment::FfmpegTranscoder;
use crate::batch::BatchConfig;
use crate::config::{RenderContext, RenderOptions};

/// Convert extracted WhatsApp chat exports into standalone HTML pages.
#[derive(Parser, Debug, Clone)]
#[command(name = "chathtml")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chathtml render ./export --recipient Alice --output ./site
    chathtml render ./family --recipient Alice --output ./site --group --title \"Family\"
    chathtml batch jobs.json --workers 2")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the ffmpeg binary used for audio transcoding
    #[arg(long, value_name = "PATH", default_value = "ffmpeg", global = true)]
    pub ffmpeg: PathBuf,
}

impl Args {
    pub fn transcoder(&self) -> FfmpegTranscoder {
        FfmpegTranscoder::with_binary(&self.ffmpeg)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a single extracted chat
    Render(RenderArgs),

    /// Render every chat listed in a JSON job file
    Batch(BatchArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Directory containing `_chat.txt` and the media files
    pub staging_dir: PathBuf,

    /// Display name of the recipient, exactly as it appears in the chat
    #[arg(short, long)]
    pub recipient: String,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Header template (default: built-in)
    #[arg(long, value_name = "FILE")]
    pub header: Option<PathBuf>,

    /// Footer template (default: built-in)
    #[arg(long, value_name = "FILE")]
    pub footer: Option<PathBuf>,

    /// Treat the chat as a group chat
    #[arg(short, long)]
    pub group: bool,

    /// Page title (default: recipient)
    #[arg(long)]
    pub title: Option<String>,

    /// HTML file name without extension (default: recipient)
    #[arg(long, value_name = "NAME")]
    pub file_name: Option<String>,

    /// Copy helper assets from this directory into `<output>/Library`
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Drop the end-to-end encryption notice
    #[arg(long)]
    pub skip_encryption_notice: bool,
}

impl RenderArgs {
    pub fn context(&self) -> RenderContext {
        RenderContext::new(&self.recipient, &self.output, &self.staging_dir)
    }

    pub fn options(&self) -> RenderOptions {
        let mut options = RenderOptions::new()
            .with_group_chat(self.group)
            .with_skip_encryption_notice(self.skip_encryption_notice);
        if let Some(title) = &self.title {
            options = options.with_chat_title(title);
        }
        if let Some(name) = &self.file_name {
            options = options.with_html_file_name(name);
        }
        if let Some(dir) = &self.assets {
            options = options.with_assets_from(dir);
        }
        options
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct BatchArgs {
    /// JSON file containing an array of chat jobs
    pub jobs: PathBuf,

    /// Number of chats rendered in parallel (default: CPU count, at most 4)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

impl BatchArgs {
    pub fn config(&self) -> BatchConfig {
        self.workers
            .map_or_else(BatchConfig::default, BatchConfig::with_workers)
    }
}
