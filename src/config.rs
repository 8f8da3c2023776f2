//! Configuration types for rendering a chat.
//!
//! Everything a render needs is carried by value. A [`RenderContext`] is
//! built once per chat and passed by reference into every core call, so
//! several chats can be rendered on different threads without sharing any
//! mutable state.
//!
//! - [`RenderContext`] - recipient name and the output / staging locations
//! - [`RenderOptions`] - optional behaviour (group chats, title, assets)
//! - [`Templates`] - header and footer HTML fragments
//!
//! # Example
//!
//! ```rust
//! use chathtml::config::{RenderContext, RenderOptions};
//!
//! let ctx = RenderContext::new("Alice", "/tmp/out", "/tmp/staging");
//! assert_eq!(ctx.media_src("a.jpg"), "Alice/a.jpg");
//!
//! let options = RenderOptions::new()
//!     .with_group_chat(true)
//!     .with_chat_title("Book club");
//! assert_eq!(options.title_for(&ctx), "Book club");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChatHtmlError, Result};

/// Name of the transcript file inside an extracted export.
pub const TRANSCRIPT_FILE_NAME: &str = "_chat.txt";

/// Name of the helper asset directory inside the output tree.
pub const ASSETS_DIR_NAME: &str = "Library";

/// Placeholder replaced with the recipient name in templates.
pub const RECIPIENT_PLACEHOLDER: &str = "%recipName%";

/// Placeholder replaced with the chat title in templates.
pub const TITLE_PLACEHOLDER: &str = "%chatTitle%";

const DEFAULT_HEADER: &str = include_str!("../templates/header.html");
const DEFAULT_FOOTER: &str = include_str!("../templates/footer.html");

/// Per-chat rendering context.
///
/// Set once before a chat is processed and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
    /// Display name of the recipient. Messages whose sender equals this
    /// exactly are styled as `recipient`.
    pub recipient_name: String,

    /// Directory receiving `<recipient>.html` and the `<recipient>/` media directory.
    pub output_dir: PathBuf,

    /// Staging directory holding the extracted transcript and media files.
    pub source_dir: PathBuf,
}

impl RenderContext {
    /// Creates a new context.
    pub fn new(
        recipient_name: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            output_dir: output_dir.into(),
            source_dir: source_dir.into(),
        }
    }

    /// Returns a copy with a different recipient.
    #[must_use]
    pub fn with_recipient(mut self, name: impl Into<String>) -> Self {
        self.recipient_name = name.into();
        self
    }

    /// `<output_dir>/<recipient_name>/`
    pub fn media_dir(&self) -> PathBuf {
        self.output_dir.join(&self.recipient_name)
    }

    /// Destination of a resolved attachment.
    pub fn media_path(&self, file_name: &str) -> PathBuf {
        self.media_dir().join(file_name)
    }

    /// Location of an attachment in the staging directory.
    pub fn staged_path(&self, file_name: &str) -> PathBuf {
        self.source_dir.join(file_name)
    }

    /// Path of the transcript in the staging directory.
    pub fn transcript_path(&self) -> PathBuf {
        self.source_dir.join(TRANSCRIPT_FILE_NAME)
    }

    /// `src` attribute for a media file, relative to the HTML file.
    pub fn media_src(&self, file_name: &str) -> String {
        format!("{}/{}", self.recipient_name, file_name)
    }
}

/// Optional rendering behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Treat the chat as a group chat: show sender names and render group
    /// event lines as notices (default: false)
    pub group_chat: bool,

    /// Title substituted for `%chatTitle%` (default: recipient name)
    pub chat_title: Option<String>,

    /// HTML file name without extension (default: recipient name)
    pub html_file_name: Option<String>,

    /// Drop the end-to-end encryption notice WhatsApp puts first (default: false)
    pub skip_encryption_notice: bool,

    /// Copy the helper asset directory into the output tree if it is not
    /// there yet (default: false)
    pub copy_assets: bool,

    /// Where the helper assets live (default: `./Library`)
    pub assets_dir: Option<PathBuf>,
}

impl RenderOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables group chat rendering.
    #[must_use]
    pub fn with_group_chat(mut self, enabled: bool) -> Self {
        self.group_chat = enabled;
        self
    }

    /// Sets the chat title.
    #[must_use]
    pub fn with_chat_title(mut self, title: impl Into<String>) -> Self {
        self.chat_title = Some(title.into());
        self
    }

    /// Sets the HTML file name (without `.html`).
    #[must_use]
    pub fn with_html_file_name(mut self, name: impl Into<String>) -> Self {
        self.html_file_name = Some(name.into());
        self
    }

    /// Sets whether to drop the encryption notice.
    #[must_use]
    pub fn with_skip_encryption_notice(mut self, skip: bool) -> Self {
        self.skip_encryption_notice = skip;
        self
    }

    /// Copies helper assets from `dir` into the output tree.
    #[must_use]
    pub fn with_assets_from(mut self, dir: impl Into<PathBuf>) -> Self {
        self.copy_assets = true;
        self.assets_dir = Some(dir.into());
        self
    }

    /// Resolved chat title.
    pub fn title_for<'a>(&'a self, ctx: &'a RenderContext) -> &'a str {
        self.chat_title.as_deref().unwrap_or(&ctx.recipient_name)
    }

    /// Resolved `<output_dir>/<name>.html` path.
    pub fn html_path(&self, ctx: &RenderContext) -> PathBuf {
        let name = self
            .html_file_name
            .as_deref()
            .unwrap_or(&ctx.recipient_name);
        ctx.output_dir.join(format!("{name}.html"))
    }

    /// Resolved helper asset source directory.
    pub fn assets_source(&self) -> PathBuf {
        self.assets_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(ASSETS_DIR_NAME))
    }
}

/// Header and footer HTML written around the message blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub header: String,
    pub footer: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl Templates {
    /// Creates templates from in-memory strings.
    pub fn new(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            footer: footer.into(),
        }
    }

    /// Reads whichever templates are given, falling back to the built-in ones.
    pub fn load(header: Option<&Path>, footer: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let read = |path: Option<&Path>, fallback: String| match path {
            Some(p) => fs::read_to_string(p).map_err(|e| ChatHtmlError::template(p, e)),
            None => Ok(fallback),
        };
        Ok(Self {
            header: read(header, defaults.header)?,
            footer: read(footer, defaults.footer)?,
        })
    }

    /// Header with placeholders substituted.
    pub fn render_header(&self, recipient: &str, title: &str) -> String {
        substitute(&self.header, recipient, title)
    }

    /// Footer with placeholders substituted.
    pub fn render_footer(&self, recipient: &str, title: &str) -> String {
        substitute(&self.footer, recipient, title)
    }
}

fn substitute(template: &str, recipient: &str, title: &str) -> String {
    template
        .replace(RECIPIENT_PLACEHOLDER, recipient)
        .replace(TITLE_PLACEHOLDER, title)
}
