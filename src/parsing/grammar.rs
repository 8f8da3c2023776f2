//! The transcript grammar.
//!
//! One set of patterns describes every line shape the renderer understands:
//!
//! - Message prefix: `[05/03/2021, 9:15:03 am] Alice: Hello`
//!   (12-hour with `am`/`pm`, or 24-hour `[05/03/2021, 14:02:00]`)
//! - Group event: `[05/03/2021, 14:02:00] Alice added Bob` (no `name: `)
//! - Attachment: `<attached: 00000001-AUDIO-2021-03-05-09-15-03.opus>`
//! - Links: `http://x.io`, `www.example.com/path`, `example.org`

use regex::{Captures, Regex};

use crate::error::{ChatHtmlError, Result};
use crate::message::{AttachmentReference, FileType};

const DATE: &str = r"[0-9]{2}/[0-9]{2}/[0-9]{4}";
// iOS exports sometimes put a narrow no-break space before am/pm
const TIME: &str = r"[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:[ \x{202F}][AaPp][Mm])?";

const ATTACHMENT_PATTERN: &str = r"^<attached: (?P<stem>[0-9]{8}-(?P<tag>\w+)-[0-9]{4}-[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2})\.(?P<ext>\w+)>$";

const LINK_PATTERN: &str =
    r"\b(?:https?://)?(?:[\w-]+\.)+[A-Za-z]{2,}\b(?::[0-9]+)?(?:[/?#][^\s<>]*)?";

/// Opening of an attachment placeholder, used to spot lines that look like
/// attachments but don't follow the export's file naming.
pub const ATTACHMENT_MARKER: &str = "<attached:";

/// First message of every export.
pub const ENCRYPTION_NOTICE: &str = "Messages and calls are end-to-end encrypted. \
    No one outside of this chat, not even WhatsApp, can read or listen to them.";

/// Fields captured from an initial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixParts<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub sender: &'a str,
    pub body: &'a str,
}

/// Fields captured from a group event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeParts<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub text: &'a str,
}

/// Compiled transcript patterns.
///
/// Immutable once built; one instance can be shared by every chat in a batch.
#[derive(Debug, Clone)]
pub struct Grammar {
    prefix: Regex,
    notice: Regex,
    attachment: Regex,
    link: Regex,
}

impl Grammar {
    /// Compiles all patterns.
    pub fn new() -> Result<Self> {
        let compile = |name: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|e| ChatHtmlError::invalid_format(name, e.to_string()))
        };

        Ok(Self {
            prefix: compile(
                "message prefix",
                &format!(
                    r"(?s)^\[(?P<date>{DATE}), (?P<time>{TIME})\] (?P<name>[^:\n]+): (?P<body>.*)$"
                ),
            )?,
            notice: compile(
                "group notice",
                &format!(r"^\[(?P<date>{DATE}), (?P<time>{TIME})\] (?P<text>.+)$"),
            )?,
            attachment: compile("attachment", ATTACHMENT_PATTERN)?,
            link: compile("link", LINK_PATTERN)?,
        })
    }

    /// Returns `true` if `line` starts a new message.
    pub fn is_initial(&self, line: &str) -> bool {
        self.prefix.is_match(line)
    }

    /// Splits an initial line (or folded line group) into its fields.
    ///
    /// The body is everything after the first `": "` that follows the
    /// closing bracket; later `": "` sequences stay in the body.
    pub fn prefix_parts<'a>(&self, text: &'a str) -> Option<PrefixParts<'a>> {
        let caps = self.prefix.captures(text)?;
        Some(PrefixParts {
            date: group(&caps, "date"),
            time: group(&caps, "time"),
            sender: group(&caps, "name"),
            body: group(&caps, "body"),
        })
    }

    /// Splits a group event line into its fields.
    ///
    /// Only meaningful for lines that are not initial lines.
    pub fn notice_parts<'a>(&self, line: &'a str) -> Option<NoticeParts<'a>> {
        let caps = self.notice.captures(line)?;
        Some(NoticeParts {
            date: group(&caps, "date"),
            time: group(&caps, "time"),
            text: group(&caps, "text"),
        })
    }

    /// Extracts the attachment reference when `body` is exactly one
    /// well-formed placeholder.
    pub fn attachment(&self, body: &str) -> Option<AttachmentReference> {
        let caps = self.attachment.captures(body.trim())?;
        Some(AttachmentReference::new(
            group(&caps, "stem"),
            FileType::from_tag(group(&caps, "tag")),
            group(&caps, "ext"),
        ))
    }

    /// Returns `true` if `body` contains something shaped like a placeholder,
    /// well-formed or not.
    pub fn resembles_attachment(body: &str) -> bool {
        body.contains(ATTACHMENT_MARKER)
    }

    /// The autolink pattern.
    pub fn link(&self) -> &Regex {
        &self.link
    }
}

fn group<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map_or("", |m| m.as_str())
}
