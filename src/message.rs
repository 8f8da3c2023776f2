//! Parsed units of a chat transcript.
//!
//! A [`MessageRecord`] is built once per initial transcript line, with any
//! continuation lines already folded into its body. It is handed to the
//! renderer and then dropped.
//!
//! # Example
//!
//! ```
//! use chathtml::message::{AttachmentReference, FileType, MessageRecord};
//! use chrono::NaiveDate;
//!
//! let ts = NaiveDate::from_ymd_opt(2021, 3, 5)
//!     .unwrap()
//!     .and_hms_opt(9, 15, 3)
//!     .unwrap();
//! let msg = MessageRecord::new(ts, "Alice", "Hello *world*!");
//!
//! assert_eq!(msg.sender(), "Alice");
//! assert!(msg.attachment().is_none());
//!
//! let att = AttachmentReference::new("00000001-AUDIO-2021-03-05-09-15-03", FileType::Audio, "opus");
//! assert_eq!(att.file_name(), "00000001-AUDIO-2021-03-05-09-15-03.opus");
//! ```

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Media kind encoded in an attachment file name, e.g. the `PHOTO` in
/// `00000002-PHOTO-2021-03-05-09-16-40.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Audio,
    Video,
    Photo,
    Gif,
    /// Any tag the resolver does not know how to embed (`STICKER`,
    /// `CONTACT`, `DOCUMENT`, ...).
    Other(String),
}

impl FileType {
    /// Maps the tag found in a file name to a [`FileType`].
    ///
    /// Matching is exact: exports always use upper-case tags.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "AUDIO" => FileType::Audio,
            "VIDEO" => FileType::Video,
            "PHOTO" => FileType::Photo,
            "GIF" => FileType::Gif,
            other => FileType::Other(other.to_string()),
        }
    }

    /// Returns the tag as it appears in file names.
    pub fn tag(&self) -> &str {
        match self {
            FileType::Audio => "AUDIO",
            FileType::Video => "VIDEO",
            FileType::Photo => "PHOTO",
            FileType::Gif => "GIF",
            FileType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reference to a media file, extracted from an `<attached: NAME.EXT>`
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentReference {
    stem: String,
    file_type: FileType,
    extension: String,
}

impl AttachmentReference {
    /// Creates a reference. `extension` is given without the leading dot.
    pub fn new(
        stem: impl Into<String>,
        file_type: FileType,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            stem: stem.into(),
            file_type,
            extension: extension.into(),
        }
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    /// Extension without the leading dot, as written in the transcript.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full file name as found in the staging directory.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }

    /// The placeholder text this reference was parsed from.
    pub fn placeholder(&self) -> String {
        format!("<attached: {}>", self.file_name())
    }
}

/// One message of the conversation.
///
/// | Field | Description |
/// |-------|-------------|
/// | `timestamp` | Date and time-of-day from the line prefix |
/// | `sender` | Display name, compared verbatim against the recipient |
/// | `body` | Raw text; folded continuation lines are `\n`-joined |
/// | `attachment` | Set when the body is only an attachment placeholder |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    timestamp: NaiveDateTime,
    sender: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    attachment: Option<AttachmentReference>,
}

impl MessageRecord {
    /// Creates a text message.
    pub fn new(
        timestamp: NaiveDateTime,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            sender: sender.into(),
            body: body.into(),
            attachment: None,
        }
    }

    /// Attaches a media reference.
    #[must_use]
    pub fn with_attachment(mut self, attachment: AttachmentReference) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn attachment(&self) -> Option<&AttachmentReference> {
        self.attachment.as_ref()
    }

    /// Returns `true` if this message was sent by `recipient`.
    ///
    /// The comparison is exact and case-sensitive.
    pub fn is_from(&self, recipient: &str) -> bool {
        self.sender == recipient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 5)
            .unwrap()
            .and_hms_opt(9, 15, 3)
            .unwrap()
    }

    #[test]
    fn test_file_type_from_tag() {
        assert_eq!(FileType::from_tag("AUDIO"), FileType::Audio);
        assert_eq!(FileType::from_tag("VIDEO"), FileType::Video);
        assert_eq!(FileType::from_tag("PHOTO"), FileType::Photo);
        assert_eq!(FileType::from_tag("GIF"), FileType::Gif);
        assert_eq!(
            FileType::from_tag("STICKER"),
            FileType::Other("STICKER".into())
        );
        // Tags are case-sensitive
        assert_eq!(FileType::from_tag("photo"), FileType::Other("photo".into()));
    }

    #[test]
    fn test_file_type_display_round_trips_tag() {
        for tag in ["AUDIO", "VIDEO", "PHOTO", "GIF", "CONTACT"] {
            assert_eq!(FileType::from_tag(tag).to_string(), tag);
        }
    }

    #[test]
    fn test_attachment_reference_names() {
        let att = AttachmentReference::new(
            "00000002-PHOTO-2021-03-05-09-16-40",
            FileType::Photo,
            "jpg",
        );
        assert_eq!(att.file_name(), "00000002-PHOTO-2021-03-05-09-16-40.jpg");
        assert_eq!(
            att.placeholder(),
            "<attached: 00000002-PHOTO-2021-03-05-09-16-40.jpg>"
        );
    }

    #[test]
    fn test_message_is_from_is_case_sensitive() {
        let msg = MessageRecord::new(ts(), "Alice", "hi");
        assert!(msg.is_from("Alice"));
        assert!(!msg.is_from("alice"));
        assert!(!msg.is_from("Alice "));
    }

    #[test]
    fn test_message_serde_skips_missing_attachment() {
        let msg = MessageRecord::new(ts(), "Alice", "Hello!");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("attachment"));

        let parsed: MessageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
