//! Unified error types for chathtml.
//!
//! Only a handful of conditions are fatal for a chat. Malformed lines,
//! unterminated markup and unrecognized attachment types all degrade to
//! literal text and never surface here.
//!
//! # Error Handling Philosophy
//!
//! - **Library users** get typed errors they can match on
//! - **Batch runners** can record a failing chat and keep going
//! - **Application users** get the offending path in the message

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chathtml operations.
///
/// # Example
///
/// ```rust
/// use chathtml::error::Result;
///
/// fn my_function() -> Result<usize> {
///     Ok(0)
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatHtmlError>;

/// The error type for all chathtml operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatHtmlError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - The transcript file doesn't exist
    /// - The output directory is not writable
    /// - Disk is full (when writing the HTML file)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A media file referenced by an attachment placeholder is missing
    /// from the staging directory.
    ///
    /// This is fatal for the chat being rendered: the file cannot be
    /// synthesized.
    #[error("Missing media file: {}", path.display())]
    MissingMedia {
        /// Where the file was expected
        path: PathBuf,
    },

    /// The helper asset directory could not be found or walked.
    #[error("Missing assets directory: {}", path.display())]
    MissingAssets {
        /// The asset directory that was requested
        path: PathBuf,
    },

    /// The audio transcoder failed to produce an mp3.
    #[error("Failed to transcode {}: {message}", path.display())]
    Transcode {
        /// Source audio file
        path: PathBuf,
        /// Transcoder diagnostics
        message: String,
    },

    /// A header or footer template could not be read.
    #[error("Failed to read template {}: {source}", path.display())]
    Template {
        /// Template path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A batch job entry had the wrong shape.
    ///
    /// Rejected jobs are reported separately from failed ones; see
    /// [`crate::batch::BatchReport`].
    #[error("Invalid job #{index}: {message}")]
    InvalidJob {
        /// Position of the job in the submitted list
        index: usize,
        /// Description of what's wrong
        message: String,
    },

    /// A batch finished with failed or rejected chats.
    ///
    /// Produced only after every runnable chat has been attempted.
    #[error("Batch incomplete: {failed} failed, {rejected} rejected of {total} jobs")]
    BatchIncomplete {
        /// Chats that were run and failed
        failed: usize,
        /// Jobs rejected before running
        rejected: usize,
        /// Jobs submitted
        total: usize,
    },

    /// A transcript grammar could not be compiled.
    #[error("Invalid {format} format: {message}")]
    InvalidFormat {
        /// The grammar that failed
        format: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// JSON parsing error while reading a job file.
    #[cfg(feature = "batch")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatHtmlError {
    /// Creates a missing media error.
    pub fn missing_media(path: impl Into<PathBuf>) -> Self {
        ChatHtmlError::MissingMedia { path: path.into() }
    }

    /// Creates a missing assets error.
    pub fn missing_assets(path: impl Into<PathBuf>) -> Self {
        ChatHtmlError::MissingAssets { path: path.into() }
    }

    /// Creates a transcode error.
    pub fn transcode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ChatHtmlError::Transcode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a template error.
    pub fn template(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ChatHtmlError::Template {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid job error.
    pub fn invalid_job(index: usize, message: impl Into<String>) -> Self {
        ChatHtmlError::InvalidJob {
            index,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(format: &'static str, message: impl Into<String>) -> Self {
        ChatHtmlError::InvalidFormat {
            format,
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatHtmlError::Io(_))
    }

    /// Returns `true` if a referenced media file was missing.
    pub fn is_missing_media(&self) -> bool {
        matches!(self, ChatHtmlError::MissingMedia { .. })
    }

    /// Returns `true` if the helper asset directory was missing.
    pub fn is_missing_assets(&self) -> bool {
        matches!(self, ChatHtmlError::MissingAssets { .. })
    }

    /// Returns `true` if audio transcoding failed.
    pub fn is_transcode(&self) -> bool {
        matches!(self, ChatHtmlError::Transcode { .. })
    }

    /// Returns `true` if a batch job was rejected for its shape.
    pub fn is_invalid_job(&self) -> bool {
        matches!(self, ChatHtmlError::InvalidJob { .. })
    }

    /// Returns `true` if a batch ended with failed or rejected chats.
    pub fn is_batch_incomplete(&self) -> bool {
        matches!(self, ChatHtmlError::BatchIncomplete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ChatHtmlError::from(io_err);
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
        assert!(err.is_io());
    }

    #[test]
    fn test_missing_media_display() {
        let err = ChatHtmlError::missing_media("/tmp/staging/00000001-PHOTO.jpg");
        assert!(err.is_missing_media());
        assert!(err.to_string().contains("00000001-PHOTO.jpg"));
    }

    #[test]
    fn test_transcode_display() {
        let err = ChatHtmlError::transcode("voice.opus", "ffmpeg exited with status 1");
        assert!(err.is_transcode());
        let display = err.to_string();
        assert!(display.contains("voice.opus"));
        assert!(display.contains("status 1"));
    }

    #[test]
    fn test_template_error_keeps_source() {
        use std::error::Error as _;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ChatHtmlError::template("header.html", io_err);
        assert!(err.to_string().contains("header.html"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_invalid_job_display() {
        let err = ChatHtmlError::invalid_job(3, "missing field `recipient`");
        assert!(err.is_invalid_job());
        let display = err.to_string();
        assert!(display.contains("#3"));
        assert!(display.contains("recipient"));
    }

    #[test]
    fn test_missing_assets_is_not_media() {
        let err = ChatHtmlError::missing_assets("/srv/Library");
        assert!(err.is_missing_assets());
        assert!(!err.is_missing_media());
        assert!(err.to_string().contains("assets directory"));
    }

    #[test]
    fn test_batch_incomplete_display() {
        let err = ChatHtmlError::BatchIncomplete {
            failed: 1,
            rejected: 2,
            total: 5,
        };
        assert!(err.is_batch_incomplete());
        assert!(!err.is_invalid_job());
        assert_eq!(
            err.to_string(),
            "Batch incomplete: 1 failed, 2 rejected of 5 jobs"
        );
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let err = ChatHtmlError::invalid_format("prefix", "bad regex");
        assert!(!err.is_io());
        assert!(!err.is_missing_media());
        assert!(!err.is_transcode());
        assert!(!err.is_invalid_job());
    }
}
