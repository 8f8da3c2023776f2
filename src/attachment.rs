//! Attachment resolution.
//!
//! Maps an [`AttachmentReference`] to the HTML element that embeds it and
//! puts the media file in place under `<output_dir>/<recipient>/`.
//!
//! | Type | Extension | Action | Element |
//! |------|-----------|--------|---------|
//! | AUDIO | `mp3`, `ogg`, `wav` | copy | `<audio>` with matching MIME type |
//! | AUDIO | anything else | transcode to `mp3` | `<audio>` (`audio/mpeg`) |
//! | VIDEO | any | copy | `<video>` with one `<source>` |
//! | PHOTO, GIF | any | copy | `<img>` at 30% size |
//! | other | any | none | placeholder rendered as text |
//!
//! Transcoding goes through the [`Transcoder`] trait; [`FfmpegTranscoder`]
//! shells out to `ffmpeg`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::RenderContext;
use crate::error::{ChatHtmlError, Result};
use crate::markup::escape_html;
use crate::message::{AttachmentReference, FileType};

/// Audio formats browsers play natively, with their MIME subtype.
pub const HTML_AUDIO_FORMATS: [(&str, &str); 3] = [("mp3", "mpeg"), ("ogg", "ogg"), ("wav", "wav")];

/// Converts audio files to mp3.
pub trait Transcoder: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Writes an mp3 rendition of `source` to `dest`, overwriting it.
    fn to_mp3(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// [`Transcoder`] backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTranscoder {
    /// Uses `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }

    /// Uses a specific ffmpeg binary.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check if the ffmpeg binary can be run.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn to_mp3(&self, source: &Path, dest: &Path) -> Result<()> {
        let output = Command::new(&self.binary)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(source)
            .args(["-vn", "-codec:a", "libmp3lame"])
            .arg(dest)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ChatHtmlError::transcode(
                    source,
                    format!("failed to run {}: {e}", self.binary.display()),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChatHtmlError::transcode(
                source,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        Ok(())
    }
}

/// Element that embeds a resolved attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaElement {
    Audio { src: String, mime: String },
    Video { src: String },
    Image { src: String },
}

impl MediaElement {
    pub fn to_html(&self) -> String {
        match self {
            MediaElement::Audio { src, mime } => format!(
                "<audio controls>\n\t<source src=\"{}\" type=\"{}\">\n</audio>",
                escape_html(src),
                mime
            ),
            MediaElement::Video { src } => format!(
                "<video controls>\n\t<source src=\"{}\">\n</video>",
                escape_html(src)
            ),
            MediaElement::Image { src } => format!(
                "<img src=\"{}\" alt=\"Image\" width=\"30%\" height=\"30%\">",
                escape_html(src)
            ),
        }
    }
}

/// How the media file reaches the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    Copy,
    Transcode,
}

/// Everything needed to resolve one attachment, computed without touching
/// the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPlan {
    pub action: MediaAction,
    /// File name in the staging directory.
    pub source_name: String,
    /// File name in the media directory.
    pub output_name: String,
    pub element: MediaElement,
}

/// Decides how an attachment is embedded.
///
/// Returns `None` for types that cannot be embedded. The result depends only
/// on the reference and the recipient name.
pub fn plan(attachment: &AttachmentReference, ctx: &RenderContext) -> Option<MediaPlan> {
    let source_name = attachment.file_name();
    let copy = |element: MediaElement| MediaPlan {
        action: MediaAction::Copy,
        source_name: source_name.clone(),
        output_name: source_name.clone(),
        element,
    };

    match attachment.file_type() {
        FileType::Audio => match native_audio_subtype(attachment.extension()) {
            Some(subtype) => Some(copy(MediaElement::Audio {
                src: ctx.media_src(&source_name),
                mime: format!("audio/{subtype}"),
            })),
            None => {
                let output_name = format!("{}.mp3", attachment.stem());
                Some(MediaPlan {
                    action: MediaAction::Transcode,
                    element: MediaElement::Audio {
                        src: ctx.media_src(&output_name),
                        mime: "audio/mpeg".to_string(),
                    },
                    source_name,
                    output_name,
                })
            }
        },
        FileType::Video => Some(copy(MediaElement::Video {
            src: ctx.media_src(&source_name),
        })),
        FileType::Photo | FileType::Gif => Some(copy(MediaElement::Image {
            src: ctx.media_src(&source_name),
        })),
        FileType::Other(_) => None,
    }
}

fn native_audio_subtype(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    HTML_AUDIO_FORMATS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, subtype)| *subtype)
}

/// Outcome of resolving one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The file is in place and `element` embeds it.
    Embedded {
        action: MediaAction,
        element: MediaElement,
        path: PathBuf,
    },
    /// The type is not embeddable; render the placeholder as text.
    Unresolved,
}

/// Resolves attachments for one chat.
pub struct AttachmentResolver<'a> {
    ctx: &'a RenderContext,
    transcoder: &'a dyn Transcoder,
}

impl<'a> AttachmentResolver<'a> {
    pub fn new(ctx: &'a RenderContext, transcoder: &'a dyn Transcoder) -> Self {
        Self { ctx, transcoder }
    }

    /// Puts the media file in place and returns the element embedding it.
    ///
    /// A missing staged file is an error. Resolving the same reference
    /// twice overwrites the earlier output.
    pub fn resolve(&self, attachment: &AttachmentReference) -> Result<Resolution> {
        let Some(plan) = plan(attachment, self.ctx) else {
            debug!(file = %attachment.file_name(), kind = %attachment.file_type(), "unsupported attachment type");
            return Ok(Resolution::Unresolved);
        };

        let source = self.ctx.staged_path(&plan.source_name);
        if !source.is_file() {
            return Err(ChatHtmlError::missing_media(source));
        }
        let dest = self.ctx.media_path(&plan.output_name);

        match plan.action {
            MediaAction::Copy => {
                fs::copy(&source, &dest)?;
            }
            MediaAction::Transcode => {
                debug!(
                    file = %plan.source_name,
                    transcoder = self.transcoder.name(),
                    "transcoding audio to mp3"
                );
                self.transcoder.to_mp3(&source, &dest)?;
            }
        }

        Ok(Resolution::Embedded {
            action: plan.action,
            element: plan.element,
            path: dest,
        })
    }
}
