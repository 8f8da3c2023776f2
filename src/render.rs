//! HTML document rendering.
//!
//! [`render_chat`] is the per-chat entry point: it reads `_chat.txt` from the
//! staging directory, writes `<output_dir>/<recipient>.html` and fills
//! `<output_dir>/<recipient>/` with the attachments.
//!
//! Output is streamed. Every [`TranscriptItem`] becomes one block, written
//! before the next line is read:
//!
//! | Item | Output |
//! |------|--------|
//! | message | `<div class="message sender\|recipient">` block |
//! | remnant | `<br>` followed by the text, no wrapper |
//! | blank line | `<br>` |
//! | group notice | `<div class="group-notice">` |
//!
//! A failure part-way leaves a truncated HTML file behind. Rendering the
//! same chat again overwrites it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use serde::Serialize;
use tracing::{debug, info};

use crate::assets::copy_assets_once;
use crate::attachment::{AttachmentResolver, MediaAction, Resolution, Transcoder};
use crate::config::{RenderContext, RenderOptions, Templates};
use crate::error::Result;
use crate::markup::{convert_line_breaks, escape_html, render_inline};
use crate::message::MessageRecord;
use crate::parser::{TranscriptItem, TranscriptReader};
use crate::parsing::{Grammar, format_date, format_time};

/// Counts collected while rendering one chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub messages: usize,
    /// Lines that continued no message and were written bare.
    pub remnants: usize,
    pub blank_lines: usize,
    pub notices: usize,
    pub attachments_copied: usize,
    pub attachments_transcoded: usize,
    /// Placeholders of unsupported types, kept as text.
    pub attachments_unresolved: usize,
}

impl RenderStats {
    /// Attachments written to the media directory.
    pub fn attachments_embedded(&self) -> usize {
        self.attachments_copied + self.attachments_transcoded
    }

    /// Adds another chat's counts to this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.messages += other.messages;
        self.remnants += other.remnants;
        self.blank_lines += other.blank_lines;
        self.notices += other.notices;
        self.attachments_copied += other.attachments_copied;
        self.attachments_transcoded += other.attachments_transcoded;
        self.attachments_unresolved += other.attachments_unresolved;
    }
}

/// Builds a message block around already-rendered body HTML.
///
/// The `name` span is only included when `show_name` is set and the sender
/// is not the recipient.
pub fn message_block(
    msg: &MessageRecord,
    body_html: &str,
    recipient: &str,
    show_name: bool,
) -> String {
    let from_recipient = msg.is_from(recipient);
    let class = if from_recipient { "recipient" } else { "sender" };

    let mut block = format!("<div class=\"message {class}\">\n");
    if show_name && !from_recipient {
        block.push_str(&format!(
            "\t<span class=\"message-info name\">{}</span>\n",
            escape_html(msg.sender())
        ));
    }
    block.push('\t');
    block.push_str(body_html);
    block.push('\n');
    block.push_str(&format!(
        "\t<span class=\"message-info time\">{}</span>\n",
        format_time(&msg.timestamp())
    ));
    block.push_str(&format!(
        "\t<span class=\"message-info date\">{}</span>\n",
        format_date(&msg.timestamp())
    ));
    block.push_str("</div>\n");
    block
}

/// Writes transcript items as HTML to an output stream.
pub struct DocumentRenderer<'a, W: Write> {
    out: W,
    grammar: &'a Grammar,
    ctx: &'a RenderContext,
    options: &'a RenderOptions,
    resolver: AttachmentResolver<'a>,
    stats: RenderStats,
}

impl<'a, W: Write> DocumentRenderer<'a, W> {
    pub fn new(
        out: W,
        grammar: &'a Grammar,
        ctx: &'a RenderContext,
        options: &'a RenderOptions,
        transcoder: &'a dyn Transcoder,
    ) -> Self {
        Self {
            out,
            grammar,
            ctx,
            options,
            resolver: AttachmentResolver::new(ctx, transcoder),
            stats: RenderStats::default(),
        }
    }

    /// Writes the header with its placeholders filled in.
    pub fn write_header(&mut self, templates: &Templates) -> Result<()> {
        let title = self.options.title_for(self.ctx);
        let header = templates.render_header(&self.ctx.recipient_name, title);
        self.out.write_all(header.as_bytes())?;
        Ok(())
    }

    /// Writes the footer and flushes the stream.
    pub fn write_footer(&mut self, templates: &Templates) -> Result<()> {
        let title = self.options.title_for(self.ctx);
        let footer = templates.render_footer(&self.ctx.recipient_name, title);
        self.out.write_all(footer.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Writes one block.
    pub fn write_item(&mut self, item: &TranscriptItem) -> Result<()> {
        let html = match item {
            TranscriptItem::Message(msg) => {
                self.stats.messages += 1;
                let body = self.render_body(msg)?;
                message_block(
                    msg,
                    &body,
                    &self.ctx.recipient_name,
                    self.options.group_chat,
                )
            }
            TranscriptItem::Remnant(text) => {
                self.stats.remnants += 1;
                format!("<br>{}\n", render_inline(self.grammar, text))
            }
            TranscriptItem::Blank => {
                self.stats.blank_lines += 1;
                "<br>\n".to_string()
            }
            TranscriptItem::Notice { timestamp, text } => {
                self.stats.notices += 1;
                format!(
                    "<div class=\"group-notice\">{} <span class=\"message-info time\">{}</span> <span class=\"message-info date\">{}</span></div>\n",
                    escape_html(text),
                    format_time(timestamp),
                    format_date(timestamp)
                )
            }
        };
        self.out.write_all(html.as_bytes())?;
        Ok(())
    }

    fn render_body(&mut self, msg: &MessageRecord) -> Result<String> {
        let Some(attachment) = msg.attachment() else {
            // Lookalike placeholders stay literal so their file names are not linked
            if Grammar::resembles_attachment(msg.body()) {
                return Ok(convert_line_breaks(&escape_html(msg.body())));
            }
            return Ok(render_inline(self.grammar, msg.body()));
        };

        match self.resolver.resolve(attachment)? {
            Resolution::Embedded { action, element, path } => {
                match action {
                    MediaAction::Copy => self.stats.attachments_copied += 1,
                    MediaAction::Transcode => self.stats.attachments_transcoded += 1,
                }
                debug!(path = %path.display(), "attachment resolved");
                Ok(element.to_html())
            }
            Resolution::Unresolved => {
                self.stats.attachments_unresolved += 1;
                Ok(escape_html(&attachment.placeholder()))
            }
        }
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Returns the stats and the underlying stream.
    pub fn into_parts(self) -> (W, RenderStats) {
        (self.out, self.stats)
    }
}

/// Renders a whole transcript stream between the header and footer.
///
/// The media directory must already exist when the transcript references
/// attachments.
pub fn render_transcript<R, W>(
    input: R,
    out: W,
    ctx: &RenderContext,
    options: &RenderOptions,
    templates: &Templates,
    transcoder: &dyn Transcoder,
) -> Result<RenderStats>
where
    R: std::io::BufRead,
    W: Write,
{
    let grammar = Grammar::new()?;
    let mut renderer = DocumentRenderer::new(out, &grammar, ctx, options, transcoder);

    renderer.write_header(templates)?;
    for item in TranscriptReader::new(input, &grammar, options) {
        renderer.write_item(&item?)?;
    }
    renderer.write_footer(templates)?;

    let (_, stats) = renderer.into_parts();
    Ok(stats)
}

/// Renders one chat from its staging directory into the output directory.
pub fn render_chat(
    ctx: &RenderContext,
    options: &RenderOptions,
    templates: &Templates,
    transcoder: &dyn Transcoder,
) -> Result<RenderStats> {
    let html_path = options.html_path(ctx);
    info!(
        recipient = %ctx.recipient_name,
        source = %ctx.source_dir.display(),
        output = %html_path.display(),
        "rendering chat"
    );

    fs::create_dir_all(ctx.media_dir())?;
    if options.copy_assets {
        copy_assets_once(&options.assets_source(), &ctx.output_dir)?;
    }

    let input = BufReader::new(File::open(ctx.transcript_path())?);
    let output = BufWriter::new(File::create(&html_path)?);
    let stats = render_transcript(input, output, ctx, options, templates, transcoder)?;

    info!(
        recipient = %ctx.recipient_name,
        messages = stats.messages,
        attachments = stats.attachments_embedded(),
        "chat rendered"
    );
    Ok(stats)
}
