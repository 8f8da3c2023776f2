//! Message parsing and line folding.
//!
//! [`parse_message`] turns one initial line, with its continuation lines
//! already appended, into a [`MessageRecord`]. [`TranscriptReader`] streams
//! a transcript line by line, folds continuation lines into the message they
//! belong to and yields [`TranscriptItem`]s in transcript order.
//!
//! # Example
//!
//! ```rust
//! use chathtml::parser::{TranscriptItem, TranscriptReader};
//! use chathtml::parsing::Grammar;
//! use chathtml::config::RenderOptions;
//!
//! let transcript = "[05/03/2021, 9:15:03 am] Alice: Hello\nsecond line\n\n[05/03/2021, 9:16:00 am] Bob: Hi";
//! let grammar = Grammar::new()?;
//! let options = RenderOptions::default();
//! let items: Vec<_> = TranscriptReader::new(transcript.as_bytes(), &grammar, &options)
//!     .collect::<Result<_, _>>()?;
//!
//! assert_eq!(items.len(), 3);
//! match &items[0] {
//!     TranscriptItem::Message(msg) => assert_eq!(msg.body(), "Hello\nsecond line"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert_eq!(items[1], TranscriptItem::Blank);
//! # Ok::<(), chathtml::ChatHtmlError>(())
//! ```

use std::collections::VecDeque;
use std::io::BufRead;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::RenderOptions;
use crate::error::{ChatHtmlError, Result};
use crate::message::MessageRecord;
use crate::parsing::{ENCRYPTION_NOTICE, Grammar, LineKind, classify, clean_line, parse_timestamp};

/// One renderable unit of a transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptItem {
    /// A full message, continuation lines folded in.
    Message(MessageRecord),
    /// A continuation line with no message to attach to.
    Remnant(String),
    /// An empty line.
    Blank,
    /// A group event such as "Alice added Bob".
    Notice {
        timestamp: NaiveDateTime,
        text: String,
    },
}

/// Parses an initial line plus its folded continuation lines.
///
/// Returns `None` when the text does not follow the prefix grammar or the
/// timestamp is impossible. Callers render such text literally.
pub fn parse_message(grammar: &Grammar, text: &str) -> Option<MessageRecord> {
    let parts = grammar.prefix_parts(text)?;
    let timestamp = parse_timestamp(parts.date, parts.time)?;

    let record = MessageRecord::new(timestamp, parts.sender, parts.body);
    match grammar.attachment(parts.body) {
        Some(attachment) => Some(record.with_attachment(attachment)),
        None => {
            if Grammar::resembles_attachment(parts.body) {
                debug!(body = parts.body, "attachment placeholder not recognised, keeping as text");
            }
            Some(record)
        }
    }
}

/// Streams [`TranscriptItem`]s out of a transcript.
///
/// Holds at most one message back while waiting to see whether the next
/// line continues it.
pub struct TranscriptReader<'a, R: BufRead> {
    reader: R,
    grammar: &'a Grammar,
    group_chat: bool,
    skip_encryption_notice: bool,
    line_buffer: String,
    pending: Option<String>,
    queued: VecDeque<TranscriptItem>,
    lines_read: usize,
    finished: bool,
}

impl<'a, R: BufRead> TranscriptReader<'a, R> {
    pub fn new(reader: R, grammar: &'a Grammar, options: &RenderOptions) -> Self {
        Self {
            reader,
            grammar,
            group_chat: options.group_chat,
            skip_encryption_notice: options.skip_encryption_notice,
            line_buffer: String::with_capacity(4096),
            pending: None,
            queued: VecDeque::new(),
            lines_read: 0,
            finished: false,
        }
    }

    /// Number of raw lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.line_buffer.clear();
        let bytes = self.reader.read_line(&mut self.line_buffer)?;
        if bytes == 0 {
            return Ok(None);
        }
        self.lines_read += 1;
        Ok(Some(clean_line(&self.line_buffer)))
    }

    fn process_line(&mut self, line: String) {
        match classify(self.grammar, &line, self.group_chat) {
            LineKind::Blank => {
                self.flush_pending();
                self.queued.push_back(TranscriptItem::Blank);
            }
            LineKind::Initial => {
                // Impossible dates make the line ordinary text
                let valid = self
                    .grammar
                    .prefix_parts(&line)
                    .and_then(|p| parse_timestamp(p.date, p.time))
                    .is_some();
                if valid {
                    self.flush_pending();
                    self.pending = Some(line);
                } else {
                    debug!(line = %line, "invalid timestamp, treating line as text");
                    self.continue_pending(line);
                }
            }
            LineKind::Notice => {
                let notice = self.grammar.notice_parts(&line).and_then(|p| {
                    parse_timestamp(p.date, p.time).map(|ts| (ts, p.text.to_string()))
                });
                match notice {
                    Some((timestamp, text)) => {
                        self.flush_pending();
                        self.queued
                            .push_back(TranscriptItem::Notice { timestamp, text });
                    }
                    None => self.continue_pending(line),
                }
            }
            LineKind::Continuation => self.continue_pending(line),
        }
    }

    fn continue_pending(&mut self, line: String) {
        match self.pending.as_mut() {
            Some(text) => {
                text.push('\n');
                text.push_str(&line);
            }
            None => self.queued.push_back(TranscriptItem::Remnant(line)),
        }
    }

    fn flush_pending(&mut self) {
        let Some(text) = self.pending.take() else {
            return;
        };

        match parse_message(self.grammar, &text) {
            Some(msg) if self.skip_encryption_notice && msg.body() == ENCRYPTION_NOTICE => {
                debug!(sender = msg.sender(), "skipping encryption notice");
            }
            Some(msg) => self.queued.push_back(TranscriptItem::Message(msg)),
            None => self.queued.push_back(TranscriptItem::Remnant(text)),
        }
    }
}

impl<R: BufRead> Iterator for TranscriptReader<'_, R> {
    type Item = Result<TranscriptItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.queued.pop_front() {
                return Some(Ok(item));
            }
            if self.finished {
                return None;
            }

            match self.read_line() {
                Ok(Some(line)) => self.process_line(line),
                Ok(None) => {
                    self.finished = true;
                    self.flush_pending();
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(ChatHtmlError::Io(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FileType;
    use chrono::Timelike;

    fn read_all(input: &str, options: &RenderOptions) -> Vec<TranscriptItem> {
        let grammar = Grammar::new().unwrap();
        TranscriptReader::new(input.as_bytes(), &grammar, options)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn message(item: &TranscriptItem) -> &MessageRecord {
        match item {
            TranscriptItem::Message(msg) => msg,
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_message_fields() {
        let grammar = Grammar::new().unwrap();
        let msg = parse_message(&grammar, "[05/03/2021, 9:15:03 am] Alice: Hello *world*!")
            .unwrap();
        assert_eq!(msg.sender(), "Alice");
        assert_eq!(msg.body(), "Hello *world*!");
        assert_eq!(msg.timestamp().hour(), 9);
        assert!(msg.attachment().is_none());
    }

    #[test]
    fn test_parse_message_attachment() {
        let grammar = Grammar::new().unwrap();
        let msg = parse_message(
            &grammar,
            "[05/03/2021, 9:15:03 am] Alice: <attached: 00000001-AUDIO-2021-03-05-09-15-03.opus>",
        )
        .unwrap();
        let att = msg.attachment().unwrap();
        assert_eq!(att.file_type(), &FileType::Audio);
        assert_eq!(att.extension(), "opus");
    }

    #[test]
    fn test_parse_message_malformed_attachment_is_text() {
        let grammar = Grammar::new().unwrap();
        let msg =
            parse_message(&grammar, "[05/03/2021, 9:15:03 am] Alice: <attached: cat.jpg>").unwrap();
        assert!(msg.attachment().is_none());
        assert_eq!(msg.body(), "<attached: cat.jpg>");
    }

    #[test]
    fn test_parse_message_rejects_bad_date() {
        let grammar = Grammar::new().unwrap();
        assert!(parse_message(&grammar, "[30/02/2021, 9:15:03 am] Alice: hi").is_none());
        assert!(parse_message(&grammar, "no prefix here").is_none());
    }

    #[test]
    fn test_continuation_lines_fold_in_order() {
        let items = read_all(
            "[05/03/2021, 9:15:03 am] Alice: one\ntwo\nthree\n[05/03/2021, 9:16:00 am] Bob: next\n",
            &RenderOptions::default(),
        );
        assert_eq!(items.len(), 2);
        assert_eq!(message(&items[0]).body(), "one\ntwo\nthree");
        assert_eq!(message(&items[1]).sender(), "Bob");
    }

    #[test]
    fn test_blank_line_ends_message() {
        let items = read_all(
            "[05/03/2021, 9:15:03 am] Alice: one\n\nafter blank\n",
            &RenderOptions::default(),
        );
        assert_eq!(items.len(), 3);
        assert_eq!(message(&items[0]).body(), "one");
        assert_eq!(items[1], TranscriptItem::Blank);
        assert_eq!(items[2], TranscriptItem::Remnant("after blank".into()));
    }

    #[test]
    fn test_leading_continuation_is_remnant() {
        let items = read_all(
            "orphan line\n[05/03/2021, 9:15:03 am] Alice: hi",
            &RenderOptions::default(),
        );
        assert_eq!(items[0], TranscriptItem::Remnant("orphan line".into()));
        assert_eq!(message(&items[1]).body(), "hi");
    }

    #[test]
    fn test_invalid_date_folds_as_text() {
        let items = read_all(
            "[05/03/2021, 9:15:03 am] Alice: hi\n[31/02/2021, 9:15:03 am] Bob: nope\n",
            &RenderOptions::default(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(
            message(&items[0]).body(),
            "hi\n[31/02/2021, 9:15:03 am] Bob: nope"
        );
    }

    #[test]
    fn test_left_to_right_marks_and_crlf_are_stripped() {
        let items = read_all(
            "\u{200E}[05/03/2021, 9:15:03 am] Alice: \u{200E}<attached: 00000002-PHOTO-2021-03-05-09-16-40.jpg>\r\n",
            &RenderOptions::default(),
        );
        let att = message(&items[0]).attachment().unwrap();
        assert_eq!(att.file_type(), &FileType::Photo);
    }

    #[test]
    fn test_group_notice() {
        let input = "[05/03/2021, 14:00:00] Alice: hi\n[05/03/2021, 14:02:00] Alice added Bob\n";

        let items = read_all(input, &RenderOptions::new().with_group_chat(true));
        assert_eq!(items.len(), 2);
        match &items[1] {
            TranscriptItem::Notice { text, timestamp } => {
                assert_eq!(text, "Alice added Bob");
                assert_eq!(timestamp.hour(), 14);
            }
            other => panic!("expected notice, got {other:?}"),
        }

        // Without group mode the event line is an ordinary continuation
        let items = read_all(input, &RenderOptions::default());
        assert_eq!(items.len(), 1);
        assert!(message(&items[0]).body().ends_with("Alice added Bob"));
    }

    #[test]
    fn test_skip_encryption_notice() {
        let input = format!(
            "[05/03/2021, 9:00:00 am] Alice: {ENCRYPTION_NOTICE}\n[05/03/2021, 9:01:00 am] Alice: hi\n"
        );

        let items = read_all(&input, &RenderOptions::new().with_skip_encryption_notice(true));
        assert_eq!(items.len(), 1);
        assert_eq!(message(&items[0]).body(), "hi");

        let items = read_all(&input, &RenderOptions::default());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("", &RenderOptions::default()).is_empty());
    }

    #[test]
    fn test_lines_read() {
        let grammar = Grammar::new().unwrap();
        let options = RenderOptions::default();
        let mut reader = TranscriptReader::new(
            "[05/03/2021, 9:15:03 am] Alice: a\nb\n\n".as_bytes(),
            &grammar,
            &options,
        );
        while reader.next().is_some() {}
        assert_eq!(reader.lines_read(), 3);
    }
}
