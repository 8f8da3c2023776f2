//! Line classification.
//!
//! Every raw transcript line is exactly one of:
//!
//! | Kind | Shape | Rendering |
//! |------|-------|-----------|
//! | [`LineKind::Initial`] | `[date, time] name: body` | starts a message block |
//! | [`LineKind::Continuation`] | any other non-empty line | folded into the previous message |
//! | [`LineKind::Blank`] | empty line | bare `<br>` |
//! | [`LineKind::Notice`] | `[date, time] event` (group chats only) | group notice block |

use super::grammar::Grammar;

/// Left-to-right mark inserted by exports around names and attachments.
pub const LEFT_TO_RIGHT_MARK: char = '\u{200E}';

/// Classification of a single raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Initial,
    Continuation,
    Blank,
    /// Group event line with a timestamp but no `name: ` part.
    Notice,
}

/// Strips left-to-right marks and a trailing carriage return.
pub fn clean_line(line: &str) -> String {
    line.trim_end_matches(['\r', '\n'])
        .chars()
        .filter(|&c| c != LEFT_TO_RIGHT_MARK)
        .collect()
}

/// Classifies an already-cleaned line.
///
/// Notices are only recognised when `group_chat` is set; otherwise such a
/// line is an ordinary continuation.
pub fn classify(grammar: &Grammar, line: &str, group_chat: bool) -> LineKind {
    if line.is_empty() {
        LineKind::Blank
    } else if grammar.is_initial(line) {
        LineKind::Initial
    } else if group_chat && grammar.notice_parts(line).is_some() {
        LineKind::Notice
    } else {
        LineKind::Continuation
    }
}
