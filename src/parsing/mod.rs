//! Line-level parsing utilities.
//!
//! This module contains the pieces shared by the message parser and the
//! renderer: the compiled grammar, the line classifier and timestamp
//! handling.

pub mod classify;
pub mod grammar;
pub mod timestamp;

// Re-export commonly used items
pub use classify::{LineKind, classify, clean_line};
pub use grammar::{ENCRYPTION_NOTICE, Grammar, NoticeParts, PrefixParts};
pub use timestamp::{format_date, format_time, parse_timestamp};
