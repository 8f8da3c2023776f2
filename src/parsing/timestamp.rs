//! Timestamp parsing and display.
//!
//! Transcripts use `DD/MM/YYYY` dates with either a 12-hour clock
//! (`9:15:03 am`) or a 24-hour clock (`14:02:00`). The presence of an
//! `am`/`pm` marker decides which.
//!
//! Rendered output is always a long date (`Fri 05 March 2021`) and a
//! 12-hour time without a leading zero (`9:15:03 am`).

use chrono::NaiveDateTime;

const FORMAT_12_HOUR: &str = "%d/%m/%Y, %I:%M:%S %p";
const FORMAT_24_HOUR: &str = "%d/%m/%Y, %H:%M:%S";

/// Parses the date and time captured from a line prefix.
///
/// Returns `None` for impossible values such as `31/02/2021` or `0:10:00 am`.
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let time = time.replace('\u{202F}', " ");
    let format = if has_meridiem(&time) {
        FORMAT_12_HOUR
    } else {
        FORMAT_24_HOUR
    };
    NaiveDateTime::parse_from_str(&format!("{date}, {time}"), format).ok()
}

fn has_meridiem(time: &str) -> bool {
    let lower = time.to_ascii_lowercase();
    lower.ends_with("am") || lower.ends_with("pm")
}

/// `Fri 05 March 2021`
pub fn format_date(ts: &NaiveDateTime) -> String {
    ts.format("%a %d %B %Y").to_string()
}

/// `9:15:03 am`
pub fn format_time(ts: &NaiveDateTime) -> String {
    ts.format("%-I:%M:%S %P").to_string()
}
