use chrono::{Local, NaiveDateTime};

/// Storage format for message timestamps.
///
/// Fixed width and zero padded, so comparing two formatted timestamps as
/// strings gives the same order as comparing the instants. Storage sorts on
/// the raw string and relies on this.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length in bytes of a formatted timestamp.
pub const TIMESTAMP_LEN: usize = 19;

/// Current local wall-clock time, truncated to whole seconds.
pub fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse(timestamp: &str) -> Option<NaiveDateTime> {
    if timestamp.len() != TIMESTAMP_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}
