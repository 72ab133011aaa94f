//! EPG (Electronic Program Guide) module
//!
//! Contains the schedule builder, the XMLTV document model and a reader for
//! checking generated guides.

mod document;
mod parser;
mod schedule;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{EpgError, Result};

// Re-export public types
pub use document::{ChannelEntry, Guide, LangText, Programme};
pub use parser::{GuideInspector, GuideReport, InspectedProgramme, Violation};
pub use schedule::{ScheduleBuilder, ScheduleOptions};

/// Timezone used when none is given
pub const DEFAULT_TIMEZONE: &str = "+0000";

/// XMLTV timestamp layout, the offset is appended separately
const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

static TIMEZONE_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-][0-9]{4}$").expect("valid regex"));

static BOUND_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}(T[0-9]{2}:[0-9]{2}:[0-9]{2})?$").expect("valid regex")
});

/// Check a `+HHMM` / `-HHMM` offset string
pub fn validate_timezone(offset: &str) -> Result<()> {
    if TIMEZONE_OFFSET.is_match(offset) {
        Ok(())
    } else {
        Err(EpgError::InvalidTimezone(offset.to_string()))
    }
}

/// Parse a schedule bound: `YYYY-MM-DD` (midnight) or `YYYY-MM-DDTHH:MM:SS`
///
/// Years are exactly four digits.
pub fn parse_bound(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if !BOUND_FORMAT.is_match(value) {
        return Err(EpgError::InvalidDate(value.to_string()));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| EpgError::InvalidDate(value.to_string()))
}

/// Format a wall-clock time as XMLTV: "20240115120000 +0330"
pub fn format_xmltv_time(time: &NaiveDateTime, offset: &str) -> String {
    format!("{} {}", time.format(XMLTV_TIME_FORMAT), offset)
}

/// Parse an XMLTV timestamp back into wall-clock time and its offset
///
/// The offset is returned as written; no conversion to UTC happens.
pub fn parse_xmltv_time(value: &str) -> Option<(NaiveDateTime, String)> {
    let value = value.trim();
    let (datetime, offset) = match value.find(' ') {
        Some(space_pos) => {
            let (dt, tz) = value.split_at(space_pos);
            (dt, tz.trim())
        }
        None => (value, ""),
    };

    let time = NaiveDateTime::parse_from_str(datetime, XMLTV_TIME_FORMAT).ok()?;
    Some((time, offset.to_string()))
}
