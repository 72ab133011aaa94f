//! Error types for catalog loading, schedule building and guide output

use std::io;
use thiserror::Error;

/// Every failure the generator can surface to its caller
#[derive(Debug, Error)]
pub enum EpgError {
    /// A data line did not split into the expected number of fields
    #[error("malformed record on line {line}: expected 14 fields, found {found}")]
    MalformedRecord { line: usize, found: usize },

    /// A supported line has an empty title column
    #[error("missing title on line {line}")]
    MissingTitle { line: usize },

    /// The duration column is not a positive number of minutes
    #[error("invalid duration {value:?} on line {line}")]
    InvalidDuration { line: usize, value: String },

    #[error("language {0:?} is not supported")]
    UnsupportedLanguage(String),

    #[error("genre {0:?} is not supported")]
    UnsupportedGenre(String),

    /// A requested (language, genre) bucket holds no shows to draw from
    #[error("no {genre:?} shows available for language {language:?}")]
    EmptyBucket { language: String, genre: String },

    #[error("at least one output language is required")]
    NoLanguages,

    #[error("start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("invalid date {0:?}, expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate(String),

    #[error("invalid timezone offset {0:?}, expected +HHMM or -HHMM")]
    InvalidTimezone(String),

    /// Duplicate suppression kept rejecting draws for one slot
    #[error("channel {channel:?}: gave up after {attempts} redraws, every draw repeated {title:?}")]
    RedrawLimitExceeded {
        channel: String,
        title: String,
        attempts: usize,
    },

    /// A programme would end past the last representable date
    #[error("channel {channel:?}: programme stop time out of range")]
    TimeOverflow { channel: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, EpgError>;
