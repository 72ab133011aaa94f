//! Data models shared by the catalog, the schedule builder and the config

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{EpgError, Result};

/// Number of `;`-separated fields on every data line
pub const RAW_FIELD_COUNT: usize = 14;

/// The languages and genres a run accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub languages: BTreeSet<String>,
    pub genres: BTreeSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            languages: ["en", "fa"].into_iter().map(String::from).collect(),
            genres: ["news", "sport", "cartoon", "movie", "documentary"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Vocabulary {
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.contains(language)
    }

    pub fn supports_genre(&self, genre: &str) -> bool {
        self.genres.contains(genre)
    }

    pub fn check_language(&self, language: &str) -> Result<()> {
        if self.supports_language(language) {
            Ok(())
        } else {
            Err(EpgError::UnsupportedLanguage(language.to_string()))
        }
    }

    pub fn check_genre(&self, genre: &str) -> Result<()> {
        if self.supports_genre(genre) {
            Ok(())
        } else {
            Err(EpgError::UnsupportedGenre(genre.to_string()))
        }
    }
}

/// Channel descriptor (persisted in the config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    pub display_names: Vec<String>,
    /// Genre driving every programme draw on this channel
    pub genre: String,
}

impl ChannelSpec {
    pub fn new(id: &str, display_names: &[&str], genre: &str) -> Self {
        Self {
            id: id.to_string(),
            display_names: display_names.iter().map(|s| s.to_string()).collect(),
            genre: genre.to_string(),
        }
    }
}

/// Metadata columns of one show, in data file order, duration excluded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShowFields {
    pub title: String,
    pub sub_title: String,
    pub description: String,
    pub rating: String,
    pub star_rating: String,
    /// Not rendered yet
    pub episode_num: String,
    /// Not rendered yet
    pub categories: String,
    pub icon: String,
    /// Comma separated
    pub directors: String,
    /// Comma separated
    pub actors: String,
    pub url: String,
}

/// One catalog entry: the metadata plus its running time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowRecord {
    pub fields: ShowFields,
    pub duration_minutes: u32,
}

impl ShowRecord {
    /// Build a record from the 12 columns following language and genre
    ///
    /// The title must be non-blank and the duration a positive number of
    /// minutes. `line` is only used for error reporting.
    pub fn from_columns(columns: &[&str], line: usize) -> Result<Self> {
        if columns.len() != RAW_FIELD_COUNT - 2 {
            return Err(EpgError::MalformedRecord {
                line,
                found: columns.len() + 2,
            });
        }

        let raw_duration = columns[11].trim();
        let duration_minutes = match raw_duration.parse::<u32>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                return Err(EpgError::InvalidDuration {
                    line,
                    value: raw_duration.to_string(),
                })
            }
        };

        if columns[0].trim().is_empty() {
            return Err(EpgError::MissingTitle { line });
        }

        let fields = ShowFields {
            title: columns[0].to_string(),
            sub_title: columns[1].to_string(),
            description: columns[2].to_string(),
            rating: columns[3].to_string(),
            star_rating: columns[4].to_string(),
            episode_num: columns[5].to_string(),
            categories: columns[6].to_string(),
            icon: columns[7].to_string(),
            directors: columns[8].to_string(),
            actors: columns[9].to_string(),
            url: columns[10].to_string(),
        };

        Ok(Self {
            fields,
            duration_minutes,
        })
    }
}

/// A data line dropped because its language or genre is unsupported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub line: usize,
    pub language: String,
    pub genre: String,
}

/// Split a comma separated credit list into trimmed, non-empty names
pub fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty())
}
