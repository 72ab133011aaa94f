//! Show catalog: the `language -> genre -> shows` index built from a data file
//!
//! Data lines look like
//! `language;genre;title;sub_title;description;rating;star_rating;episode_num;categories;icon;directors;actors;url;duration_minutes`.
//! Insertion order inside a bucket is kept, since bucket positions are what
//! tie the languages of one show together.

use rand::Rng;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{EpgError, Result};
use crate::models::{ShowFields, ShowRecord, SkippedRecord, Vocabulary, RAW_FIELD_COUNT};

/// A show picked for one programme slot, described in every requested language
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnShow {
    /// Position drawn before per-language reduction
    pub index: usize,
    pub duration_minutes: u32,
    /// Metadata per requested language, in request order
    pub metadata: Vec<(String, ShowFields)>,
}

impl DrawnShow {
    /// Title in the first requested language, used for duplicate detection
    pub fn primary_title(&self) -> &str {
        self.metadata
            .first()
            .map(|(_, fields)| fields.title.as_str())
            .unwrap_or_default()
    }

    pub fn fields_for(&self, language: &str) -> Option<&ShowFields> {
        self.metadata
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, fields)| fields)
    }
}

/// Read-only show index for one generation run
#[derive(Debug, Clone)]
pub struct ShowCatalog {
    vocabulary: Vocabulary,
    data: HashMap<String, HashMap<String, Vec<ShowRecord>>>,
    skipped: Vec<SkippedRecord>,
}

impl ShowCatalog {
    /// Load and index a data file
    ///
    /// A line with the wrong field count or a bad duration aborts the whole
    /// load. Lines for unsupported languages or genres are skipped.
    pub fn load(path: &Path, vocabulary: Vocabulary) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::parse(&content, vocabulary)?;
        info!(
            path = %path.display(),
            records = catalog.record_count(),
            skipped = catalog.skipped.len(),
            "loaded show catalog"
        );
        Ok(catalog)
    }

    /// Index data file content that is already in memory
    pub fn parse(content: &str, vocabulary: Vocabulary) -> Result<Self> {
        let mut data: HashMap<String, HashMap<String, Vec<ShowRecord>>> = HashMap::new();
        let mut skipped = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split(';').collect();
            if columns.len() != RAW_FIELD_COUNT {
                return Err(EpgError::MalformedRecord {
                    line: line_no,
                    found: columns.len(),
                });
            }

            let (language, genre) = (columns[0], columns[1]);
            if vocabulary.supports_language(language) && vocabulary.supports_genre(genre) {
                let record = ShowRecord::from_columns(&columns[2..], line_no)?;
                data.entry(language.to_string())
                    .or_default()
                    .entry(genre.to_string())
                    .or_default()
                    .push(record);
            } else {
                warn!(
                    line = line_no,
                    language, genre, "skipping line, unsupported language or genre"
                );
                skipped.push(SkippedRecord {
                    line: line_no,
                    language: language.to_string(),
                    genre: genre.to_string(),
                });
            }
        }

        Ok(Self {
            vocabulary,
            data,
            skipped,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Shows for one (language, genre) pair, in file order
    pub fn bucket(&self, language: &str, genre: &str) -> &[ShowRecord] {
        self.data
            .get(language)
            .and_then(|genres| genres.get(genre))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of indexed shows across all buckets
    pub fn record_count(&self) -> usize {
        self.data
            .values()
            .flat_map(|genres| genres.values())
            .map(Vec::len)
            .sum()
    }

    /// Lines dropped during load because of an unsupported language or genre
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Draw one show for `genre`, described in every language of `languages`
    ///
    /// A single index is drawn from `[0, longest bucket)` and reduced modulo
    /// each language's bucket length, so all languages describe the same
    /// catalog slot when buckets line up and never go out of range when they
    /// don't. The running time comes from the first language's record.
    pub fn draw_random_show<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        languages: &[String],
        genre: &str,
    ) -> Result<DrawnShow> {
        if languages.is_empty() {
            return Err(EpgError::NoLanguages);
        }
        for language in languages {
            self.vocabulary.check_language(language)?;
        }
        self.vocabulary.check_genre(genre)?;

        let mut max_len = 0;
        for language in languages {
            let len = self.bucket(language, genre).len();
            if len == 0 {
                return Err(EpgError::EmptyBucket {
                    language: language.clone(),
                    genre: genre.to_string(),
                });
            }
            max_len = max_len.max(len);
        }

        let index = rng.random_range(0..max_len);
        let mut duration_minutes = 0;
        let mut metadata = Vec::with_capacity(languages.len());

        for (position, language) in languages.iter().enumerate() {
            let bucket = self.bucket(language, genre);
            let record = &bucket[index % bucket.len()];
            if position == 0 {
                duration_minutes = record.duration_minutes;
            }
            metadata.push((language.clone(), record.fields.clone()));
        }

        debug!(genre, index, duration_minutes, "drew show");

        Ok(DrawnShow {
            index,
            duration_minutes,
            metadata,
        })
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
