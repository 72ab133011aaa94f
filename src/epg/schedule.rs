//! Schedule builder: lays shows out as a contiguous timeline per channel

use chrono::{NaiveDateTime, TimeDelta};
use rand::Rng;
use tracing::{debug, info};

use super::document::{ChannelEntry, Guide, Programme};
use super::{parse_bound, validate_timezone, DEFAULT_TIMEZONE};
use crate::catalog::ShowCatalog;
use crate::error::{EpgError, Result};
use crate::models::ChannelSpec;

/// Tuning knobs for a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// How many times in a row a slot may redraw a repeat of the previous
    /// show before the build fails
    pub max_redraws: usize,
    /// Emit `<icon>` elements. Off by default, some set-top boxes choke on them.
    pub include_icons: bool,
    /// Value of the `generator-info-name` attribute
    pub generator_name: Option<String>,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            max_redraws: 64,
            include_icons: false,
            generator_name: Some(env!("CARGO_PKG_NAME").to_string()),
        }
    }
}

/// Builds a [`Guide`] for a set of channels over `[start, end)`
///
/// Randomness comes from the injected `rng`, so a seeded generator gives a
/// reproducible guide.
pub struct ScheduleBuilder<'a, R> {
    languages: Vec<String>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    channels: Vec<ChannelSpec>,
    catalog: &'a ShowCatalog,
    timezone: String,
    options: ScheduleOptions,
    rng: R,
}

impl<'a, R: Rng> ScheduleBuilder<'a, R> {
    /// Validate the request and prepare a builder
    ///
    /// `start_date`/`end_date` accept `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
    /// `timezone` defaults to `+0000`.
    pub fn new(
        languages: Vec<String>,
        start_date: &str,
        end_date: &str,
        channels: Vec<ChannelSpec>,
        catalog: &'a ShowCatalog,
        timezone: Option<&str>,
        rng: R,
    ) -> Result<Self> {
        let vocabulary = catalog.vocabulary();
        if languages.is_empty() {
            return Err(EpgError::NoLanguages);
        }
        for language in &languages {
            vocabulary.check_language(language)?;
        }

        let start = parse_bound(start_date)?;
        let end = parse_bound(end_date)?;
        if start > end {
            return Err(EpgError::InvalidRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        let timezone = timezone.unwrap_or(DEFAULT_TIMEZONE);
        validate_timezone(timezone)?;

        for channel in &channels {
            vocabulary.check_genre(&channel.genre)?;
        }

        Ok(Self {
            languages,
            start,
            end,
            channels,
            catalog,
            timezone: timezone.to_string(),
            options: ScheduleOptions::default(),
            rng,
        })
    }

    pub fn with_options(mut self, options: ScheduleOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the whole build: all channel entries, then each channel's timeline
    pub fn build(mut self) -> Result<Guide> {
        let mut guide = Guide::new(self.options.generator_name.clone());
        let channels = std::mem::take(&mut self.channels);

        for channel in &channels {
            guide.add_channel(channel_entry(channel));
        }

        for channel in &channels {
            let count = self.add_channel_programmes(&mut guide, channel)?;
            info!(
                channel = %channel.id,
                genre = %channel.genre,
                programmes = count,
                "scheduled channel"
            );
        }

        Ok(guide)
    }

    /// Fill `[start, end)` for one channel and return how many programmes were added
    ///
    /// Each accepted show starts where the previous one stopped. A draw whose
    /// first-language title repeats the previous programme is thrown away
    /// without moving the cursor. The last programme may run past `end`.
    fn add_channel_programmes(
        &mut self,
        guide: &mut Guide,
        channel: &ChannelSpec,
    ) -> Result<usize> {
        let mut cursor = self.start;
        let mut last_title: Option<String> = None;
        let mut redraws = 0;
        let mut count = 0;

        while cursor < self.end {
            let show = self
                .catalog
                .draw_random_show(&mut self.rng, &self.languages, &channel.genre)?;
            let title = show.primary_title();

            if last_title.as_deref() == Some(title) {
                redraws += 1;
                if redraws > self.options.max_redraws {
                    return Err(EpgError::RedrawLimitExceeded {
                        channel: channel.id.clone(),
                        title: title.to_string(),
                        attempts: redraws,
                    });
                }
                debug!(channel = %channel.id, title, "duplicate show, redrawing");
                continue;
            }

            redraws = 0;
            last_title = Some(title.to_string());

            let stop = programme_stop(cursor, show.duration_minutes, &channel.id)?;
            let mut programme = Programme::new(&channel.id, cursor, stop, &self.timezone);
            for (language, fields) in &show.metadata {
                programme.add_details(language, fields, self.options.include_icons);
            }
            debug!(
                channel = %channel.id,
                start = %programme.start_stamp(),
                stop = %programme.stop_stamp(),
                title,
                "added programme"
            );

            guide.add_programme(programme);
            cursor = stop;
            count += 1;
        }

        Ok(count)
    }
}

fn programme_stop(start: NaiveDateTime, minutes: u32, channel: &str) -> Result<NaiveDateTime> {
    start
        .checked_add_signed(TimeDelta::minutes(i64::from(minutes)))
        .ok_or_else(|| EpgError::TimeOverflow {
            channel: channel.to_string(),
        })
}

fn channel_entry(channel: &ChannelSpec) -> ChannelEntry {
    let mut entry = ChannelEntry::new(&channel.id);
    for name in &channel.display_names {
        entry.add_display_name(name);
    }
    entry
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
