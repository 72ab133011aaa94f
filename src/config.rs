//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::epg::{validate_timezone, ScheduleOptions, DEFAULT_TIMEZONE};
use crate::error::{EpgError, Result};
use crate::models::{ChannelSpec, Vocabulary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub vocabulary: Vocabulary,
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelSpec>,
    /// Output languages when none are given on the command line
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_max_redraws")]
    pub max_redraws: usize,
    #[serde(default = "default_generator_name")]
    pub generator_name: String,
}

fn default_channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec::new("News1", &["News One", "N1"], "news"),
        ChannelSpec::new("Sport1", &["Sport One", "S1"], "sport"),
        ChannelSpec::new("Kids1", &["Kids One", "K1"], "cartoon"),
        ChannelSpec::new("Channel2", &["Channel2", "Ch2"], "movie"),
        ChannelSpec::new("Docs1", &["Docs One", "D1"], "documentary"),
    ]
}
fn default_languages() -> Vec<String> { vec!["en".to_string()] }
fn default_timezone() -> String { DEFAULT_TIMEZONE.to_string() }
fn default_max_redraws() -> usize { ScheduleOptions::default().max_redraws }
fn default_generator_name() -> String { env!("CARGO_PKG_NAME").to_string() }

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            channels: default_channels(),
            languages: default_languages(),
            timezone: default_timezone(),
            max_redraws: default_max_redraws(),
            generator_name: default_generator_name(),
        }
    }
}

impl GeneratorConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("xmltv_synth");
        path.push("config.json");
        path
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing default file yields the defaults. An explicit path must
    /// exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                serde_json::from_str(&content)?
            }
            None => {
                let path = Self::default_path();
                if !path.exists() {
                    debug!(path = %path.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                match fs::read_to_string(&path).map(|content| serde_json::from_str(&content)) {
                    Ok(Ok(config)) => config,
                    _ => {
                        warn!(path = %path.display(), "ignoring unreadable config file");
                        return Ok(Self::default());
                    }
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check the config is internally consistent
    pub fn validate(&self) -> Result<()> {
        validate_timezone(&self.timezone)?;
        if self.languages.is_empty() {
            return Err(EpgError::NoLanguages);
        }
        for language in &self.languages {
            self.vocabulary.check_language(language)?;
        }
        for channel in &self.channels {
            if channel.id.is_empty() {
                return Err(EpgError::Config("channel with empty id".to_string()));
            }
            self.vocabulary.check_genre(&channel.genre)?;
        }
        let mut ids: Vec<&str> = self.channels.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(EpgError::Config(format!("duplicate channel id {:?}", pair[0])));
        }
        Ok(())
    }

    pub fn schedule_options(&self, include_icons: bool) -> ScheduleOptions {
        ScheduleOptions {
            max_redraws: self.max_redraws,
            include_icons,
            generator_name: Some(self.generator_name.clone()),
        }
    }
}
