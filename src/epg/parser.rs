//! XMLTV guide reader used to check generated output
//! Streaming parser - handles large guides without building a DOM
//! Supports both plain XML and gzip-compressed (.xml.gz) files

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::document::{ChannelEntry, LangText};
use super::parse_xmltv_time;
use crate::error::Result;

/// A programme as read back from a guide
#[derive(Debug, Clone, PartialEq)]
pub struct InspectedProgramme {
    pub channel_id: String,
    /// Raw `start` attribute
    pub start_raw: String,
    /// Raw `stop` attribute
    pub stop_raw: String,
    pub titles: Vec<LangText>,
}

impl InspectedProgramme {
    /// Title in the first language listed, the one duplicates are judged by
    pub fn primary_title(&self) -> Option<&str> {
        self.titles.first().map(|title| title.text.as_str())
    }

    fn times(&self) -> Option<((NaiveDateTime, String), (NaiveDateTime, String))> {
        Some((parse_xmltv_time(&self.start_raw)?, parse_xmltv_time(&self.stop_raw)?))
    }
}

/// Something wrong with a channel timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Programme references a channel with no `<channel>` entry
    UnknownChannel { channel: String },
    /// A start or stop attribute could not be parsed
    BadTimestamp { channel: String, index: usize },
    /// Stop is not after start
    EmptyProgramme { channel: String, index: usize },
    /// Programme does not start where the previous one stopped
    NotContiguous { channel: String, index: usize },
    /// Same title as the previous programme on the channel
    RepeatedTitle { channel: String, index: usize, title: String },
    /// Timestamp offset differs from the expected one
    OffsetMismatch { channel: String, index: usize, found: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnknownChannel { channel } => {
                write!(f, "programme for undeclared channel {channel:?}")
            }
            Violation::BadTimestamp { channel, index } => {
                write!(f, "{channel} #{index}: unparsable start/stop")
            }
            Violation::EmptyProgramme { channel, index } => {
                write!(f, "{channel} #{index}: stop is not after start")
            }
            Violation::NotContiguous { channel, index } => {
                write!(f, "{channel} #{index}: does not start when the previous programme stops")
            }
            Violation::RepeatedTitle { channel, index, title } => {
                write!(f, "{channel} #{index}: {title:?} airs twice in a row")
            }
            Violation::OffsetMismatch { channel, index, found } => {
                write!(f, "{channel} #{index}: unexpected timezone offset {found:?}")
            }
        }
    }
}

/// Everything read from a guide, in document order
#[derive(Debug, Clone, Default)]
pub struct GuideReport {
    pub channels: Vec<ChannelEntry>,
    pub programmes: Vec<InspectedProgramme>,
}

impl GuideReport {
    /// Total number of programmes
    pub fn program_count(&self) -> usize {
        self.programmes.len()
    }

    /// Programmes of one channel in document order
    pub fn programmes_for<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Iterator<Item = &'a InspectedProgramme> + 'a {
        self.programmes
            .iter()
            .filter(move |programme| programme.channel_id == channel_id)
    }

    /// Check every channel timeline
    ///
    /// With `expected_offset` set, every timestamp must carry that offset.
    pub fn violations(&self, expected_offset: Option<&str>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for programme in &self.programmes {
            let declared = self
                .channels
                .iter()
                .any(|channel| channel.id == programme.channel_id);
            if !declared
                && !violations.contains(&Violation::UnknownChannel {
                    channel: programme.channel_id.clone(),
                })
            {
                violations.push(Violation::UnknownChannel {
                    channel: programme.channel_id.clone(),
                });
            }
        }

        for channel in &self.channels {
            let mut previous: Option<(NaiveDateTime, Option<&str>)> = None;

            for (index, programme) in self.programmes_for(&channel.id).enumerate() {
                let Some(((start, start_offset), (stop, stop_offset))) = programme.times() else {
                    violations.push(Violation::BadTimestamp {
                        channel: channel.id.clone(),
                        index,
                    });
                    previous = None;
                    continue;
                };

                if let Some(expected) = expected_offset {
                    for found in [&start_offset, &stop_offset] {
                        if found != expected {
                            violations.push(Violation::OffsetMismatch {
                                channel: channel.id.clone(),
                                index,
                                found: found.clone(),
                            });
                            break;
                        }
                    }
                }

                if stop <= start {
                    violations.push(Violation::EmptyProgramme {
                        channel: channel.id.clone(),
                        index,
                    });
                }

                let title = programme.primary_title();
                if let Some((previous_stop, previous_title)) = previous {
                    if previous_stop != start {
                        violations.push(Violation::NotContiguous {
                            channel: channel.id.clone(),
                            index,
                        });
                    }
                    if title.is_some() && title == previous_title {
                        violations.push(Violation::RepeatedTitle {
                            channel: channel.id.clone(),
                            index,
                            title: title.unwrap_or_default().to_string(),
                        });
                    }
                }

                previous = Some((stop, title));
            }
        }

        violations
    }
}

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    Root,
    Channel,
    Programme,
    Title,
    DisplayName,
}

/// XMLTV reader - streaming, memory efficient
pub struct GuideInspector;

impl GuideInspector {
    /// Read a guide held in a string
    pub fn inspect_str(xml: &str) -> Result<GuideReport> {
        Self::inspect_reader(xml.as_bytes())
    }

    /// Read a guide from any buffered reader
    pub fn inspect_reader<R: BufRead>(reader: R) -> Result<GuideReport> {
        let mut xml_reader = Reader::from_reader(reader);

        let mut report = GuideReport::default();
        let mut buf = Vec::with_capacity(8192);

        let mut state = ParserState::Root;
        let mut current_channel: Option<ChannelEntry> = None;
        let mut current_programme: Option<InspectedProgramme> = None;
        let mut current_lang = String::new();
        let mut text_buf = String::new();

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"title" && state == ParserState::Programme {
                        if let Some(ref mut programme) = current_programme {
                            programme.titles.push(LangText {
                                lang: get_attribute(e, b"lang").unwrap_or_default(),
                                text: String::new(),
                            });
                        }
                    }
                }
                Event::Start(ref e) => match e.name().as_ref() {
                    b"channel" => {
                        state = ParserState::Channel;
                        let id = get_attribute(e, b"id").unwrap_or_default();
                        current_channel = Some(ChannelEntry::new(&id));
                    }
                    b"programme" => {
                        state = ParserState::Programme;
                        current_programme = Some(InspectedProgramme {
                            channel_id: get_attribute(e, b"channel").unwrap_or_default(),
                            start_raw: get_attribute(e, b"start").unwrap_or_default(),
                            stop_raw: get_attribute(e, b"stop").unwrap_or_default(),
                            titles: Vec::new(),
                        });
                    }
                    b"title" if state == ParserState::Programme => {
                        state = ParserState::Title;
                        current_lang = get_attribute(e, b"lang").unwrap_or_default();
                        text_buf.clear();
                    }
                    b"display-name" if state == ParserState::Channel => {
                        state = ParserState::DisplayName;
                        text_buf.clear();
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if matches!(state, ParserState::Title | ParserState::DisplayName) {
                        text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Event::GeneralRef(e) => {
                    if matches!(state, ParserState::Title | ParserState::DisplayName) {
                        let entity = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                        text_buf.push_str(&decode_xml_entities(&entity));
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"channel" => {
                        if let Some(channel) = current_channel.take() {
                            report.channels.push(channel);
                        }
                        state = ParserState::Root;
                    }
                    b"programme" => {
                        if let Some(programme) = current_programme.take() {
                            report.programmes.push(programme);
                        }
                        state = ParserState::Root;
                    }
                    b"title" if state == ParserState::Title => {
                        if let Some(ref mut programme) = current_programme {
                            programme.titles.push(LangText {
                                lang: std::mem::take(&mut current_lang),
                                text: text_buf.trim().to_string(),
                            });
                        }
                        state = ParserState::Programme;
                    }
                    b"display-name" if state == ParserState::DisplayName => {
                        if let Some(ref mut channel) = current_channel {
                            channel.display_names.push(text_buf.trim().to_string());
                        }
                        state = ParserState::Channel;
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(report)
    }

    /// Read a guide from disk - auto-detects gzip compression
    pub fn inspect_file(path: &Path) -> Result<GuideReport> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);

        // Gzip magic number (1f 8b)
        let is_gzip = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);

        if is_gzip {
            let decoder = GzDecoder::new(reader);
            Self::inspect_reader(BufReader::with_capacity(64 * 1024, decoder))
        } else {
            Self::inspect_reader(reader)
        }
    }
}

/// Decode XML entities back to normal characters
fn decode_xml_entities(s: &str) -> String {
    let mut result = s.to_string();

    // Decode named entities
    result = result.replace("&lt;", "<");
    result = result.replace("&gt;", ">");
    result = result.replace("&quot;", "\"");
    result = result.replace("&apos;", "'");

    // Decode numeric entities (decimal or hex)
    while let Some(start) = result.find("&#") {
        let Some(end) = result[start..].find(';') else {
            break;
        };
        let entity = result[start..start + end + 1].to_string();
        let num_str = &entity[2..entity.len() - 1];

        let decoded = if let Some(hex) = num_str.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()
        } else {
            num_str.parse::<u32>().ok()
        };

        match decoded.and_then(char::from_u32) {
            Some(c) => result = result.replace(&entity, &c.to_string()),
            None => break, // Malformed entity, stop processing
        }
    }

    // Last, so "&amp;lt;" stays "&lt;"
    result.replace("&amp;", "&")
}

/// Get attribute value from XML element
fn get_attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let raw = String::from_utf8(attr.value.as_ref().to_vec()).ok()?;
            return Some(decode_xml_entities(&raw));
        }
    }
    None
}
