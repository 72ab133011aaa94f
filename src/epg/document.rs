//! XMLTV document model and writer
//!
//! The document is assembled in memory by the schedule builder and written
//! out in one pass with `quick-xml`.

use chrono::NaiveDateTime;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;
use std::io::{self, Write};

use super::format_xmltv_time;
use crate::error::{EpgError, Result};
use crate::models::{split_names, ShowFields};

/// Text tagged with the language it is written in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangText {
    pub lang: String,
    pub text: String,
}

impl LangText {
    fn new(lang: &str, text: &str) -> Self {
        Self {
            lang: lang.to_string(),
            text: text.to_string(),
        }
    }
}

/// A `<channel>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub id: String,
    pub display_names: Vec<String>,
}

impl ChannelEntry {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_names: Vec::new(),
        }
    }

    /// Add a display name unless the channel already has it
    pub fn add_display_name(&mut self, name: &str) -> bool {
        push_unique(&mut self.display_names, name)
    }
}

/// A `<programme>` entry with its metadata in every requested language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Programme {
    pub channel_id: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    /// Offset appended to both timestamps, e.g. "+0330"
    pub timezone: String,
    pub titles: Vec<LangText>,
    pub sub_titles: Vec<LangText>,
    pub descriptions: Vec<LangText>,
    pub directors: Vec<String>,
    pub actors: Vec<String>,
    pub urls: Vec<String>,
    pub icons: Vec<String>,
    /// Empty `<rating/>` placeholders
    pub ratings: usize,
    /// Empty `<star-rating/>` placeholders
    pub star_ratings: usize,
}

impl Programme {
    pub fn new(
        channel_id: &str,
        start: NaiveDateTime,
        stop: NaiveDateTime,
        timezone: &str,
    ) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            start,
            stop,
            timezone: timezone.to_string(),
            titles: Vec::new(),
            sub_titles: Vec::new(),
            descriptions: Vec::new(),
            directors: Vec::new(),
            actors: Vec::new(),
            urls: Vec::new(),
            icons: Vec::new(),
            ratings: 0,
            star_ratings: 0,
        }
    }

    pub fn start_stamp(&self) -> String {
        format_xmltv_time(&self.start, &self.timezone)
    }

    pub fn stop_stamp(&self) -> String {
        format_xmltv_time(&self.stop, &self.timezone)
    }

    /// Title in the given language, if one was added
    pub fn title(&self, language: &str) -> Option<&str> {
        self.titles
            .iter()
            .find(|title| title.lang == language)
            .map(|title| title.text.as_str())
    }

    /// Merge one language's metadata into this programme
    ///
    /// Credits, urls and icons are shared by all languages and are only added
    /// once per programme. Episode numbers and categories are not rendered.
    /// Icons are only kept when `include_icons` is set.
    pub fn add_details(&mut self, language: &str, fields: &ShowFields, include_icons: bool) {
        self.titles.push(LangText::new(language, &fields.title));

        if !fields.sub_title.is_empty() {
            self.sub_titles.push(LangText::new(language, &fields.sub_title));
        }
        if !fields.description.is_empty() {
            self.descriptions.push(LangText::new(language, &fields.description));
        }
        if !fields.rating.is_empty() {
            self.ratings += 1;
        }
        if !fields.star_rating.is_empty() {
            self.star_ratings += 1;
        }
        let icon = fields.icon.trim();
        if include_icons && !icon.is_empty() {
            push_unique(&mut self.icons, icon);
        }

        for director in split_names(&fields.directors) {
            push_unique(&mut self.directors, director);
        }
        for actor in split_names(&fields.actors) {
            push_unique(&mut self.actors, actor);
        }

        let url = fields.url.trim();
        if !url.is_empty() {
            push_unique(&mut self.urls, url);
        }
    }
}

/// The whole guide: every channel followed by every programme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guide {
    generator_name: Option<String>,
    channels: Vec<ChannelEntry>,
    programmes: Vec<Programme>,
}

impl Guide {
    pub fn new(generator_name: Option<String>) -> Self {
        Self {
            generator_name,
            ..Self::default()
        }
    }

    pub fn add_channel(&mut self, channel: ChannelEntry) {
        self.channels.push(channel);
    }

    pub fn add_programme(&mut self, programme: Programme) {
        self.programmes.push(programme);
    }

    pub fn channels(&self) -> &[ChannelEntry] {
        &self.channels
    }

    pub fn programmes(&self) -> &[Programme] {
        &self.programmes
    }

    /// Programmes of one channel in schedule order
    pub fn programmes_for<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Iterator<Item = &'a Programme> + 'a {
        self.programmes
            .iter()
            .filter(move |programme| programme.channel_id == channel_id)
    }

    /// Write the indented XMLTV document
    pub fn write_to<W: Write>(&self, inner: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut tv = BytesStart::new("tv");
        if let Some(name) = &self.generator_name {
            tv.push_attribute(("generator-info-name", name.as_str()));
        }
        writer.write_event(Event::Start(tv))?;

        for channel in &self.channels {
            write_channel(&mut writer, channel)?;
        }
        for programme in &self.programmes {
            write_programme(&mut writer, programme)?;
        }

        writer.write_event(Event::End(BytesEnd::new("tv")))?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }

    /// Render the indented XMLTV document into a string
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buf = Vec::with_capacity(64 * 1024);
        self.write_to(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| EpgError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

impl fmt::Display for Guide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.to_xml_string().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}

fn push_unique(items: &mut Vec<String>, value: &str) -> bool {
    if items.iter().any(|item| item == value) {
        return false;
    }
    items.push(value.to_string());
    true
}

fn write_channel<W: Write>(writer: &mut Writer<W>, channel: &ChannelEntry) -> Result<()> {
    let mut start = BytesStart::new("channel");
    start.push_attribute(("id", channel.id.as_str()));
    writer.write_event(Event::Start(start))?;

    for name in &channel.display_names {
        write_text_element(writer, "display-name", None, name)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    Ok(())
}

// Children follow the XMLTV DTD order.
fn write_programme<W: Write>(writer: &mut Writer<W>, programme: &Programme) -> Result<()> {
    let start_stamp = programme.start_stamp();
    let stop_stamp = programme.stop_stamp();

    let mut start = BytesStart::new("programme");
    start.push_attribute(("start", start_stamp.as_str()));
    start.push_attribute(("stop", stop_stamp.as_str()));
    start.push_attribute(("channel", programme.channel_id.as_str()));
    writer.write_event(Event::Start(start))?;

    for title in &programme.titles {
        write_text_element(writer, "title", Some(&title.lang), &title.text)?;
    }
    for sub_title in &programme.sub_titles {
        write_text_element(writer, "sub-title", Some(&sub_title.lang), &sub_title.text)?;
    }
    for desc in &programme.descriptions {
        write_text_element(writer, "desc", Some(&desc.lang), &desc.text)?;
    }

    if !programme.directors.is_empty() || !programme.actors.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("credits")))?;
        for director in &programme.directors {
            write_text_element(writer, "director", None, director)?;
        }
        for actor in &programme.actors {
            write_text_element(writer, "actor", None, actor)?;
        }
        writer.write_event(Event::End(BytesEnd::new("credits")))?;
    }

    for url in &programme.urls {
        write_text_element(writer, "url", None, url)?;
    }
    for icon in &programme.icons {
        let mut element = BytesStart::new("icon");
        element.push_attribute(("src", icon.as_str()));
        writer.write_event(Event::Empty(element))?;
    }
    for _ in 0..programme.ratings {
        writer.write_event(Event::Empty(BytesStart::new("rating")))?;
    }
    for _ in 0..programme.star_ratings {
        writer.write_event(Event::Empty(BytesStart::new("star-rating")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("programme")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    lang: Option<&str>,
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(tag);
    if let Some(lang) = lang {
        start.push_attribute(("lang", lang));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
