use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized metadata for one work, as stored in the catalogue file.
///
/// Field names on disk follow the lookup service (`publishedDate`), so a cache
/// written by older tooling loads unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(
        rename = "publishedDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub published_date: Option<String>,
}

impl BibliographicRecord {
    pub fn year(&self) -> Year {
        Year::from_published_date(self.published_date.as_deref())
    }

    /// Authors in display order, joined with ", ".
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }
}

/// Publication year derived from `publishedDate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Year {
    Known(i32),
    /// First `-` segment of a date that is neither ISO-8601 nor numeric.
    Verbatim(String),
    Unknown,
}

impl Year {
    pub const PLACEHOLDER: &'static str = " ";

    pub fn from_published_date(published_date: Option<&str>) -> Self {
        let Some(raw) = published_date else {
            return Year::Unknown;
        };
        let raw = raw.trim();

        if let Some(year) = parse_iso_year(raw) {
            return Year::Known(year);
        }

        let head = raw.split('-').next().unwrap_or_default();
        match head.parse::<i32>() {
            Ok(year) => Year::Known(year),
            Err(_) => Year::Verbatim(head.to_string()),
        }
    }
}

fn parse_iso_year(raw: &str) -> Option<i32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.year());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Known(year) => write!(f, "{}", year),
            Year::Verbatim(text) => f.write_str(text),
            Year::Unknown => f.write_str(Self::PLACEHOLDER),
        }
    }
}

/// The three text fields printed on one card column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub author: String,
    pub title: String,
    pub year: String,
}

impl CardFields {
    pub fn from_record(record: &BibliographicRecord) -> Self {
        Self {
            author: record.author_line(),
            title: record.title.clone(),
            year: record.year().to_string(),
        }
    }

    /// `author-title-year`, lower-cased, spaces as underscores. Path
    /// separators are folded too so the slug is always one file name.
    /// Blank parts (an undated item's year) are left out.
    pub fn slug(&self) -> String {
        [&self.author, &self.title, &self.year]
            .iter()
            .map(|s| {
                s.trim()
                    .to_lowercase()
                    .replace(' ', "_")
                    .replace(['/', '\\'], "_")
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for CardFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.author, self.title, self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CardLayout {
    #[default]
    Single,
    TwoColumn,
}
