use std::collections::HashSet;
use std::fs;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Month;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{CatalogId, CatalogItem, Hemisphere, Locale};
use crate::error::GuideError;
use crate::store::FoundStore;

const BUNDLED: &[(&str, &str)] = &[
    ("bugs", include_str!("../data/bugs.csv")),
    ("fish", include_str!("../data/fish.csv")),
];

static MONTH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:\s*-\s*(\d{1,2}))?$").expect("month range pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    Bundled,
    Directory(Utf8PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    Json,
}

enum RecordFile {
    Bundled(&'static str),
    OnDisk(Utf8PathBuf, RecordFormat),
}

#[derive(Debug, Clone)]
pub struct CatalogLoader {
    source: RecordSource,
    locale: Locale,
    hemisphere: Hemisphere,
}

impl CatalogLoader {
    pub fn new(source: RecordSource) -> Self {
        Self {
            source,
            locale: Locale::default(),
            hemisphere: Hemisphere::default(),
        }
    }

    pub fn bundled() -> Self {
        Self::new(RecordSource::Bundled)
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_hemisphere(mut self, hemisphere: Hemisphere) -> Self {
        self.hemisphere = hemisphere;
        self
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    /// Every record in file order, or an error if any record is malformed.
    /// Never writes to `store`.
    pub fn load<S: FoundStore + ?Sized>(
        &self,
        catalog: &CatalogId,
        store: &S,
    ) -> Result<Vec<CatalogItem>, GuideError> {
        let items = match self.resolve(catalog)? {
            RecordFile::Bundled(content) => {
                debug!(catalog = %catalog, "reading bundled catalog");
                parse_csv(catalog, content.as_bytes(), store)?
            }
            RecordFile::OnDisk(path, format) => {
                debug!(catalog = %catalog, path = %path, "reading catalog file");
                let content = fs::read(path.as_std_path())
                    .map_err(|err| GuideError::parse(catalog.as_str(), format!("{path}: {err}")))?;
                match format {
                    RecordFormat::Csv => parse_csv(catalog, content.as_slice(), store)?,
                    RecordFormat::Json => parse_json(
                        catalog,
                        &content,
                        self.locale,
                        self.hemisphere,
                        store,
                    )?,
                }
            }
        };
        warn_duplicates(catalog, &items);
        Ok(items)
    }

    fn resolve(&self, catalog: &CatalogId) -> Result<RecordFile, GuideError> {
        if let RecordSource::Directory(dir) = &self.source {
            for (ext, format) in [("csv", RecordFormat::Csv), ("json", RecordFormat::Json)] {
                let path = record_path(dir, catalog, ext);
                if path.as_std_path().is_file() {
                    return Ok(RecordFile::OnDisk(path, format));
                }
            }
        }
        BUNDLED
            .iter()
            .find(|(name, _)| *name == catalog.as_str())
            .map(|(_, content)| RecordFile::Bundled(*content))
            .ok_or_else(|| GuideError::CatalogNotFound(catalog.to_string()))
    }
}

fn record_path(dir: &Utf8Path, catalog: &CatalogId, ext: &str) -> Utf8PathBuf {
    dir.join(format!("{catalog}.{ext}"))
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Seasonality")]
    seasonality: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Price")]
    price: String,
}

fn parse_csv<R: std::io::Read, S: FoundStore + ?Sized>(
    catalog: &CatalogId,
    reader: R,
    store: &S,
) -> Result<Vec<CatalogItem>, GuideError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut items = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row.map_err(|err| GuideError::parse(catalog.as_str(), format!("line {line}: {err}")))?;
        if row.name.is_empty() {
            return Err(GuideError::parse(
                catalog.as_str(),
                format!("line {line}: empty Name"),
            ));
        }
        let price = row.price.parse::<i64>().map_err(|_| {
            GuideError::parse(
                catalog.as_str(),
                format!("line {line}: Price {:?} is not a whole number", row.price),
            )
        })?;
        let found = store.is_found(&row.name);
        items.push(CatalogItem {
            name: row.name,
            seasonality: row.seasonality,
            location: row.location,
            time: row.time,
            price,
            found,
        });
    }
    Ok(items)
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    price: i64,
    availability: JsonAvailability,
    name: LocalizedName,
}

#[derive(Debug, Deserialize)]
struct JsonAvailability {
    #[serde(rename = "month-northern", default)]
    month_northern: String,
    #[serde(rename = "month-southern", default)]
    month_southern: String,
    #[serde(default)]
    time: String,
    #[serde(rename = "isAllDay")]
    is_all_day: bool,
    #[serde(rename = "isAllYear")]
    is_all_year: bool,
    location: String,
}

#[derive(Debug, Deserialize)]
struct LocalizedName {
    #[serde(rename = "name-en", default)]
    en: String,
    #[serde(rename = "name-de", default)]
    de: String,
    #[serde(rename = "name-fr", default)]
    fr: String,
    #[serde(rename = "name-it", default)]
    it: String,
    #[serde(rename = "name-jp", default)]
    jp: String,
    #[serde(rename = "name-kr", default)]
    kr: String,
    #[serde(rename = "name-cn", default)]
    cn: String,
    #[serde(rename = "name-nl", default)]
    nl: String,
    #[serde(rename = "name-ru", default)]
    ru: String,
}

impl LocalizedName {
    fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::De => &self.de,
            Locale::Fr => &self.fr,
            Locale::It => &self.it,
            Locale::Jp => &self.jp,
            Locale::Kr => &self.kr,
            Locale::Cn => &self.cn,
            Locale::Nl => &self.nl,
            Locale::Ru => &self.ru,
        }
    }
}

fn parse_json<S: FoundStore + ?Sized>(
    catalog: &CatalogId,
    content: &[u8],
    locale: Locale,
    hemisphere: Hemisphere,
    store: &S,
) -> Result<Vec<CatalogItem>, GuideError> {
    let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(content)
        .map_err(|err| GuideError::parse(catalog.as_str(), err.to_string()))?;

    let mut items = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let entry: JsonEntry = serde_json::from_value(value)
            .map_err(|err| GuideError::parse(catalog.as_str(), format!("{key}: {err}")))?;
        let name = entry.name.get(locale).trim().to_string();
        if name.is_empty() {
            return Err(GuideError::parse(
                catalog.as_str(),
                format!("{key}: no name for locale {locale}"),
            ));
        }

        let availability = entry.availability;
        let seasonality = if availability.is_all_year {
            "All year".to_string()
        } else {
            let months = match hemisphere {
                Hemisphere::Northern => &availability.month_northern,
                Hemisphere::Southern => &availability.month_southern,
            };
            month_ranges_text(months)
                .map_err(|message| GuideError::parse(catalog.as_str(), format!("{key}: {message}")))?
        };
        let time = if availability.is_all_day {
            "All day".to_string()
        } else {
            availability.time
        };

        let found = store.is_found(&name);
        items.push(CatalogItem {
            name,
            seasonality,
            location: availability.location,
            time,
            price: entry.price,
            found,
        });
    }
    Ok(items)
}

pub fn month_ranges_text(value: &str) -> Result<String, String> {
    let ranges = value
        .split('&')
        .map(|range| month_range_text(range.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ranges.join(", "))
}

fn month_range_text(range: &str) -> Result<String, String> {
    let captures = MONTH_RANGE
        .captures(range)
        .ok_or_else(|| format!("invalid month range {range:?}"))?;
    let first = month_name(&captures[1])?;
    match captures.get(2) {
        Some(last) => Ok(format!("{first} - {}", month_name(last.as_str())?)),
        None => Ok(first.to_string()),
    }
}

fn month_name(number: &str) -> Result<&'static str, String> {
    number
        .parse::<u8>()
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .map(|month| month.name())
        .ok_or_else(|| format!("invalid month {number:?}"))
}

fn warn_duplicates(catalog: &CatalogId, items: &[CatalogItem]) {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.name.as_str()) {
            warn!(catalog = %catalog, name = %item.name, "duplicate item name shares one found flag");
        }
    }
}
