use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GuideError;

static CATALOG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("catalog name pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogId(String);

impl CatalogId {
    pub fn bugs() -> Self {
        Self("bugs".to_string())
    }

    pub fn fish() -> Self {
        Self("fish".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn title(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CatalogId {
    type Err = GuideError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        if !CATALOG_NAME.is_match(&normalized) {
            return Err(GuideError::InvalidCatalog(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    Price,
    #[value(name = "a-z", alias = "alphabetical")]
    #[serde(rename = "a-z")]
    AToZ,
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOption::Price => write!(f, "price"),
            SortOption::AToZ => write!(f, "a-z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub seasonality: String,
    pub location: String,
    pub time: String,
    pub price: i64,
    pub found: bool,
}

impl CatalogItem {
    pub fn availability(&self) -> String {
        format!("Available: {}, {}", self.time, self.seasonality)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    De,
    Fr,
    It,
    Jp,
    Kr,
    Cn,
    Nl,
    Ru,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Locale::En => "en",
            Locale::De => "de",
            Locale::Fr => "fr",
            Locale::It => "it",
            Locale::Jp => "jp",
            Locale::Kr => "kr",
            Locale::Cn => "cn",
            Locale::Nl => "nl",
            Locale::Ru => "ru",
        };
        write!(f, "{code}")
    }
}

impl FromStr for Locale {
    type Err = GuideError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let language = value
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match language.as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            "fr" => Ok(Locale::Fr),
            "it" => Ok(Locale::It),
            "jp" | "ja" => Ok(Locale::Jp),
            "kr" | "ko" => Ok(Locale::Kr),
            "cn" | "zh" => Ok(Locale::Cn),
            "nl" => Ok(Locale::Nl),
            "ru" => Ok(Locale::Ru),
            _ => Err(GuideError::InvalidLocale(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    #[default]
    Northern,
    Southern,
}

impl FromStr for Hemisphere {
    type Err = GuideError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "northern" | "north" | "n" => Ok(Hemisphere::Northern),
            "southern" | "south" | "s" => Ok(Hemisphere::Southern),
            _ => Err(GuideError::InvalidHemisphere(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn catalog_id_normalizes_case() {
        let id: CatalogId = " Bugs ".parse().unwrap();
        assert_eq!(id, CatalogId::bugs());
        assert_eq!(id.title(), "Bugs");
    }

    #[test]
    fn catalog_id_rejects_paths() {
        let err = "../fish".parse::<CatalogId>().unwrap_err();
        assert_matches!(err, GuideError::InvalidCatalog(_));
    }

    #[test]
    fn locale_accepts_region_suffix() {
        assert_eq!("en_US".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("ja-JP".parse::<Locale>().unwrap(), Locale::Jp);
        assert_matches!("xx".parse::<Locale>(), Err(GuideError::InvalidLocale(_)));
    }
}
