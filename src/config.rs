use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogLoader, RecordSource};
use crate::domain::{Hemisphere, Locale};
use crate::error::GuideError;
use crate::store::FileStore;

pub const DEFAULT_CONFIG_FILE: &str = "critter-guide.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub preferences: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub hemisphere: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_dir: Option<Utf8PathBuf>,
    pub preferences_path: Utf8PathBuf,
    pub locale: Locale,
    pub hemisphere: Hemisphere,
}

impl ResolvedConfig {
    pub fn loader(&self) -> CatalogLoader {
        let source = match &self.data_dir {
            Some(dir) => RecordSource::Directory(dir.clone()),
            None => RecordSource::Bundled,
        };
        CatalogLoader::new(source)
            .with_locale(self.locale)
            .with_hemisphere(self.hemisphere)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, GuideError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| GuideError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| GuideError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, GuideError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let locale = config
            .locale
            .as_deref()
            .map(str::parse::<Locale>)
            .transpose()?
            .unwrap_or_default();
        let hemisphere = config
            .hemisphere
            .as_deref()
            .map(str::parse::<Hemisphere>)
            .transpose()?
            .unwrap_or_default();
        let preferences_path = match config.preferences {
            Some(path) => Utf8PathBuf::from(path),
            None => FileStore::default_path()?,
        };

        Ok(ResolvedConfig {
            schema_version,
            data_dir: config.data_dir.map(Utf8PathBuf::from),
            preferences_path,
            locale,
            hemisphere,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_overrides() {
        let config = Config {
            schema_version: None,
            data_dir: Some("catalogs".to_string()),
            preferences: Some("found.json".to_string()),
            locale: Some("de-DE".to_string()),
            hemisphere: Some("southern".to_string()),
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.data_dir, Some(Utf8PathBuf::from("catalogs")));
        assert_eq!(resolved.preferences_path, Utf8PathBuf::from("found.json"));
        assert_eq!(resolved.locale, Locale::De);
        assert_eq!(resolved.hemisphere, Hemisphere::Southern);
    }
}
