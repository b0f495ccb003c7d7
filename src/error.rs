use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GuideError {
    #[error("invalid catalog name: {0}")]
    InvalidCatalog(String),

    #[error("catalog not found: {0}")]
    CatalogNotFound(String),

    #[error("failed to parse catalog {catalog}: {message}")]
    #[diagnostic(help("check the header row and that every Price is a whole number"))]
    Parse { catalog: String, message: String },

    #[error("preference store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("timed out waiting for catalog {0}")]
    LoadTimeout(String),

    #[error("no item named {name} in catalog {catalog}")]
    ItemNotFound { catalog: String, name: String },

    #[error("unsupported locale: {0}")]
    InvalidLocale(String),

    #[error("invalid hemisphere: {0}")]
    InvalidHemisphere(String),
}

impl GuideError {
    pub(crate) fn parse(catalog: impl Into<String>, message: impl Into<String>) -> Self {
        GuideError::Parse {
            catalog: catalog.into(),
            message: message.into(),
        }
    }
}
