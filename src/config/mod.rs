//! Site configuration, loaded once at startup

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PageError;

/// Site-wide settings shared by every render. `db_path` is the content
/// store root and `www_path` the static file root that the
/// filesystem-touching statements are confined to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub domain: String,

    #[serde(default = "default_url_base")]
    pub url_base: String,

    pub db_path: PathBuf,

    pub www_path: PathBuf,

    #[serde(default)]
    pub debug: bool,
}

fn default_url_base() -> String {
    "/cms".to_string()
}

impl SiteConfig {
    pub fn load(filename: &Path) -> Result<SiteConfig, PageError> {
        let content = std::fs::read_to_string(filename).map_err(|error| {
            PageError::internal(format!(
                "Failed to read configuration {}: {}",
                filename.display(),
                error
            ))
        })?;
        serde_json::from_str(&content).map_err(|error| {
            PageError::internal(format!(
                "Failed to parse configuration {}: {}",
                filename.display(),
                error
            ))
        })
    }
}

impl Default for SiteConfig {
    fn default() -> SiteConfig {
        SiteConfig {
            domain: "localhost".to_string(),
            url_base: default_url_base(),
            db_path: PathBuf::from("db"),
            www_path: PathBuf::from("www"),
            debug: false,
        }
    }
}
