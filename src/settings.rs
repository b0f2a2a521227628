use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::parser::{Thresholds, FLOOR_THRESHOLD, LOW_RESULTS_THRESHOLD};

const ENV_PREFIX: &str = "SERP_EXPORT";
const DEFAULT_FILE: &str = "serp_export";
/// Keys read from the environment as comma-separated lists.
const LIST_KEYS: &[&str] = &["supported_pages"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub low_results_threshold: usize,
    pub floor_threshold: usize,
    /// Address substrings identifying a supported results page.
    pub supported_pages: Vec<String>,
    /// Output file name without extension.
    pub output_stem: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_results_threshold: LOW_RESULTS_THRESHOLD,
            floor_threshold: FLOOR_THRESHOLD,
            supported_pages: vec!["google.com/search".into(), "google.co.uk/search".into()],
            output_stem: "google_search_results".into(),
        }
    }
}

impl Settings {
    /// Defaults, then the settings file (`path`, or `serp_export.*` in the
    /// working directory when present), then `SERP_EXPORT_*` variables.
    /// List keys such as `SERP_EXPORT_SUPPORTED_PAGES` are comma-separated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };
        let mut settings: Self = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.supported_pages = settings
            .supported_pages
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Ok(settings)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            low_results: self.low_results_threshold,
            floor: self.floor_threshold,
        }
    }
}

fn environment() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}
