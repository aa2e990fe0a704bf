use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::planner::ExclusionRange;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub client_secret_file: PathBuf,
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Pairs of `[first, last]` days to skip; shorter entries are ignored.
    #[serde(default)]
    pub ignore_dates: Vec<Vec<NaiveDate>>,
    #[serde(default = "default_true")]
    pub download_video: bool,
    #[serde(default = "default_true")]
    pub download_images: bool,
    #[serde(default = "default_destination_folder")]
    pub destination_folder: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_credentials_dir() -> PathBuf {
    PathBuf::from("credentials")
}

fn default_destination_folder() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conf_contents = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Config::parse(&conf_contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn exclusions(&self) -> Vec<ExclusionRange> {
        self.ignore_dates
            .iter()
            .filter_map(|bounds| ExclusionRange::from_bounds(bounds))
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
