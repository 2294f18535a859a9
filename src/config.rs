//! Application configuration
//!
//! A [`Config`] is loaded once, when the process starts, and is then explicitly passed to whatever needs it.
//! Secrets (e.g. the API token) are not part of it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::course::Course;
use crate::error::{Error, Result};
use crate::provider::DEFAULT_HORIZON_DAYS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The base URL of the Canvas server (e.g. `https://canvas.example.edu`)
    pub api_url: Url,
    /// The monitored courses
    pub courses: Vec<Course>,
    /// Only tasks due within this amount of days are mirrored
    #[serde(default = "default_horizon_days")]
    pub due_date_horizon_days: i64,
    #[serde(default = "default_update_interval_minutes")]
    pub update_interval_minutes: f64,
    /// Whether fetched tasks and updates are printed to the console
    #[serde(default = "default_true")]
    pub console_print: bool,
    /// Whether course notes should be pinned
    #[serde(default)]
    pub pin_notes: bool,
    /// Where the checklists are stored
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

fn default_horizon_days() -> i64 { DEFAULT_HORIZON_DAYS }
fn default_update_interval_minutes() -> f64 { 30.0 }
fn default_true() -> bool { true }
fn default_cache_file() -> PathBuf { PathBuf::from("checklists.json") }

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| Error::ConfigRead { path: path.to_path_buf(), source })?;
        Self::parse(&content)
    }

    /// Parse and validate the content of a config file
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.courses.is_empty() {
            return Err(Error::ConfigValidation("no course to monitor".to_string()));
        }

        let mut ids = HashSet::new();
        for course in &self.courses {
            if ids.insert(course.id) == false {
                return Err(Error::ConfigValidation(format!("course {} is listed more than once", course.id)));
            }
            if course.nickname.trim().is_empty() {
                return Err(Error::ConfigValidation(format!("course {} has an empty nickname", course.id)));
            }
        }

        if self.due_date_horizon_days < 0 || chrono::Duration::try_days(self.due_date_horizon_days).is_none() {
            return Err(Error::ConfigValidation(format!("invalid due date horizon: {} days", self.due_date_horizon_days)));
        }
        let interval_is_valid = self.update_interval_minutes > 0.0
            && Duration::try_from_secs_f64(self.update_interval_minutes * 60.0).is_ok();
        if !interval_is_valid {
            return Err(Error::ConfigValidation(format!("invalid update interval: {} minutes", self.update_interval_minutes)));
        }
        Ok(())
    }

    /// The delay between two cycles. Out of range values (see [`Self::validate`]) mean "wait forever"
    pub fn update_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.update_interval_minutes * 60.0).unwrap_or(Duration::MAX)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "api_url": "https://canvas.example.edu",
        "courses": [
            { "id": 1234, "nickname": "Algorithms", "color": "teal" },
            { "id": 5678, "nickname": "Compilers" }
        ]
    }"#;

    #[test]
    fn defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.api_url.as_str(), "https://canvas.example.edu/");
        assert_eq!(config.courses.len(), 2);
        assert_eq!(config.courses[0].color, csscolorparser::parse("teal").unwrap());
        assert_eq!(config.due_date_horizon_days, 21);
        assert_eq!(config.update_interval(), Duration::from_secs(30 * 60));
        assert!(config.console_print);
        assert!(!config.pin_notes);
        assert_eq!(config.cache_file, PathBuf::from("checklists.json"));
    }

    #[test]
    fn out_of_range_interval_does_not_panic() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.update_interval_minutes = 1e300;
        assert!(config.validate().is_err());
        assert_eq!(config.update_interval(), Duration::MAX);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::parse(MINIMAL).unwrap());

        match Config::load(&dir.path().join("missing.json")) {
            Err(Error::ConfigRead { .. }) => {},
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn invalid_configs() {
        let invalid = [
            r#"{ "api_url": "https://canvas.example.edu", "courses": [] }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A" }, { "id": 1, "nickname": "B" }] }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": " " }] }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A" }], "update_interval_minutes": 0 }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A" }], "due_date_horizon_days": -1 }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A" }], "due_date_horizon_days": 1000000000000 }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A" }], "update_interval_minutes": 1e300 }"#,
        ];
        for content in &invalid {
            match Config::parse(content) {
                Err(Error::ConfigValidation(_)) => {},
                other => panic!("Unexpected result for {}: {:?}", content, other),
            }
        }

        let unparseable = [
            r#"{ "api_url": "not a url", "courses": [{ "id": 1, "nickname": "A" }] }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A", "color": "not a color" }] }"#,
            r#"{ "api_url": "https://canvas.example.edu", "courses": [{ "id": 1, "nickname": "A" }], "api_key": "secret" }"#,
        ];
        for content in &unparseable {
            match Config::parse(content) {
                Err(Error::ConfigParse(_)) => {},
                other => panic!("Unexpected result for {}: {:?}", content, other),
            }
        }
    }
}
