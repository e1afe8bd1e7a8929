// ------------- Settings -------------
// Layered configuration: built-in defaults, then an optional TOML file, then
// LBMS_ prefixed environment variables (LBMS_HOURS__OPEN_HOUR=8 and so on).

use std::path::PathBuf;

// config lets you read a separate config file
use config::{Config, Environment, File};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::Result;
use crate::ledger::Policy;
use crate::state::Hours;

pub const DEFAULT_CONFIG: &str = "lbms";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Where the simulated clock starts; the epoch date at opening hour otherwise.
    pub start: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// JSON array of book records the store sells.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OperatorSettings {
    pub username: String,
    pub password: String,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hours: Hours,
    pub policy: Policy,
    pub clock: ClockSettings,
    pub store: StoreSettings,
    pub operator: OperatorSettings,
}

impl Settings {
    /// Reads `path` (or `lbms.toml` when absent, which may then be missing) and
    /// the environment on top of the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("LBMS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
    pub fn start_time(&self) -> NaiveDateTime {
        self.clock.start.unwrap_or_else(|| {
            NaiveDate::default()
                .and_hms_opt(self.hours.open_hour, 0, 0)
                .unwrap_or_default()
        })
    }
}
