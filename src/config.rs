use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Weekday;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    /// Day the statistics week begins on, e.g. "sunday" or "mon".
    pub week_start: Option<String>,
}

/// `$HOME/.agency-time`, or `.` when HOME is unset.
pub fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".agency-time")
}

impl Config {
    /// Load config from `path`, or `~/.agency-time/config.toml` when `None`.
    /// Returns default config if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load_from(&home_dir().join("config.toml")),
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config
            .week_start()
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Configured week start; Sunday when unset.
    pub fn week_start(&self) -> Result<Weekday> {
        match self.stats.week_start.as_deref() {
            None => Ok(Weekday::Sun),
            Some(s) => s
                .trim()
                .parse::<Weekday>()
                .map_err(|_| anyhow::anyhow!("stats.week_start '{s}' is not a day of the week")),
        }
    }
}
