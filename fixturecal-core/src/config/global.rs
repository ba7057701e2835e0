//! Global fixturecal configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::config::schedule::{Schedule, ScheduleConfig};
use crate::error::{FixtureError, FixtureResult};

static DEFAULT_SCHEDULES_DIR: &str = "~/.config/fixturecal/schedules";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_schedules_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEDULES_DIR)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Global configuration at ~/.config/fixturecal/config.toml
///
/// Any key can be overridden with a `FIXTURECAL_`-prefixed environment
/// variable, e.g. `FIXTURECAL_TIME_ZONE=Australia/Sydney`.
#[derive(Debug, Deserialize, Clone)]
pub struct GlobalConfig {
    #[serde(default = "default_schedules_dir")]
    pub schedules_dir: PathBuf,

    /// Fallback zone for schedules that don't set their own
    pub time_zone: Option<String>,

    /// Timeout for fetching schedule pages
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            schedules_dir: default_schedules_dir(),
            time_zone: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GlobalConfig {
    pub fn config_dir() -> FixtureResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| FixtureError::Config("Could not determine config directory".into()))?
            .join("fixturecal"))
    }

    pub fn config_path() -> FixtureResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the global config, writing a commented default file on first run.
    pub fn load() -> FixtureResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let config: GlobalConfig = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("FIXTURECAL"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from an explicit file only, ignoring the environment.
    pub fn load_from(path: &Path) -> FixtureResult<Self> {
        let config: GlobalConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FixtureResult<()> {
        let contents = format!(
            "\
# fixturecal configuration

# Directory holding one .toml file per schedule:
# schedules_dir = \"{}\"

# Time zone for schedules that don't set one (defaults to the system zone):
# time_zone = \"Australia/Sydney\"

# Timeout in seconds when fetching schedule pages:
# request_timeout_secs = {}
",
            DEFAULT_SCHEDULES_DIR, DEFAULT_REQUEST_TIMEOUT_SECS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FixtureError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FixtureError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn schedules_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.schedules_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    /// The configured fallback zone, or the system zone if none is set.
    pub fn default_time_zone(&self) -> FixtureResult<Tz> {
        let name = match &self.time_zone {
            Some(name) => name.clone(),
            None => iana_time_zone::get_timezone()
                .map_err(|e| FixtureError::Config(format!("Could not detect system time zone: {e}")))?,
        };

        parse_time_zone(&name)
    }

    /// Load every schedule definition, sorted by file name.
    ///
    /// Finding none is an error: a run with nothing to do is a misconfiguration.
    pub fn load_schedules(&self) -> FixtureResult<Vec<Schedule>> {
        let dir = self.schedules_path();

        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Err(FixtureError::NoSchedules(dir));
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(FixtureError::NoSchedules(dir));
        }

        let fallback_zone = self.time_zone.as_deref();
        let mut schedules = Vec::with_capacity(paths.len());

        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let raw: ScheduleConfig = toml::from_str(&content).map_err(|e| {
                FixtureError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?;

            let zone = match (raw.time_zone.as_deref(), fallback_zone) {
                (Some(_), _) => None,
                (None, Some(name)) => Some(parse_time_zone(name)?),
                (None, None) => Some(self.default_time_zone()?),
            };

            schedules.push(raw.into_schedule(zone)?);
        }

        Ok(schedules)
    }
}

pub(crate) fn parse_time_zone(name: &str) -> FixtureResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| FixtureError::InvalidTimeZone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_schedule(dir: &Path, file: &str, body: &str) {
        std::fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_load_from_reads_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "schedules_dir = \"/srv/schedules\"\ntime_zone = \"Australia/Sydney\"\n",
        )
        .unwrap();

        let config = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(config.schedules_dir, PathBuf::from("/srv/schedules"));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.default_time_zone().unwrap(), chrono_tz::Australia::Sydney);
    }

    #[test]
    fn test_load_schedules_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_schedule(
            dir.path(),
            "b.toml",
            "name = \"Second\"\nurl = \"https://example.com/b\"\ncolor = \"basil\"\n",
        );
        write_schedule(
            dir.path(),
            "a.toml",
            "name = \"First\"\nurl = \"https://example.com/a\"\ncolor = \"tomato\"\n",
        );
        write_schedule(dir.path(), "notes.txt", "ignored");

        let config = GlobalConfig {
            schedules_dir: dir.path().to_path_buf(),
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        };

        let schedules = config.load_schedules().unwrap();
        let names: Vec<_> = schedules.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(schedules[0].time_zone, chrono_tz::UTC);
    }

    #[test]
    fn test_empty_schedules_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = GlobalConfig {
            schedules_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        assert!(matches!(
            config.load_schedules(),
            Err(FixtureError::NoSchedules(_))
        ));
    }

    #[test]
    fn test_missing_schedules_dir_is_an_error() {
        let config = GlobalConfig {
            schedules_dir: PathBuf::from("/nonexistent/fixturecal/schedules"),
            ..Default::default()
        };

        assert!(matches!(
            config.load_schedules(),
            Err(FixtureError::NoSchedules(_))
        ));
    }

    #[test]
    fn test_unknown_format_fails_loading() {
        let dir = tempfile::tempdir().unwrap();
        write_schedule(
            dir.path(),
            "a.toml",
            "name = \"X\"\nurl = \"https://example.com\"\nformat = \"pdf\"\ncolor = \"sage\"\ntime_zone = \"UTC\"\n",
        );
        let config = GlobalConfig {
            schedules_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        assert!(matches!(
            config.load_schedules(),
            Err(FixtureError::UnsupportedFormat(name)) if name == "pdf"
        ));
    }
}
