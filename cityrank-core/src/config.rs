use anyhow::{Context, Result, anyhow, bail, ensure};
use directories::ProjectDirs;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, IntoDeserializer},
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    model::Condition,
    pipeline::PipelineSettings,
    reducer::{BusinessWindow, DryConditions, ForecastReducer},
    source::{CityDirectory, stock_cities},
};

/// Top-level configuration stored on disk.
///
/// Every field has a default, so a partial file (or none at all) is valid.
/// Tables are kept last so the struct serializes to TOML cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on forecast requests in flight at once.
    pub max_fetch_workers: usize,

    /// Reduce pool size; defaults to the available CPU parallelism.
    pub max_reduce_workers: Option<usize>,

    /// Capacity of the fetch -> reduce handoff channel.
    pub channel_capacity: usize,

    pub request_timeout_secs: u64,

    /// Where `aggregated.json` and `ranking.json` are written.
    pub output_dir: Option<PathBuf>,

    /// Conditions counted as hours without precipitation.
    #[serde(deserialize_with = "known_conditions")]
    pub dry_conditions: Vec<Condition>,

    /// Example TOML:
    /// [business_hours]
    /// start = 9
    /// end = 19
    pub business_hours: BusinessWindow,

    /// Example TOML:
    /// [cities]
    /// MOSCOW = "https://code.s3.yandex.net/async-module/moscow-response.json"
    pub cities: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let settings = PipelineSettings::default();
        Self {
            max_fetch_workers: settings.max_fetch_workers,
            max_reduce_workers: settings.max_reduce_workers,
            channel_capacity: settings.channel_capacity,
            request_timeout_secs: 10,
            output_dir: None,
            dry_conditions: vec![
                Condition::Clear,
                Condition::PartlyCloudy,
                Condition::Cloudy,
                Condition::Overcast,
            ],
            business_hours: BusinessWindow::default(),
            cities: stock_cities(),
        }
    }
}

impl Config {
    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "cityrank", "cityrank")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Configured output directory, or the platform data directory.
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("results")),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_fetch_workers > 0, "max_fetch_workers must be at least 1");
        ensure!(
            self.max_reduce_workers != Some(0),
            "max_reduce_workers must be at least 1 when set"
        );
        ensure!(self.channel_capacity > 0, "channel_capacity must be at least 1");
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be at least 1");

        // `Unknown` would match every unrecognised forecast condition.
        if let Some(pos) = self.dry_conditions.iter().position(|c| *c == Condition::Unknown) {
            bail!(
                "dry_conditions entry #{} is not a recognised condition label.\n\
                 Hint: use kebab-case names such as \"clear\" or \"partly-cloudy\".",
                pos + 1
            );
        }

        let BusinessWindow { start, end } = self.business_hours;
        ensure!(
            start <= end && end <= 23,
            "business_hours must satisfy start <= end <= 23 (got {start}..={end})"
        );

        ensure!(
            !self.cities.is_empty(),
            "No cities configured.\n\
             Hint: add entries under [cities] in {}",
            Self::config_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "the config file".to_string())
        );

        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_fetch_workers: self.max_fetch_workers,
            max_reduce_workers: self.max_reduce_workers,
            channel_capacity: self.channel_capacity,
        }
    }

    pub fn reducer(&self) -> ForecastReducer {
        ForecastReducer::new(
            self.business_hours,
            DryConditions::new(self.dry_conditions.iter().copied()),
        )
    }

    pub fn directory(&self) -> CityDirectory {
        CityDirectory::new(self.cities.clone())
    }

    pub fn city_names(&self) -> Vec<String> {
        self.cities.keys().cloned().collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Like `Vec<Condition>`, but a label that is not a known condition is an
/// error instead of `Condition::Unknown`.
fn known_conditions<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer)?
        .into_iter()
        .map(|label| {
            let parsed: Result<Condition, de::value::Error> =
                Condition::deserialize(label.as_str().into_deserializer());
            match parsed {
                Ok(condition) if condition != Condition::Unknown => Ok(condition),
                _ => Err(de::Error::custom(format!(
                    "unrecognised dry condition '{label}' (expected kebab-case, e.g. \"partly-cloudy\")"
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();

        cfg.validate().expect("defaults must validate");
        assert_eq!(cfg.max_fetch_workers, 5);
        assert_eq!(cfg.business_hours, BusinessWindow { start: 9, end: 19 });
        assert_eq!(cfg.cities.len(), 15);
        assert!(cfg.cities.contains_key("MOSCOW"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&tmp.path().join("absent.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.max_fetch_workers = 8;
        cfg.max_reduce_workers = Some(2);
        cfg.output_dir = Some(PathBuf::from("/tmp/cityrank"));

        cfg.save_to(&path).expect("save");
        let loaded = Config::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
max_fetch_workers = 2
dry_conditions = ["clear"]

[cities]
PARIS = "https://example.test/paris.json"
"#,
        )
        .expect("write");

        let cfg = Config::load_from(&path).expect("load");

        assert_eq!(cfg.max_fetch_workers, 2);
        assert_eq!(cfg.channel_capacity, 16);
        assert_eq!(cfg.dry_conditions, vec![Condition::Clear]);
        assert_eq!(cfg.city_names(), vec!["PARIS".to_string()]);
        assert_eq!(
            cfg.directory().resolve_location("PARIS").expect("paris").url,
            "https://example.test/paris.json"
        );
    }

    #[test]
    fn invalid_toml_reports_path() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "max_fetch_workers = \"many\"").expect("write");

        let err = Config::load_from(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = Config { max_fetch_workers: 0, ..Config::default() };
        assert!(cfg.validate().unwrap_err().to_string().contains("max_fetch_workers"));

        let cfg = Config { max_reduce_workers: Some(0), ..Config::default() };
        assert!(cfg.validate().unwrap_err().to_string().contains("max_reduce_workers"));

        let cfg = Config {
            business_hours: BusinessWindow { start: 20, end: 9 },
            ..Config::default()
        };
        assert!(cfg.validate().unwrap_err().to_string().contains("business_hours"));

        let cfg = Config { cities: BTreeMap::new(), ..Config::default() };
        assert!(cfg.validate().unwrap_err().to_string().contains("No cities configured"));
    }

    #[test]
    fn misspelled_dry_condition_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(&path, r#"dry_conditions = ["clear", "partly_cloudy"]"#).expect("write");

        let err = Config::load_from(&path).unwrap_err();

        let msg = format!("{err:#}");
        assert!(msg.contains("unrecognised dry condition 'partly_cloudy'"), "got: {msg}");
    }

    #[test]
    fn unknown_dry_condition_fails_validation() {
        let cfg = Config {
            dry_conditions: vec![Condition::Clear, Condition::Unknown],
            ..Config::default()
        };

        let msg = cfg.validate().unwrap_err().to_string();

        assert!(msg.contains("dry_conditions entry #2"), "got: {msg}");
    }

    #[test]
    fn explicit_output_dir_wins() {
        let cfg = Config { output_dir: Some(PathBuf::from("out")), ..Config::default() };
        assert_eq!(cfg.output_dir().expect("dir"), PathBuf::from("out"));
    }
}
