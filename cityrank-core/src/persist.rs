use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{CityWeatherSummary, RankedCity};

pub const AGGREGATED_FILE: &str = "aggregated.json";
pub const RANKING_FILE: &str = "ranking.json";

/// Sink for pipeline results.
pub trait ResultWriter {
    fn write_aggregated(&self, summaries: &[CityWeatherSummary]) -> Result<PathBuf>;

    fn write_ranked(&self, ranked: &[RankedCity]) -> Result<PathBuf>;
}

/// Writes pretty-printed JSON files into one directory.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    dir: PathBuf,
}

impl JsonFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create output directory: {}", self.dir.display())
        })?;

        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {file}"))?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write results file: {}", path.display()))?;

        tracing::info!(path = %path.display(), "results written");
        Ok(path)
    }
}

impl ResultWriter for JsonFileWriter {
    fn write_aggregated(&self, summaries: &[CityWeatherSummary]) -> Result<PathBuf> {
        self.write(AGGREGATED_FILE, summaries)
    }

    fn write_ranked(&self, ranked: &[RankedCity]) -> Result<PathBuf> {
        self.write(RANKING_FILE, ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DailySummary;

    fn summary() -> CityWeatherSummary {
        CityWeatherSummary {
            city: "MOSCOW".into(),
            daily_data: vec![DailySummary {
                date: "2022-05-26".parse().expect("date"),
                avg_temp: 21,
                no_precipitation_hours: 2,
            }],
            avg_temp: 21,
            no_precipitation_hours: 2,
        }
    }

    #[test]
    fn writes_both_files_into_new_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let writer = JsonFileWriter::new(tmp.path().join("out"));
        let ranked = vec![RankedCity {
            summary: summary(),
            temp_rank: 1,
            precipitation_rank: 1,
            rank: 1,
        }];

        let agg_path = writer.write_aggregated(&[summary()]).expect("aggregated");
        let rank_path = writer.write_ranked(&ranked).expect("ranked");

        assert_eq!(agg_path, tmp.path().join("out").join(AGGREGATED_FILE));

        let agg: Vec<CityWeatherSummary> =
            serde_json::from_str(&fs::read_to_string(agg_path).expect("read")).expect("parse");
        assert_eq!(agg, vec![summary()]);

        let text = fs::read_to_string(rank_path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(value[0]["city"], "MOSCOW");
        assert_eq!(value[0]["rank"], 1);
        assert_eq!(value[0]["daily_data"][0]["date"], "2022-05-26");
    }

    #[test]
    fn empty_results_are_written_as_empty_arrays() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let writer = JsonFileWriter::new(tmp.path());

        let path = writer.write_ranked(&[]).expect("ranked");

        assert_eq!(fs::read_to_string(path).expect("read").trim(), "[]");
    }
}
