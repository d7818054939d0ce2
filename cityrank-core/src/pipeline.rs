//! Fetch -> reduce -> aggregate -> rank.
//!
//! The fetch and reduce stages run concurrently, connected by a bounded
//! handoff channel. Aggregation and ranking start only once the reduce
//! stage has drained.

use std::{collections::HashSet, sync::Arc};

use tokio::sync::mpsc;

use crate::{
    aggregate::aggregate,
    error::PipelineError,
    model::{CityWeatherSummary, RankedCity, RawForecastPayload},
    observer::PipelineObserver,
    rank::{best_cities, rank},
    reducer::ForecastReducer,
    source::{CityDirectory, ForecastSource},
};

pub mod fetch;
pub mod reduce;

pub use fetch::FetchStage;
pub use reduce::{ReduceJob, ReduceStage, default_reduce_workers};

/// Item carried by the handoff channel.
pub type Fetched = (String, RawForecastPayload);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_fetch_workers: usize,
    /// `None` sizes the pool to the available CPU parallelism.
    pub max_reduce_workers: Option<usize>,
    pub channel_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { max_fetch_workers: 5, max_reduce_workers: None, channel_capacity: 16 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutput {
    pub aggregated: Vec<CityWeatherSummary>,
    pub ranked: Vec<RankedCity>,
}

impl PipelineOutput {
    pub fn best(&self) -> Vec<&RankedCity> {
        best_cities(&self.ranked)
    }
}

#[derive(Debug)]
pub struct Pipeline {
    fetch: FetchStage,
    reduce: ReduceStage,
    channel_capacity: usize,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ForecastSource>,
        directory: CityDirectory,
        reducer: ForecastReducer,
        observer: Arc<dyn PipelineObserver>,
        settings: PipelineSettings,
    ) -> Result<Self, PipelineError> {
        if settings.max_fetch_workers == 0 {
            return Err(PipelineError::Setting("max_fetch_workers must be positive".into()));
        }
        if settings.channel_capacity == 0 {
            return Err(PipelineError::Setting("channel_capacity must be positive".into()));
        }
        let reduce_workers = match settings.max_reduce_workers {
            Some(0) => {
                return Err(PipelineError::Setting("max_reduce_workers must be positive".into()));
            }
            Some(n) => n,
            None => default_reduce_workers(),
        };

        let fetch = FetchStage::new(
            source,
            Arc::new(directory),
            Arc::clone(&observer),
            settings.max_fetch_workers,
        );
        let reduce = ReduceStage::new(Arc::new(reducer), observer, reduce_workers)?;

        Ok(Self { fetch, reduce, channel_capacity: settings.channel_capacity })
    }

    /// Run all stages over `cities`.
    ///
    /// Per-city failures are reported to the observer and the city is left
    /// out; the output covers only the cities that made it through. Duplicate
    /// names are fetched once.
    pub async fn run<S: AsRef<str>>(&self, cities: &[S]) -> PipelineOutput {
        let mut seen = HashSet::new();
        let cities: Vec<String> = cities
            .iter()
            .map(|c| c.as_ref().to_string())
            .filter(|c| seen.insert(c.clone()))
            .collect();

        tracing::info!(
            cities = cities.len(),
            reduce_workers = self.reduce.workers(),
            "starting forecast pipeline"
        );

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let ((), summaries) = tokio::join!(self.fetch.run(cities, tx), self.reduce.run(rx));

        let aggregated = aggregate(summaries);
        let ranked = rank(&aggregated);

        tracing::info!(ranked = ranked.len(), "forecast pipeline finished");
        PipelineOutput { aggregated, ranked }
    }
}
