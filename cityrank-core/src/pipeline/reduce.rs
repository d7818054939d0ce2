use std::{collections::HashMap, fmt::Debug, num::NonZeroUsize, sync::Arc, thread};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinSet},
};

use crate::{
    error::{PipelineError, ReduceError},
    model::{CityWeatherSummary, RawForecastPayload},
    observer::PipelineObserver,
    reducer::ForecastReducer,
};

use super::Fetched;

type Reduced = (String, Result<CityWeatherSummary, ReduceError>);

/// Work run on the reduce pool for each fetched city.
pub trait ReduceJob: Send + Sync + Debug {
    fn run(
        &self,
        city: &str,
        payload: &RawForecastPayload,
    ) -> Result<CityWeatherSummary, ReduceError>;
}

impl ReduceJob for ForecastReducer {
    fn run(
        &self,
        city: &str,
        payload: &RawForecastPayload,
    ) -> Result<CityWeatherSummary, ReduceError> {
        self.reduce(city, payload)
    }
}

/// Number of reduce threads used when none is configured.
pub fn default_reduce_workers() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

/// CPU-bound stage: reductions run on a dedicated thread pool so they never
/// stall the async runtime driving the fetches.
#[derive(Debug)]
pub struct ReduceStage {
    pool: ThreadPool,
    job: Arc<dyn ReduceJob>,
    observer: Arc<dyn PipelineObserver>,
}

impl ReduceStage {
    pub fn new(
        job: Arc<dyn ReduceJob>,
        observer: Arc<dyn PipelineObserver>,
        max_workers: usize,
    ) -> Result<Self, PipelineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|i| format!("reduce-{i}"))
            .panic_handler(|_| tracing::error!("reduce worker panicked"))
            .build()?;

        Ok(Self { pool, job, observer })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Reduce items from `rx` until the channel closes, then wait for every
    /// submitted reduction and return the summaries keyed by city.
    pub async fn run(&self, mut rx: mpsc::Receiver<Fetched>) -> HashMap<String, CityWeatherSummary> {
        let mut pending: JoinSet<Reduced> = JoinSet::new();
        let mut summaries = HashMap::new();

        loop {
            tokio::select! {
                item = rx.recv() => match item {
                    Some((city, payload)) => {
                        let (done_tx, done_rx) = oneshot::channel();
                        let job = Arc::clone(&self.job);
                        let name = city.clone();

                        // A panic unwinds past `done_tx`, which the collector sees
                        // as `WorkerLost`.
                        self.pool.spawn(move || {
                            let _ = done_tx.send(job.run(&name, &payload));
                        });
                        pending.spawn(async move {
                            let result = done_rx.await.unwrap_or(Err(ReduceError::WorkerLost));
                            (city, result)
                        });
                    }
                    None => break,
                },
                Some(joined) = pending.join_next(), if !pending.is_empty() => {
                    self.collect(joined, &mut summaries);
                }
            }
        }

        while let Some(joined) = pending.join_next().await {
            self.collect(joined, &mut summaries);
        }

        summaries
    }

    fn collect(
        &self,
        joined: Result<Reduced, JoinError>,
        summaries: &mut HashMap<String, CityWeatherSummary>,
    ) {
        match joined {
            Ok((city, Ok(summary))) => {
                self.observer.city_reduced(&city);
                summaries.insert(city, summary);
            }
            Ok((city, Err(err))) => self.observer.reduce_failed(&city, &err),
            Err(err) => tracing::error!(%err, "reduce collector aborted"),
        }
    }
}
