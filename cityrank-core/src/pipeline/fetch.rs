use std::sync::Arc;

use tokio::{
    sync::{Semaphore, mpsc},
    task::JoinSet,
};

use crate::{
    error::FetchError,
    model::RawForecastPayload,
    observer::PipelineObserver,
    source::{CityDirectory, ForecastSource},
};

use super::Fetched;

/// I/O-bound stage: one request per city, at most `max_workers` in flight.
#[derive(Debug, Clone)]
pub struct FetchStage {
    source: Arc<dyn ForecastSource>,
    directory: Arc<CityDirectory>,
    observer: Arc<dyn PipelineObserver>,
    max_workers: usize,
}

impl FetchStage {
    pub fn new(
        source: Arc<dyn ForecastSource>,
        directory: Arc<CityDirectory>,
        observer: Arc<dyn PipelineObserver>,
        max_workers: usize,
    ) -> Self {
        Self { source, directory, observer, max_workers }
    }

    /// Fetch every city and push successes onto `tx`.
    ///
    /// Consumes the sender; once every worker has finished all senders are
    /// gone and the receiving side observes the channel as closed.
    pub async fn run(&self, cities: Vec<String>, tx: mpsc::Sender<Fetched>) {
        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut workers = JoinSet::new();

        for city in cities {
            let permits = Arc::clone(&permits);
            let source = Arc::clone(&self.source);
            let directory = Arc::clone(&self.directory);
            let observer = Arc::clone(&self.observer);
            let tx = tx.clone();

            workers.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                match fetch_one(source.as_ref(), &directory, &city).await {
                    Ok(payload) => {
                        observer.city_fetched(&city);
                        if tx.send((city, payload)).await.is_err() {
                            tracing::warn!("handoff channel closed before all fetches finished");
                        }
                    }
                    Err(err) => observer.fetch_failed(&city, &err),
                }
            });
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(%err, "fetch worker aborted");
            }
        }
    }
}

async fn fetch_one(
    source: &dyn ForecastSource,
    directory: &CityDirectory,
    city: &str,
) -> Result<RawForecastPayload, FetchError> {
    let location = directory.resolve_location(city)?;
    tracing::debug!(city, %location, "requesting forecast");
    source.get_forecast(&location).await
}
