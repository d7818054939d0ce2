use std::fmt::Debug;

use crate::error::{FetchError, ReduceError};

/// Receives per-city pipeline events.
///
/// Injected into the pipeline so callers decide where events go; the
/// default sink is [`TracingObserver`].
pub trait PipelineObserver: Send + Sync + Debug {
    fn fetch_failed(&self, city: &str, error: &FetchError);

    fn reduce_failed(&self, city: &str, error: &ReduceError);

    fn city_fetched(&self, _city: &str) {}

    fn city_reduced(&self, _city: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn fetch_failed(&self, city: &str, error: &FetchError) {
        tracing::error!(city, %error, "failed to fetch forecast");
    }

    fn reduce_failed(&self, city: &str, error: &ReduceError) {
        tracing::error!(city, %error, "failed to reduce forecast");
    }

    fn city_fetched(&self, city: &str) {
        tracing::debug!(city, "forecast fetched");
    }

    fn city_reduced(&self, city: &str) {
        tracing::debug!(city, "forecast reduced");
    }
}
