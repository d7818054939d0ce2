//! Core library for the `cityrank` CLI.
//!
//! This crate defines:
//! - Typed forecast records and per-city summaries
//! - The forecast reducer (business-window averaging)
//! - The concurrent fetch/reduce pipeline, aggregation and ranking
//! - The forecast data source, configuration and result persistence
//!
//! It is used by `cityrank-cli`, but can also be driven directly by other binaries.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod observer;
pub mod persist;
pub mod pipeline;
pub mod rank;
pub mod reducer;
pub mod source;

pub use config::Config;
pub use error::{FetchError, PipelineError, ReduceError};
pub use model::{CityWeatherSummary, Condition, DailySummary, RankedCity, RawForecastPayload};
pub use observer::{PipelineObserver, TracingObserver};
pub use persist::{JsonFileWriter, ResultWriter};
pub use pipeline::{Pipeline, PipelineOutput, PipelineSettings};
pub use reducer::{BusinessWindow, DryConditions, ForecastReducer};
pub use source::{CityDirectory, ForecastSource, Location, YandexForecastApi};
