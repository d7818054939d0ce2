//! Forecast data source and city resolution.

use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{error::FetchError, model::RawForecastPayload};

/// Where the forecast for a city can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub url: String,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn get_forecast(&self, location: &Location) -> Result<RawForecastPayload, FetchError>;
}

const STOCK_BASE_URL: &str = "https://code.s3.yandex.net/async-module";

const STOCK_CITIES: &[(&str, &str)] = &[
    ("MOSCOW", "moscow"),
    ("PARIS", "paris"),
    ("LONDON", "london"),
    ("BERLIN", "berlin"),
    ("BEIJING", "beijing"),
    ("KAZAN", "kazan"),
    ("SPETERSBURG", "spetersburg"),
    ("VOLGOGRAD", "volgograd"),
    ("NOVOSIBIRSK", "novosibirsk"),
    ("KALININGRAD", "kaliningrad"),
    ("ABUDHABI", "abudhabi"),
    ("WARSZAWA", "warszawa"),
    ("BUCHAREST", "bucharest"),
    ("ROMA", "roma"),
    ("CAIRO", "cairo"),
];

/// Stock city name -> forecast URL table.
pub fn stock_cities() -> BTreeMap<String, String> {
    STOCK_CITIES
        .iter()
        .map(|(name, slug)| (name.to_string(), format!("{STOCK_BASE_URL}/{slug}-response.json")))
        .collect()
}

/// City name -> [`Location`] lookup.
#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    urls: BTreeMap<String, String>,
}

impl CityDirectory {
    pub fn new(urls: BTreeMap<String, String>) -> Self {
        Self { urls }
    }

    pub fn resolve_location(&self, city: &str) -> Result<Location, FetchError> {
        self.urls
            .get(city)
            .map(|url| Location { url: url.clone() })
            .ok_or_else(|| FetchError::UnknownCity(city.to_string()))
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }
}

/// HTTP source serving one JSON forecast document per city.
#[derive(Debug, Clone)]
pub struct YandexForecastApi {
    http: Client,
}

impl YandexForecastApi {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ForecastSource for YandexForecastApi {
    async fn get_forecast(&self, location: &Location) -> Result<RawForecastPayload, FetchError> {
        let res = self.http.get(&location.url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        RawForecastPayload::try_from(value)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
