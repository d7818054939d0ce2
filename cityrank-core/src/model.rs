use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;

/// Weather condition label as reported by the forecast source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Overcast,
    Drizzle,
    LightRain,
    Rain,
    ModerateRain,
    HeavyRain,
    ContinuousHeavyRain,
    Showers,
    WetSnow,
    LightSnow,
    Snow,
    SnowShowers,
    Hail,
    Thunderstorm,
    ThunderstormWithRain,
    ThunderstormWithHail,
    #[serde(other)]
    Unknown,
}

/// One hourly entry of a daily forecast.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HourRecord {
    #[serde(deserialize_with = "hour_from_text_or_int")]
    pub hour: u8,
    #[serde(rename = "temp", alias = "temperature")]
    pub temperature: i64,
    #[serde(default)]
    pub condition: Option<Condition>,
}

fn hour_from_text_or_int<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HourValue {
        Int(u8),
        Text(String),
    }

    match HourValue::deserialize(deserializer)? {
        HourValue::Int(h) => Ok(h),
        HourValue::Text(s) => s
            .trim()
            .parse::<u8>()
            .map_err(|e| serde::de::Error::custom(format!("invalid hour '{s}': {e}"))),
    }
}

/// Forecast payload exactly as the source returned it.
///
/// Only checked to be a JSON object; the reducer is responsible for pulling
/// daily and hourly records out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastPayload(Map<String, Value>);

impl RawForecastPayload {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TryFrom<Value> for RawForecastPayload {
    type Error = FetchError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FetchError::NotAnObject(json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Business-window summary of a single forecast day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub avg_temp: i64,
    pub no_precipitation_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityWeatherSummary {
    pub city: String,
    pub daily_data: Vec<DailySummary>,
    /// Truncated mean over every qualifying hour of every day.
    pub avg_temp: i64,
    pub no_precipitation_hours: u32,
}

/// A summary together with its positional ranks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCity {
    #[serde(flatten)]
    pub summary: CityWeatherSummary,
    pub temp_rank: usize,
    pub precipitation_rank: usize,
    pub rank: usize,
}

impl RankedCity {
    pub fn city(&self) -> &str {
        &self.summary.city
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hour_accepts_text_and_integer() {
        let text: HourRecord =
            serde_json::from_value(json!({"hour": "10", "temp": 20, "condition": "clear"}))
                .expect("text hour");
        let int: HourRecord =
            serde_json::from_value(json!({"hour": 10, "temp": 20, "condition": "clear"}))
                .expect("int hour");

        assert_eq!(text, int);
        assert_eq!(text.hour, 10);
        assert_eq!(text.condition, Some(Condition::Clear));
    }

    #[test]
    fn unrecognised_condition_is_unknown() {
        let rec: HourRecord =
            serde_json::from_value(json!({"hour": "3", "temp": -2, "condition": "volcanic-ash"}))
                .expect("record");
        assert_eq!(rec.condition, Some(Condition::Unknown));
    }

    #[test]
    fn missing_condition_is_none() {
        let rec: HourRecord =
            serde_json::from_value(json!({"hour": "12", "temperature": 15})).expect("record");
        assert_eq!(rec.temperature, 15);
        assert_eq!(rec.condition, None);
    }

    #[test]
    fn payload_rejects_non_objects() {
        let err = RawForecastPayload::try_from(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, FetchError::NotAnObject("array")));

        let ok = RawForecastPayload::try_from(json!({"forecasts": []})).expect("object");
        assert!(ok.get("forecasts").is_some());
    }

    #[test]
    fn ranked_city_serializes_flat() {
        let ranked = RankedCity {
            summary: CityWeatherSummary {
                city: "PARIS".into(),
                daily_data: vec![],
                avg_temp: 25,
                no_precipitation_hours: 3,
            },
            temp_rank: 1,
            precipitation_rank: 1,
            rank: 1,
        };

        let value = serde_json::to_value(&ranked).expect("serialize");
        assert_eq!(value["city"], "PARIS");
        assert_eq!(value["rank"], 1);
        assert_eq!(value["avg_temp"], 25);
    }
}
