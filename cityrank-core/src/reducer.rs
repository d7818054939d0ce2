//! Reduction of one city's raw forecast into a [`CityWeatherSummary`].

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ReduceError,
    model::{CityWeatherSummary, Condition, DailySummary, HourRecord, RawForecastPayload},
};

/// Inclusive range of hours that count toward a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessWindow {
    pub start: u8,
    pub end: u8,
}

impl BusinessWindow {
    pub fn contains(&self, hour: u8) -> bool {
        self.start <= hour && hour <= self.end
    }
}

impl Default for BusinessWindow {
    fn default() -> Self {
        Self { start: 9, end: 19 }
    }
}

/// Conditions counted as an hour without precipitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryConditions(HashSet<Condition>);

impl DryConditions {
    pub fn new(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self(conditions.into_iter().collect())
    }

    pub fn is_dry(&self, condition: Option<Condition>) -> bool {
        condition.is_some_and(|c| self.0.contains(&c))
    }
}

impl Default for DryConditions {
    fn default() -> Self {
        Self::new([
            Condition::Clear,
            Condition::PartlyCloudy,
            Condition::Cloudy,
            Condition::Overcast,
        ])
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    // Wide enough that no count of i64 temperatures a payload can hold overflows.
    temp_sum: i128,
    hours: i64,
    dry_hours: u32,
}

impl Tally {
    fn avg_temp(&self) -> i64 {
        // Integer division truncates toward zero.
        // The mean of i64 values always fits back into i64.
        if self.hours == 0 { 0 } else { (self.temp_sum / i128::from(self.hours)) as i64 }
    }
}

/// Pure reducer; holds only read-only settings so it can be shared freely
/// between worker threads.
#[derive(Debug, Clone, Default)]
pub struct ForecastReducer {
    window: BusinessWindow,
    dry: DryConditions,
}

impl ForecastReducer {
    pub fn new(window: BusinessWindow, dry: DryConditions) -> Self {
        Self { window, dry }
    }

    pub fn reduce(
        &self,
        city: &str,
        payload: &RawForecastPayload,
    ) -> Result<CityWeatherSummary, ReduceError> {
        let forecasts = payload
            .get("forecasts")
            .ok_or(ReduceError::MissingForecasts)?
            .as_array()
            .ok_or(ReduceError::ForecastsNotArray)?;

        let mut total = Tally::default();
        let mut daily_data = Vec::new();

        for day in forecasts {
            let Some((date, hours)) = parse_day(day) else {
                continue;
            };

            let tally = self.tally_day(hours);
            if tally.hours == 0 {
                continue;
            }

            daily_data.push(DailySummary {
                date,
                avg_temp: tally.avg_temp(),
                no_precipitation_hours: tally.dry_hours,
            });

            total.temp_sum += tally.temp_sum;
            total.hours += tally.hours;
            total.dry_hours += tally.dry_hours;
        }

        Ok(CityWeatherSummary {
            city: city.to_string(),
            daily_data,
            avg_temp: total.avg_temp(),
            no_precipitation_hours: total.dry_hours,
        })
    }

    fn tally_day(&self, hours: &[Value]) -> Tally {
        let mut tally = Tally::default();

        for raw in hours {
            let Ok(record) = HourRecord::deserialize(raw) else {
                continue;
            };
            if !self.window.contains(record.hour) {
                continue;
            }

            tally.temp_sum += i128::from(record.temperature);
            tally.hours += 1;
            if self.dry.is_dry(record.condition) {
                tally.dry_hours += 1;
            }
        }

        tally
    }
}

fn parse_day(day: &Value) -> Option<(NaiveDate, &[Value])> {
    let date = day.get("date")?.as_str()?.parse::<NaiveDate>().ok()?;
    let hours = day.get("hours")?.as_array()?;
    Some((date, hours.as_slice()))
}
