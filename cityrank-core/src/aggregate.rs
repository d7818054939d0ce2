use std::collections::HashMap;

use crate::model::CityWeatherSummary;

/// Materialise the reduce stage's result set as a sequence ordered by city
/// name, so repeated runs over the same data rank identically.
pub fn aggregate(summaries: HashMap<String, CityWeatherSummary>) -> Vec<CityWeatherSummary> {
    let mut out: Vec<_> = summaries.into_values().collect();
    out.sort_by(|a, b| a.city.cmp(&b.city));
    out
}
