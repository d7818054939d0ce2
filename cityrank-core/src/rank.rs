//! Travel ranking over aggregated city summaries.
//!
//! Ranks are positional: each dimension is sorted once (stable, descending)
//! and a city's rank is its 1-based position in that order. Equal values do
//! NOT share a rank; the city that came first in the input wins the tie.
//! The combined rank is the position after sorting by
//! `(temp_rank, precipitation_rank)`, so temperature dominates and dry hours
//! only separate cities at the same temperature position, which never
//! happens because positions are unique. In practice the warmest city
//! (first in input order among equals) is always the single best city.

use std::cmp::Reverse;

use crate::model::{CityWeatherSummary, RankedCity};

/// Rank `summaries`, returning new records ordered by combined rank.
///
/// Empty input yields an empty ranking.
pub fn rank(summaries: &[CityWeatherSummary]) -> Vec<RankedCity> {
    let temp_ranks = positional_ranks(summaries, |s| s.avg_temp);
    let precipitation_ranks = positional_ranks(summaries, |s| s.no_precipitation_hours);

    let mut order: Vec<usize> = (0..summaries.len()).collect();
    order.sort_by_key(|&i| (temp_ranks[i], precipitation_ranks[i]));

    order
        .into_iter()
        .enumerate()
        .map(|(pos, i)| RankedCity {
            summary: summaries[i].clone(),
            temp_rank: temp_ranks[i],
            precipitation_rank: precipitation_ranks[i],
            rank: pos + 1,
        })
        .collect()
}

/// Every city whose combined rank is 1.
pub fn best_cities(ranked: &[RankedCity]) -> Vec<&RankedCity> {
    ranked.iter().filter(|r| r.rank == 1).collect()
}

fn positional_ranks<K, F>(summaries: &[CityWeatherSummary], key: F) -> Vec<usize>
where
    K: Ord,
    F: Fn(&CityWeatherSummary) -> K,
{
    let mut order: Vec<usize> = (0..summaries.len()).collect();
    // `sort_by_key` is stable: ties keep input order.
    order.sort_by_key(|&i| Reverse(key(&summaries[i])));

    let mut ranks = vec![0; summaries.len()];
    for (pos, i) in order.into_iter().enumerate() {
        ranks[i] = pos + 1;
    }
    ranks
}
