use std::fmt::{self, Write};

use cityrank_core::{PipelineOutput, RankedCity};

/// Render the ranking as a plain-text table followed by the verdict.
pub fn render(output: &PipelineOutput) -> Result<String, fmt::Error> {
    let mut out = String::new();

    if output.ranked.is_empty() {
        out.push_str("No city could be ranked: no forecast was fetched and reduced successfully.\n");
        return Ok(out);
    }

    writeln!(
        out,
        "{:<4} {:<14} {:>8} {:>9} {:>9} {:>9}  {}",
        "Rank", "City", "Avg °C", "Dry hrs", "Temp pos", "Dry pos", "Days"
    )?;
    for r in &output.ranked {
        writeln!(
            out,
            "{:<4} {:<14} {:>8} {:>9} {:>9} {:>9}  {}",
            r.rank,
            r.city(),
            r.summary.avg_temp,
            r.summary.no_precipitation_hours,
            r.temp_rank,
            r.precipitation_rank,
            day_span(r),
        )?;
    }

    let best: Vec<&str> = output.best().into_iter().map(RankedCity::city).collect();
    let label = if best.len() == 1 { "Best city for travel" } else { "Best cities for travel" };
    writeln!(out, "\n{label}: {}", best.join(", "))?;

    Ok(out)
}

fn day_span(ranked: &RankedCity) -> String {
    let days = &ranked.summary.daily_data;
    match (days.first(), days.last()) {
        (Some(first), Some(last)) if first.date != last.date => format!(
            "{}..{} ({} days)",
            first.date.format("%d.%m"),
            last.date.format("%d.%m"),
            days.len()
        ),
        (Some(only), _) => format!("{} (1 day)", only.date.format("%d.%m")),
        _ => "-".to_string(),
    }
}
