//! Aggregation engine
//!
//! Pure functions reducing canonical records (already filtered by a
//! repository) into the fixed catalogue of statistics:
//! - Overview KPIs ([`overview`])
//! - Breakdowns by category, sentiment, device, country, ... ([`breakdown`])
//! - Daily and hourly series ([`timeseries`])
//! - Question and outbound link rankings ([`questions`])
//! - Animation and easter-egg statistics ([`animation`])
//! - Token/cost usage and asset load telemetry ([`usage`])
//!
//! Both backing stores feed the same functions, so their numbers agree by
//! construction. Every ratio is `0.0` for empty input, and output ordering
//! is fully determined by the input values.

pub mod animation;
pub mod breakdown;
pub mod overview;
pub mod questions;
pub mod timeseries;
pub mod usage;

pub use animation::{animation_stats, AnimationCount, AnimationStats};
pub use breakdown::{
    browser_breakdown, category_breakdown, conversation_type_breakdown, country_breakdown,
    device_breakdown, engagement_breakdown, language_breakdown, resolution_breakdown,
    sentiment_breakdown, status_breakdown, BreakdownEntry, SentimentBreakdown,
};
pub use overview::{overview, OverviewMetrics};
pub use questions::{
    outbound_links, question_analytics, unanswered_questions, LinkCount, OutboundLinks,
    QuestionFrequency, QuestionStat,
};
pub use timeseries::{
    hourly_breakdown, sentiment_time_series, time_series, HourlyBucket, SentimentTimePoint,
    TimeSeriesPoint,
};
pub use usage::{asset_load_stats, usage_summary, AssetLoadStat, UsageSummary};

use std::collections::HashMap;

/// `100 * part / total`, or `0.0` when `total` is zero.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Mean of the values, or `0.0` when there are none.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Count occurrences of each value.
pub(crate) fn count_values<'a>(values: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Sort `(key, count)` pairs by count descending, then key ascending.
pub(crate) fn ranked<K: Ord>(counts: impl IntoIterator<Item = (K, usize)>) -> Vec<(K, usize)> {
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_handles_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert_eq!(mean(vec![1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_ranked_breaks_ties_on_key() {
        let counts = count_values(["b", "a", "c", "c"]);
        assert_eq!(ranked(counts), vec![("c", 2), ("a", 1), ("b", 1)]);
    }
}
