//! Daily and hourly series
//!
//! Days and hours come from the timestamp as the source encoded it, with no
//! timezone conversion: `2024-05-01T23:30:00+02:00` is day `2024-05-01`,
//! hour 23.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use super::breakdown::SentimentBreakdown;
use super::percentage;
use crate::types::{Session, SessionAnalysis};

/// Per-day session totals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub sessions: usize,
    pub messages: i64,
    pub tokens: i64,
    /// Cost in EUR
    pub cost: f64,
}

/// Per-day sentiment counts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentTimePoint {
    pub date: String,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

/// Session count for one hour of the day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBucket {
    /// 0 to 23
    pub hour: u32,
    pub count: usize,
    pub percentage: f64,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Sessions grouped by start date, ascending. Sessions without a start are
/// skipped.
pub fn time_series(sessions: &[Session]) -> Vec<TimeSeriesPoint> {
    let mut days: BTreeMap<NaiveDate, TimeSeriesPoint> = BTreeMap::new();
    for session in sessions {
        let Some(date) = session.start_date() else {
            continue;
        };
        let point = days.entry(date).or_insert_with(|| TimeSeriesPoint {
            date: format_date(date),
            sessions: 0,
            messages: 0,
            tokens: 0,
            cost: 0.0,
        });
        point.sessions += 1;
        point.messages += session.total_messages;
        point.tokens += session.total_tokens;
        point.cost += session.total_cost_eur;
    }
    days.into_values().collect()
}

/// Sentiment counts grouped by analysis creation date, ascending.
///
/// A day appears once any analysis was created on it, even when none of
/// that day's analyses carry a sentiment.
pub fn sentiment_time_series(analyses: &[SessionAnalysis]) -> Vec<SentimentTimePoint> {
    let mut days: BTreeMap<NaiveDate, SentimentBreakdown> = BTreeMap::new();
    for analysis in analyses {
        let Some(date) = analysis.created_date() else {
            continue;
        };
        let day = days.entry(date).or_default();
        if let Some(sentiment) = analysis.sentiment {
            day.add(sentiment);
        }
    }
    days.into_iter()
        .map(|(date, counts)| SentimentTimePoint {
            date: format_date(date),
            positive: counts.positive,
            neutral: counts.neutral,
            negative: counts.negative,
        })
        .collect()
}

/// Session starts per hour of day, always 24 buckets.
///
/// Percentages are relative to sessions with a known start.
pub fn hourly_breakdown(sessions: &[Session]) -> Vec<HourlyBucket> {
    let mut counts = [0usize; 24];
    for started_at in sessions.iter().filter_map(|s| s.started_at) {
        counts[started_at.hour() as usize] += 1;
    }
    let total: usize = counts.iter().sum();
    counts
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourlyBucket {
            hour: hour as u32,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}
