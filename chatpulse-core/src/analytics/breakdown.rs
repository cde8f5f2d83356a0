//! Grouped count + percentage aggregates
//!
//! Two families:
//! - Open-ended fields (category, language, country, device, browser) bucket
//!   missing values as `"Unknown"` and rank buckets by count.
//! - Enumerated fields (status, resolution, engagement, conversation type)
//!   always emit one bucket per value, in declaration order. Missing values
//!   are excluded, so they affect neither counts nor the denominator.

use serde::Serialize;

use super::{count_values, percentage, ranked};
use crate::types::{
    ConversationType, EngagementLevel, ResolutionStatus, Sentiment, Session, SessionAnalysis,
    SessionStatus, UNKNOWN,
};

/// One bucket of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub key: String,
    pub count: usize,
    pub percentage: f64,
}

/// Sentiment counts, not normalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentBreakdown {
    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

pub fn sentiment_breakdown(analyses: &[SessionAnalysis]) -> SentimentBreakdown {
    let mut breakdown = SentimentBreakdown::default();
    for sentiment in analyses.iter().filter_map(|a| a.sentiment) {
        breakdown.add(sentiment);
    }
    breakdown
}

/// Group values, bucketing `None` as `"Unknown"`, ranked by count.
fn open_breakdown<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<BreakdownEntry> {
    let values: Vec<&str> = values.map(|v| v.unwrap_or(UNKNOWN)).collect();
    let total = values.len();
    ranked(count_values(values))
        .into_iter()
        .map(|(key, count)| BreakdownEntry {
            key: key.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// One bucket per enumerated value; missing values excluded.
fn fixed_breakdown<T: Copy + PartialEq>(
    all: &[T],
    label: impl Fn(&T) -> &'static str,
    values: impl Iterator<Item = Option<T>>,
) -> Vec<BreakdownEntry> {
    let present: Vec<T> = values.flatten().collect();
    let total = present.len();
    all.iter()
        .map(|bucket| {
            let count = present.iter().filter(|v| *v == bucket).count();
            BreakdownEntry {
                key: label(bucket).to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

pub fn category_breakdown(analyses: &[SessionAnalysis]) -> Vec<BreakdownEntry> {
    open_breakdown(analyses.iter().map(|a| Some(a.category.as_str())))
}

pub fn language_breakdown(analyses: &[SessionAnalysis]) -> Vec<BreakdownEntry> {
    open_breakdown(analyses.iter().map(|a| a.language.as_deref()))
}

pub fn country_breakdown(sessions: &[Session]) -> Vec<BreakdownEntry> {
    open_breakdown(sessions.iter().map(|s| s.country.as_deref()))
}

pub fn device_breakdown(sessions: &[Session]) -> Vec<BreakdownEntry> {
    open_breakdown(sessions.iter().map(|s| s.device_type.as_deref()))
}

pub fn browser_breakdown(sessions: &[Session]) -> Vec<BreakdownEntry> {
    open_breakdown(sessions.iter().map(|s| s.browser_name.as_deref()))
}

pub fn status_breakdown(sessions: &[Session]) -> Vec<BreakdownEntry> {
    fixed_breakdown(
        &SessionStatus::ALL,
        SessionStatus::as_str,
        sessions.iter().map(|s| Some(s.status)),
    )
}

pub fn resolution_breakdown(analyses: &[SessionAnalysis]) -> Vec<BreakdownEntry> {
    fixed_breakdown(
        &ResolutionStatus::ALL,
        ResolutionStatus::as_str,
        analyses.iter().map(|a| a.resolution_status),
    )
}

pub fn engagement_breakdown(analyses: &[SessionAnalysis]) -> Vec<BreakdownEntry> {
    fixed_breakdown(
        &EngagementLevel::ALL,
        EngagementLevel::as_str,
        analyses.iter().map(|a| a.engagement),
    )
}

pub fn conversation_type_breakdown(analyses: &[SessionAnalysis]) -> Vec<BreakdownEntry> {
    fixed_breakdown(
        &ConversationType::ALL,
        ConversationType::as_str,
        analyses.iter().map(|a| a.conversation_type),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{analysis, session};

    fn total_count(entries: &[BreakdownEntry]) -> usize {
        entries.iter().map(|e| e.count).sum()
    }

    fn total_percentage(entries: &[BreakdownEntry]) -> f64 {
        entries.iter().map(|e| e.percentage).sum()
    }

    #[test]
    fn test_category_breakdown_buckets_unknown_and_ranks() {
        let mut a = analysis("s1", None);
        a.category = "Billing".to_string();
        let mut b = analysis("s2", None);
        b.category = "Billing".to_string();
        let c = analysis("s3", None);
        let mut d = analysis("s4", None);
        d.category = "Accounts".to_string();

        let entries = category_breakdown(&[a, b, c, d]);
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Billing", "Accounts", "Unknown"]);
        assert_eq!(entries[0].count, 2);
        assert_eq!(entries[0].percentage, 50.0);
        assert_eq!(total_count(&entries), 4);
        assert!((total_percentage(&entries) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_device_breakdown_from_sessions() {
        let mut mobile = session("s1", "acme", None);
        mobile.device_type = Some("mobile".to_string());
        let desktop = {
            let mut s = session("s2", "acme", None);
            s.device_type = Some("desktop".to_string());
            s
        };
        let unknown = session("s3", "acme", None);

        let entries = device_breakdown(&[mobile, desktop, unknown]);
        assert_eq!(entries.len(), 3);
        assert_eq!(total_count(&entries), 3);
        assert!(entries.iter().any(|e| e.key == "Unknown" && e.count == 1));
    }

    #[test]
    fn test_engagement_excludes_missing_values() {
        let mut high = analysis("s1", None);
        high.engagement = Some(EngagementLevel::High);
        let mut low = analysis("s2", None);
        low.engagement = Some(EngagementLevel::Low);
        let missing = analysis("s3", None);

        let entries = engagement_breakdown(&[high, low, missing]);
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["low", "medium", "high"]);
        assert_eq!(total_count(&entries), 2);
        assert_eq!(entries[0].percentage, 50.0);
        assert_eq!(entries[1].percentage, 0.0);
        assert!((total_percentage(&entries) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_conversation_type_buckets() {
        let mut casual = analysis("s1", None);
        casual.conversation_type = Some(ConversationType::Casual);
        let entries = conversation_type_breakdown(&[casual, analysis("s2", None)]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "casual");
        assert_eq!(entries[0].percentage, 100.0);
        assert_eq!(entries[1].key, "goal_driven");
    }

    #[test]
    fn test_sentiment_breakdown_counts() {
        let mut a = analysis("s1", None);
        a.sentiment = Some(Sentiment::Positive);
        let mut b = analysis("s2", None);
        b.sentiment = Some(Sentiment::Positive);
        let mut c = analysis("s3", None);
        c.sentiment = Some(Sentiment::Negative);

        let breakdown = sentiment_breakdown(&[a, b, c, analysis("s4", None)]);
        assert_eq!(
            breakdown,
            SentimentBreakdown {
                positive: 2,
                neutral: 0,
                negative: 1
            }
        );
        assert_eq!(breakdown.total(), 3);
    }

    #[test]
    fn test_status_breakdown_always_four_buckets() {
        let mut ended = session("s1", "acme", None);
        ended.status = SessionStatus::Ended;
        let entries = status_breakdown(&[ended]);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].key, "ended");
        assert_eq!(entries[1].percentage, 100.0);
    }

    #[test]
    fn test_empty_breakdowns() {
        assert!(category_breakdown(&[]).is_empty());
        let entries = resolution_breakdown(&[]);
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.count == 0 && e.percentage == 0.0));
        assert_eq!(sentiment_breakdown(&[]), SentimentBreakdown::default());
    }
}
