//! Headline KPIs

use serde::Serialize;

use super::{mean, percentage};
use crate::types::{ResolutionStatus, SessionWithAnalysis};

/// Overview metrics for a set of sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub total_sessions: usize,
    pub total_messages: i64,
    pub total_tokens: i64,
    pub total_cost_eur: f64,
    /// Mean over sessions that measured a latency
    pub average_response_time_ms: f64,
    /// Mean over sessions with a known duration
    pub average_session_duration_seconds: f64,
    /// Percent of sessions whose analysis is `resolved`
    pub resolution_rate: f64,
    /// Percent of sessions whose analysis is escalated
    pub escalation_rate: f64,
}

/// Compute overview metrics.
///
/// Sessions without an analysis count toward the rate denominators but can
/// never be resolved or escalated.
pub fn overview(items: &[SessionWithAnalysis]) -> OverviewMetrics {
    let total_sessions = items.len();
    let resolved = items
        .iter()
        .filter(|i| {
            i.analysis
                .as_ref()
                .is_some_and(|a| a.resolution_status == Some(ResolutionStatus::Resolved))
        })
        .count();
    let escalated = items
        .iter()
        .filter(|i| i.analysis.as_ref().is_some_and(|a| a.escalated))
        .count();

    OverviewMetrics {
        total_sessions,
        total_messages: items.iter().map(|i| i.session.total_messages).sum(),
        total_tokens: items.iter().map(|i| i.session.total_tokens).sum(),
        total_cost_eur: items.iter().map(|i| i.session.total_cost_eur).sum(),
        average_response_time_ms: mean(items.iter().filter_map(|i| i.session.average_response_time_ms)),
        average_session_duration_seconds: mean(
            items
                .iter()
                .filter_map(|i| i.session.session_duration_seconds)
                .map(|d| d as f64),
        ),
        resolution_rate: percentage(resolved, total_sessions),
        escalation_rate: percentage(escalated, total_sessions),
    }
}
