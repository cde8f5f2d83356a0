//! Token/cost usage and asset load telemetry

use std::collections::HashMap;

use serde::Serialize;

use super::mean;
use crate::types::{Session, SessionWithAnalysis, UNKNOWN};

/// Chat-stage and analysis-stage usage, kept apart and combined
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub chat_input_tokens: i64,
    pub chat_output_tokens: i64,
    pub chat_tokens: i64,
    pub chat_cost_eur: f64,
    pub chat_cost_usd: f64,
    pub analysis_prompt_tokens: i64,
    pub analysis_completion_tokens: i64,
    pub analysis_tokens: i64,
    pub analysis_cost_eur: f64,
    pub analysis_cost_usd: f64,
    pub total_tokens: i64,
    pub total_cost_eur: f64,
    pub total_cost_usd: f64,
}

pub fn usage_summary(items: &[SessionWithAnalysis]) -> UsageSummary {
    let mut usage = UsageSummary::default();
    for item in items {
        let session = &item.session;
        usage.chat_input_tokens += session.input_tokens;
        usage.chat_output_tokens += session.output_tokens;
        usage.chat_tokens += session.total_tokens;
        usage.chat_cost_eur += session.total_cost_eur;
        usage.chat_cost_usd += session.total_cost_usd;

        if let Some(analysis) = &item.analysis {
            usage.analysis_prompt_tokens += analysis.prompt_tokens.unwrap_or(0);
            usage.analysis_completion_tokens += analysis.completion_tokens.unwrap_or(0);
            usage.analysis_tokens += analysis.total_tokens.unwrap_or(0);
            usage.analysis_cost_eur += analysis.cost_eur;
            usage.analysis_cost_usd += analysis.cost_usd;
        }
    }
    usage.total_tokens = usage.chat_tokens + usage.analysis_tokens;
    usage.total_cost_eur = usage.chat_cost_eur + usage.analysis_cost_eur;
    usage.total_cost_usd = usage.chat_cost_usd + usage.analysis_cost_usd;
    usage
}

/// Sessions that loaded the assistant asset from one source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLoadStat {
    pub source: String,
    pub sessions: usize,
    /// Mean transfer size in bytes over sessions that reported one
    pub average_transfer_size: f64,
}

/// Sessions grouped by asset source (`"Unknown"` when missing), by count
/// descending then source.
pub fn asset_load_stats(sessions: &[Session]) -> Vec<AssetLoadStat> {
    let mut groups: HashMap<&str, Vec<&Session>> = HashMap::new();
    for session in sessions {
        groups
            .entry(session.asset_source.as_deref().unwrap_or(UNKNOWN))
            .or_default()
            .push(session);
    }

    let mut stats: Vec<AssetLoadStat> = groups
        .into_iter()
        .map(|(source, members)| AssetLoadStat {
            source: source.to_string(),
            sessions: members.len(),
            average_transfer_size: mean(
                members
                    .iter()
                    .filter_map(|s| s.asset_transfer_size)
                    .map(|size| size as f64),
            ),
        })
        .collect();
    stats.sort_by(|a, b| b.sessions.cmp(&a.sessions).then_with(|| a.source.cmp(&b.source)));
    stats
}
