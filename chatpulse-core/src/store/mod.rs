//! Session and analysis repositories
//!
//! Two backing stores implement [`AnalyticsBackend`]:
//!
//! - [`FixtureStore`]: the embedded (or injected) demo dataset
//! - [`LiveStore`]: the live store, reached through a [`LiveClient`]
//!
//! Both narrow their candidates as far as their source allows and then pass
//! them through the same [`join_and_filter`] / [`filter_analyses`] step, so
//! filtering and ordering are identical regardless of source.

pub mod client;
pub mod fixture;
pub mod live;

pub use client::{HttpLiveClient, LiveClient, MemoryLiveClient, Query};
pub use fixture::{FixtureSource, FixtureStore};
pub use live::LiveStore;

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ChatMessage, ChatSessionFilters, Session, SessionAnalysis, SessionWithAnalysis, Timestamp,
};

/// Whose records a query is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'a> {
    Assistant(&'a str),
    Tenant(&'a str),
}

impl Owner<'_> {
    pub fn owns(&self, session: &Session) -> bool {
        match self {
            Owner::Assistant(id) => session.assistant_id == *id,
            Owner::Tenant(id) => session.tenant_id == *id,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Owner::Assistant(id) | Owner::Tenant(id) => id,
        }
    }
}

/// Read-only access to canonical records of one backing store.
///
/// Session queries apply the date range to the session start; analysis
/// queries apply it to the analysis creation time. Results are most recent
/// first, ties broken by id.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    /// Short name for logs and reports (`fixtures`, `live:demo`, ...)
    fn name(&self) -> String;

    async fn sessions_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>>;

    async fn sessions_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>>;

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    async fn sessions_with_analysis_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>>;

    async fn sessions_with_analysis_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>>;

    async fn analysis_by_session_id(&self, session_id: &str) -> Result<Option<SessionAnalysis>>;

    async fn analyses_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>>;

    async fn analyses_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>>;

    /// Messages of the given sessions, oldest first.
    ///
    /// A backend without message access returns no messages and logs a
    /// warning, so animation statistics read as "no data".
    async fn messages_for_sessions(&self, session_ids: &[String]) -> Result<Vec<ChatMessage>> {
        tracing::warn!(
            backend = %self.name(),
            sessions = session_ids.len(),
            "messages_for_sessions is not implemented for this backend, returning no messages"
        );
        Ok(Vec::new())
    }
}

/// Left-join sessions with their analyses, apply every filter, and order.
pub fn join_and_filter(
    sessions: Vec<Session>,
    analyses: &HashMap<String, SessionAnalysis>,
    filters: &ChatSessionFilters,
) -> Vec<SessionWithAnalysis> {
    let mut joined: Vec<SessionWithAnalysis> = sessions
        .into_iter()
        .filter(|s| filters.date_range.contains(s.started_at.as_ref()))
        .filter(|s| filters.matches_session(s))
        .map(|session| {
            let analysis = analyses.get(&session.id).cloned();
            SessionWithAnalysis { session, analysis }
        })
        .filter(|item| filters.matches_analysis(item.analysis.as_ref()))
        .collect();

    joined.sort_by(|a, b| {
        recent_first(a.session.started_at.as_ref(), b.session.started_at.as_ref())
            .then_with(|| a.session.id.cmp(&b.session.id))
    });
    joined
}

/// Keep analyses of `owned` sessions that pass every filter, and order them.
///
/// Session-level filters (device, country) are checked against the
/// analysis's session; the date range applies to the creation time.
pub fn filter_analyses(
    owned: &[Session],
    analyses: Vec<SessionAnalysis>,
    filters: &ChatSessionFilters,
) -> Vec<SessionAnalysis> {
    let sessions: HashMap<&str, &Session> = owned.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut kept: Vec<SessionAnalysis> = analyses
        .into_iter()
        .filter(|a| {
            sessions
                .get(a.session_id.as_str())
                .is_some_and(|s| filters.matches_session(s))
        })
        .filter(|a| filters.date_range.contains(a.created_at.as_ref()))
        .filter(|a| filters.matches_analysis(Some(a)))
        .collect();

    kept.sort_by(|a, b| {
        recent_first(a.created_at.as_ref(), b.created_at.as_ref())
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    kept
}

/// Index analyses by session id. The first analysis of a session wins.
pub fn index_analyses(analyses: impl IntoIterator<Item = SessionAnalysis>) -> HashMap<String, SessionAnalysis> {
    let mut index = HashMap::new();
    for analysis in analyses {
        index.entry(analysis.session_id.clone()).or_insert(analysis);
    }
    index
}

/// Most recent first; records without a timestamp sort last.
fn recent_first(a: Option<&Timestamp>, b: Option<&Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order messages oldest first, keeping source order for equal timestamps.
pub fn sort_messages(messages: &mut [ChatMessage]) {
    messages.sort_by(|a, b| match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}


#[cfg(test)]
mod tests {
    use super::test_support::{analysis, session};
    use super::*;
    use crate::ingest::mapper::parse_timestamp;
    use crate::types::{DateRange, Sentiment};

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(parse_timestamp(start).unwrap(), parse_timestamp(end).unwrap())
    }

    #[test]
    fn test_join_orders_recent_first_with_id_tiebreak() {
        let sessions = vec![
            session("b", "acme", Some("2024-05-01T10:00:00Z")),
            session("c", "acme", None),
            session("a", "acme", Some("2024-05-01T10:00:00Z")),
            session("d", "acme", Some("2024-05-02T10:00:00Z")),
        ];
        let joined = join_and_filter(sessions, &HashMap::new(), &ChatSessionFilters::default());
        let ids: Vec<&str> = joined.iter().map(|j| j.session.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_join_applies_date_range_and_analysis_filters() {
        let sessions = vec![
            session("in-range", "acme", Some("2024-05-01T10:00:00Z")),
            session("late", "acme", Some("2024-06-01T00:00:00Z")),
            session("no-analysis", "acme", Some("2024-05-02T10:00:00Z")),
        ];
        let mut positive = analysis("in-range", None);
        positive.sentiment = Some(Sentiment::Positive);
        let index = index_analyses(vec![positive]);

        let filters = ChatSessionFilters {
            sentiment: Some(Sentiment::Positive),
            ..ChatSessionFilters::for_range(range("2024-05-01T00:00:00Z", "2024-06-01T00:00:00Z"))
        };
        let joined = join_and_filter(sessions, &index, &filters);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].session.id, "in-range");
        assert!(joined[0].analysis.is_some());
    }

    #[test]
    fn test_filter_analyses_uses_creation_time_and_session_filters() {
        let mut mobile = session("s1", "acme", Some("2024-04-30T23:00:00Z"));
        mobile.device_type = Some("mobile".to_string());
        let desktop = session("s2", "acme", Some("2024-05-01T10:00:00Z"));
        let owned = vec![mobile, desktop];

        let analyses = vec![
            analysis("s1", Some("2024-05-01T01:00:00Z")),
            analysis("s2", Some("2024-05-01T11:00:00Z")),
            analysis("foreign", Some("2024-05-01T11:00:00Z")),
        ];

        let filters = ChatSessionFilters {
            device_type: Some("mobile".to_string()),
            ..ChatSessionFilters::for_range(range("2024-05-01T00:00:00Z", "2024-05-02T00:00:00Z"))
        };
        let kept = filter_analyses(&owned, analyses, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].session_id, "s1");
    }

    #[test]
    fn test_index_analyses_keeps_first() {
        let mut first = analysis("s1", None);
        first.category = "Billing".to_string();
        let second = analysis("s1", None);
        let index = index_analyses(vec![first, second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index["s1"].category, "Billing");
    }
}
