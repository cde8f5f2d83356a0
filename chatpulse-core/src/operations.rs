//! Operations facade
//!
//! [`AnalyticsOperations`] is the one object callers use. It binds a single
//! backing store and exposes three namespaces:
//!
//! ```ignore
//! let ops = router.resolve("acme");
//! let sessions = ops.sessions().by_tenant("acme", &filters).await?;
//! let analysis = ops.analyses().by_session_id("s-1").await?;
//! let overview = ops.aggregations().overview_by_tenant("acme", &range).await?;
//! ```
//!
//! Aggregates are recomputed from the repositories on every call.

use std::sync::Arc;

use crate::analytics::{self, *};
use crate::error::Result;
use crate::store::{AnalyticsBackend, Owner};
use crate::types::{
    ChatMessage, ChatSessionFilters, DateRange, Session, SessionAnalysis, SessionWithAnalysis,
};

/// Top entries reported for outbound links
pub const TOP_LINKS: usize = 10;

/// Facade over one backing store
#[derive(Clone)]
pub struct AnalyticsOperations {
    backend: Arc<dyn AnalyticsBackend>,
}

impl AnalyticsOperations {
    pub fn new(backend: Arc<dyn AnalyticsBackend>) -> Self {
        Self { backend }
    }

    /// Name of the bound backing store (`fixtures`, `live:production`, ...)
    pub fn backend_name(&self) -> String {
        self.backend.name()
    }

    pub fn sessions(&self) -> ChatSessions<'_> {
        ChatSessions {
            backend: self.backend.as_ref(),
        }
    }

    pub fn analyses(&self) -> Analyses<'_> {
        Analyses {
            backend: self.backend.as_ref(),
        }
    }

    pub fn aggregations(&self) -> Aggregations<'_> {
        Aggregations {
            backend: self.backend.as_ref(),
        }
    }
}

impl std::fmt::Debug for AnalyticsOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsOperations")
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Session queries
pub struct ChatSessions<'a> {
    backend: &'a dyn AnalyticsBackend,
}

impl ChatSessions<'_> {
    pub async fn by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        self.backend.sessions_by_assistant(assistant_id, filters).await
    }

    pub async fn by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        self.backend.sessions_by_tenant(tenant_id, filters).await
    }

    pub async fn by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.backend.session_by_id(session_id).await
    }

    pub async fn with_analysis_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        self.backend
            .sessions_with_analysis_by_assistant(assistant_id, filters)
            .await
    }

    pub async fn with_analysis_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        self.backend
            .sessions_with_analysis_by_tenant(tenant_id, filters)
            .await
    }
}

/// Analysis queries
pub struct Analyses<'a> {
    backend: &'a dyn AnalyticsBackend,
}

impl Analyses<'_> {
    pub async fn by_session_id(&self, session_id: &str) -> Result<Option<SessionAnalysis>> {
        self.backend.analysis_by_session_id(session_id).await
    }

    pub async fn by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>> {
        self.backend.analyses_by_assistant(assistant_id, filters).await
    }

    pub async fn by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>> {
        self.backend.analyses_by_tenant(tenant_id, filters).await
    }
}

/// Aggregate statistics over a date range
pub struct Aggregations<'a> {
    backend: &'a dyn AnalyticsBackend,
}

/// Generate the `_by_assistant` / `_by_tenant` pair for an owner-scoped aggregate.
macro_rules! by_owner {
    ($(#[$doc:meta])* $inner:ident => $by_assistant:ident, $by_tenant:ident -> $out:ty) => {
        $(#[$doc])*
        pub async fn $by_assistant(&self, assistant_id: &str, range: &DateRange) -> Result<$out> {
            self.$inner(Owner::Assistant(assistant_id), range).await
        }

        $(#[$doc])*
        pub async fn $by_tenant(&self, tenant_id: &str, range: &DateRange) -> Result<$out> {
            self.$inner(Owner::Tenant(tenant_id), range).await
        }
    };
}

impl Aggregations<'_> {
    // Repository reads shared by the aggregates

    async fn joined(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<SessionWithAnalysis>> {
        let filters = ChatSessionFilters::for_range(range.clone());
        match owner {
            Owner::Assistant(id) => self.backend.sessions_with_analysis_by_assistant(id, &filters).await,
            Owner::Tenant(id) => self.backend.sessions_with_analysis_by_tenant(id, &filters).await,
        }
    }

    async fn sessions(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<Session>> {
        let filters = ChatSessionFilters::for_range(range.clone());
        match owner {
            Owner::Assistant(id) => self.backend.sessions_by_assistant(id, &filters).await,
            Owner::Tenant(id) => self.backend.sessions_by_tenant(id, &filters).await,
        }
    }

    async fn analyses(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<SessionAnalysis>> {
        let filters = ChatSessionFilters::for_range(range.clone());
        match owner {
            Owner::Assistant(id) => self.backend.analyses_by_assistant(id, &filters).await,
            Owner::Tenant(id) => self.backend.analyses_by_tenant(id, &filters).await,
        }
    }

    /// Messages of the sessions started in range
    async fn messages(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<ChatMessage>> {
        let ids: Vec<String> = self
            .sessions(owner, range)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.backend.messages_for_sessions(&ids).await
    }

    // Aggregates for either owner kind

    pub async fn overview(&self, owner: Owner<'_>, range: &DateRange) -> Result<OverviewMetrics> {
        Ok(analytics::overview(&self.joined(owner, range).await?))
    }

    pub async fn sentiment_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<SentimentBreakdown> {
        Ok(analytics::sentiment_breakdown(&self.analyses(owner, range).await?))
    }

    pub async fn category_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::category_breakdown(&self.analyses(owner, range).await?))
    }

    pub async fn language_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::language_breakdown(&self.analyses(owner, range).await?))
    }

    pub async fn country_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::country_breakdown(&self.sessions(owner, range).await?))
    }

    pub async fn device_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::device_breakdown(&self.sessions(owner, range).await?))
    }

    pub async fn browser_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::browser_breakdown(&self.sessions(owner, range).await?))
    }

    pub async fn status_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::status_breakdown(&self.sessions(owner, range).await?))
    }

    pub async fn resolution_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::resolution_breakdown(&self.analyses(owner, range).await?))
    }

    pub async fn engagement_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::engagement_breakdown(&self.analyses(owner, range).await?))
    }

    pub async fn conversation_type_breakdown(
        &self,
        owner: Owner<'_>,
        range: &DateRange,
    ) -> Result<Vec<BreakdownEntry>> {
        Ok(analytics::conversation_type_breakdown(&self.analyses(owner, range).await?))
    }

    pub async fn time_series(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<TimeSeriesPoint>> {
        Ok(analytics::time_series(&self.sessions(owner, range).await?))
    }

    pub async fn sentiment_time_series(
        &self,
        owner: Owner<'_>,
        range: &DateRange,
    ) -> Result<Vec<SentimentTimePoint>> {
        Ok(analytics::sentiment_time_series(&self.analyses(owner, range).await?))
    }

    pub async fn hourly_breakdown(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<HourlyBucket>> {
        Ok(analytics::hourly_breakdown(&self.sessions(owner, range).await?))
    }

    pub async fn question_analytics(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<QuestionStat>> {
        Ok(analytics::question_analytics(&self.analyses(owner, range).await?))
    }

    pub async fn unanswered_questions(
        &self,
        owner: Owner<'_>,
        range: &DateRange,
    ) -> Result<Vec<QuestionFrequency>> {
        Ok(analytics::unanswered_questions(&self.analyses(owner, range).await?))
    }

    pub async fn outbound_links(&self, owner: Owner<'_>, range: &DateRange) -> Result<OutboundLinks> {
        Ok(analytics::outbound_links(&self.analyses(owner, range).await?, TOP_LINKS))
    }

    pub async fn animation_stats(&self, owner: Owner<'_>, range: &DateRange) -> Result<AnimationStats> {
        Ok(analytics::animation_stats(&self.messages(owner, range).await?))
    }

    pub async fn usage_summary(&self, owner: Owner<'_>, range: &DateRange) -> Result<UsageSummary> {
        Ok(analytics::usage_summary(&self.joined(owner, range).await?))
    }

    pub async fn asset_load_stats(&self, owner: Owner<'_>, range: &DateRange) -> Result<Vec<AssetLoadStat>> {
        Ok(analytics::asset_load_stats(&self.sessions(owner, range).await?))
    }

    by_owner! {
        /// Headline KPIs over sessions started in range
        overview => overview_by_assistant, overview_by_tenant -> OverviewMetrics
    }
    by_owner! {
        /// Sentiment counts over analyses created in range
        sentiment_breakdown => sentiment_breakdown_by_assistant, sentiment_breakdown_by_tenant -> SentimentBreakdown
    }
    by_owner! {
        category_breakdown => category_breakdown_by_assistant, category_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        language_breakdown => language_breakdown_by_assistant, language_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        country_breakdown => country_breakdown_by_assistant, country_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        device_breakdown => device_breakdown_by_assistant, device_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        browser_breakdown => browser_breakdown_by_assistant, browser_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        status_breakdown => status_breakdown_by_assistant, status_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        resolution_breakdown => resolution_breakdown_by_assistant, resolution_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        engagement_breakdown => engagement_breakdown_by_assistant, engagement_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        conversation_type_breakdown => conversation_type_breakdown_by_assistant, conversation_type_breakdown_by_tenant -> Vec<BreakdownEntry>
    }
    by_owner! {
        /// Per-day totals over sessions started in range
        time_series => time_series_by_assistant, time_series_by_tenant -> Vec<TimeSeriesPoint>
    }
    by_owner! {
        /// Per-day sentiment counts over analyses created in range
        sentiment_time_series => sentiment_time_series_by_assistant, sentiment_time_series_by_tenant -> Vec<SentimentTimePoint>
    }
    by_owner! {
        /// 24 hour-of-day buckets over sessions started in range
        hourly_breakdown => hourly_breakdown_by_assistant, hourly_breakdown_by_tenant -> Vec<HourlyBucket>
    }
    by_owner! {
        question_analytics => question_analytics_by_assistant, question_analytics_by_tenant -> Vec<QuestionStat>
    }
    by_owner! {
        unanswered_questions => unanswered_questions_by_assistant, unanswered_questions_by_tenant -> Vec<QuestionFrequency>
    }
    by_owner! {
        outbound_links => outbound_links_by_assistant, outbound_links_by_tenant -> OutboundLinks
    }
    by_owner! {
        /// Animation statistics over messages of sessions started in range
        animation_stats => animation_stats_by_assistant, animation_stats_by_tenant -> AnimationStats
    }
    by_owner! {
        usage_summary => usage_summary_by_assistant, usage_summary_by_tenant -> UsageSummary
    }
    by_owner! {
        asset_load_stats => asset_load_stats_by_assistant, asset_load_stats_by_tenant -> Vec<AssetLoadStat>
    }
}
