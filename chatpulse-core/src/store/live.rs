//! Live-store-backed repository
//!
//! Sessions are fetched with scope, date range and session-level filters
//! pushed down to the store; analyses and messages are then fetched by
//! session id and joined here. Analysis-level filters are applied in memory
//! after mapping, since raw enum values may differ in case.
//!
//! A store without URL or service key still answers [`LiveStore::is_configured`]
//! but fails every query with [`Error::Config`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{LiveStoreConfig, StoreScope};
use crate::error::{Error, Result};
use crate::ingest::mapper::{format_timestamp, RawRow};
use crate::ingest::sources::live::{
    timestamp_column, ANALYSES_TABLE, ANALYSIS_SESSION_COLUMN, ASSISTANT_COLUMN, COUNTRY_COLUMN,
    DEVICE_TYPE_COLUMN, MESSAGES_TABLE, MESSAGE_ID_COLUMN, MESSAGE_SESSION_COLUMN, SESSIONS_TABLE,
    SESSION_ID_COLUMN, TENANT_COLUMN,
};
use crate::ingest::LIVE_SCHEMA;
use crate::store::client::{HttpLiveClient, LiveClient, Query};
use crate::store::{
    filter_analyses, index_analyses, join_and_filter, sort_messages, AnalyticsBackend, Owner,
};
use crate::types::{
    ChatMessage, ChatSessionFilters, DateRange, Session, SessionAnalysis, SessionWithAnalysis,
};

/// Rows requested per page
const PAGE_SIZE: usize = 1000;

/// Session ids per `in.(...)` filter, keeping URLs short
const ID_CHUNK: usize = 100;

/// Repository over one live store
pub struct LiveStore {
    scope: StoreScope,
    configured: bool,
    client: std::result::Result<Arc<dyn LiveClient>, String>,
}

impl LiveStore {
    /// Build a store from configuration.
    ///
    /// Never fails: a missing or unusable configuration is reported by the
    /// first query instead.
    pub fn from_config(config: &LiveStoreConfig) -> Self {
        let configured = config.is_configured();
        let client = if configured {
            HttpLiveClient::new(config)
                .map(|c| Arc::new(c) as Arc<dyn LiveClient>)
                .map_err(|e| e.to_string())
        } else {
            Err(format!(
                "the {} live store is not configured (live.{}.url and live.{}.service_key are required)",
                config.scope, config.scope, config.scope
            ))
        };
        Self {
            scope: config.scope,
            configured,
            client,
        }
    }

    /// Build a store over an existing client
    pub fn with_client(scope: StoreScope, client: Arc<dyn LiveClient>) -> Self {
        Self {
            scope,
            configured: true,
            client: Ok(client),
        }
    }

    pub fn scope(&self) -> StoreScope {
        self.scope
    }

    /// Whether URL and service key were supplied
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn client(&self) -> Result<&dyn LiveClient> {
        self.client
            .as_deref()
            .map_err(|message| Error::Config(message.clone()))
    }

    /// Fetch every page of a query.
    async fn select_all(&self, table: &str, query: Query) -> Result<Vec<RawRow>> {
        let client = self.client()?;
        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let page = client
                .select(table, &query.clone().limit(PAGE_SIZE).offset(offset))
                .await?;
            let fetched = page.len();
            rows.extend(page);
            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }
        tracing::debug!(store = %self.scope, table, rows = rows.len(), "fetched live rows");
        Ok(rows)
    }

    /// Sessions of `owner`, with date range and session-level filters pushed down.
    async fn owned_sessions(
        &self,
        owner: Owner<'_>,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        let owner_column = match owner {
            Owner::Assistant(_) => ASSISTANT_COLUMN,
            Owner::Tenant(_) => TENANT_COLUMN,
        };
        let mut query = with_range(
            Query::new().eq(owner_column, owner.id()),
            timestamp_column(SESSIONS_TABLE),
            &filters.date_range,
        );
        if let Some(device_type) = &filters.device_type {
            query = query.eq(DEVICE_TYPE_COLUMN, device_type.clone());
        }
        if let Some(country) = &filters.country {
            query = query.eq(COUNTRY_COLUMN, country.clone());
        }
        let query = query
            .order_desc(timestamp_column(SESSIONS_TABLE))
            .order_desc(SESSION_ID_COLUMN);

        let rows = self.select_all(SESSIONS_TABLE, query).await?;
        Ok(rows.iter().map(|r| LIVE_SCHEMA.sessions.map(r)).collect())
    }

    /// Analyses of the given sessions, optionally restricted by creation time.
    async fn analyses_for_sessions(
        &self,
        session_ids: &[String],
        created: &DateRange,
    ) -> Result<Vec<SessionAnalysis>> {
        let mut analyses = Vec::new();
        for chunk in session_ids.chunks(ID_CHUNK) {
            let query = with_range(
                Query::new().in_list(ANALYSIS_SESSION_COLUMN, chunk),
                timestamp_column(ANALYSES_TABLE),
                created,
            )
            .order_desc(timestamp_column(ANALYSES_TABLE))
            .order_desc(ANALYSIS_SESSION_COLUMN);

            let rows = self.select_all(ANALYSES_TABLE, query).await?;
            analyses.extend(rows.iter().map(|r| LIVE_SCHEMA.analyses.map(r)));
        }
        Ok(analyses)
    }

    async fn with_analysis(
        &self,
        owner: Owner<'_>,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        let sessions = self.owned_sessions(owner, filters).await?;
        let ids: Vec<String> = sessions.iter().map(|s| s.id.clone()).collect();
        let analyses = self
            .analyses_for_sessions(&ids, &DateRange::unbounded())
            .await?;
        Ok(join_and_filter(sessions, &index_analyses(analyses), filters))
    }

    async fn sessions_for(
        &self,
        owner: Owner<'_>,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        let joined = if filters.has_analysis_filters() {
            self.with_analysis(owner, filters).await?
        } else {
            let sessions = self.owned_sessions(owner, filters).await?;
            join_and_filter(sessions, &Default::default(), filters)
        };
        Ok(joined.into_iter().map(|j| j.session).collect())
    }

    async fn analyses_for(
        &self,
        owner: Owner<'_>,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>> {
        // The date range applies to analyses here, not to their sessions
        let session_filters = ChatSessionFilters {
            date_range: DateRange::unbounded(),
            device_type: filters.device_type.clone(),
            country: filters.country.clone(),
            ..Default::default()
        };
        let owned = self.owned_sessions(owner, &session_filters).await?;
        let ids: Vec<String> = owned.iter().map(|s| s.id.clone()).collect();
        let analyses = self.analyses_for_sessions(&ids, &filters.date_range).await?;
        Ok(filter_analyses(&owned, analyses, filters))
    }
}

/// Add `[start, end)` bounds on `column` to a query.
fn with_range(mut query: Query, column: &str, range: &DateRange) -> Query {
    if let Some(start) = &range.start {
        query = query.gte(column, format_timestamp(start));
    }
    if let Some(end) = &range.end {
        query = query.lt(column, format_timestamp(end));
    }
    query
}

#[async_trait]
impl AnalyticsBackend for LiveStore {
    fn name(&self) -> String {
        format!("live:{}", self.scope)
    }

    async fn sessions_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        self.sessions_for(Owner::Assistant(assistant_id), filters).await
    }

    async fn sessions_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        self.sessions_for(Owner::Tenant(tenant_id), filters).await
    }

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let query = Query::new().eq(SESSION_ID_COLUMN, session_id).limit(1);
        let rows = self.client()?.select(SESSIONS_TABLE, &query).await?;
        Ok(rows.first().map(|r| LIVE_SCHEMA.sessions.map(r)))
    }

    async fn sessions_with_analysis_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        self.with_analysis(Owner::Assistant(assistant_id), filters).await
    }

    async fn sessions_with_analysis_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        self.with_analysis(Owner::Tenant(tenant_id), filters).await
    }

    async fn analysis_by_session_id(&self, session_id: &str) -> Result<Option<SessionAnalysis>> {
        let query = Query::new().eq(ANALYSIS_SESSION_COLUMN, session_id).limit(1);
        let rows = self.client()?.select(ANALYSES_TABLE, &query).await?;
        Ok(rows.first().map(|r| LIVE_SCHEMA.analyses.map(r)))
    }

    async fn analyses_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>> {
        self.analyses_for(Owner::Assistant(assistant_id), filters).await
    }

    async fn analyses_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>> {
        self.analyses_for(Owner::Tenant(tenant_id), filters).await
    }

    async fn messages_for_sessions(&self, session_ids: &[String]) -> Result<Vec<ChatMessage>> {
        // Fail on missing credentials even when there is nothing to fetch
        self.client()?;

        let mut messages = Vec::new();
        for chunk in session_ids.chunks(ID_CHUNK) {
            let query = Query::new()
                .in_list(MESSAGE_SESSION_COLUMN, chunk)
                .order_desc(timestamp_column(MESSAGES_TABLE))
                .order_desc(MESSAGE_ID_COLUMN);
            let rows = self.select_all(MESSAGES_TABLE, query).await?;
            messages.extend(rows.iter().map(|r| LIVE_SCHEMA.messages.map(r)));
        }
        sort_messages(&mut messages);
        Ok(messages)
    }
}
