//! Fixture-backed repository
//!
//! The demo dataset is three JSON arrays: `sessions.json`,
//! `session_analyses.json` and `messages.json`. By default they are embedded
//! in the library; a directory or in-memory rows can be injected instead.
//!
//! Each record type is parsed at most once per store, on first use, into a
//! `tokio::sync::OnceCell` and read-only afterwards.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::FixturesConfig;
use crate::error::{Error, Result};
use crate::ingest::mapper::{rows_from_value, RawRow};
use crate::ingest::FIXTURE_SCHEMA;
use crate::store::{
    filter_analyses, index_analyses, join_and_filter, sort_messages, AnalyticsBackend, Owner,
};
use crate::types::{ChatMessage, ChatSessionFilters, Session, SessionAnalysis, SessionWithAnalysis};

const EMBEDDED_SESSIONS: &str = include_str!("../../fixtures/sessions.json");
const EMBEDDED_ANALYSES: &str = include_str!("../../fixtures/session_analyses.json");
const EMBEDDED_MESSAGES: &str = include_str!("../../fixtures/messages.json");

/// The three fixture files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFile {
    Sessions,
    Analyses,
    Messages,
}

impl FixtureFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            FixtureFile::Sessions => "sessions.json",
            FixtureFile::Analyses => "session_analyses.json",
            FixtureFile::Messages => "messages.json",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            FixtureFile::Sessions => EMBEDDED_SESSIONS,
            FixtureFile::Analyses => EMBEDDED_ANALYSES,
            FixtureFile::Messages => EMBEDDED_MESSAGES,
        }
    }
}

/// Where fixture rows come from
#[derive(Debug, Clone)]
pub enum FixtureSource {
    /// The dataset compiled into the library
    Embedded,
    /// A directory holding the three JSON files
    Directory(PathBuf),
    /// Rows supplied directly
    Rows {
        sessions: Vec<RawRow>,
        analyses: Vec<RawRow>,
        messages: Vec<RawRow>,
    },
}

impl FixtureSource {
    pub fn from_config(config: &FixturesConfig) -> Self {
        match &config.dir {
            Some(dir) => FixtureSource::Directory(dir.clone()),
            None => FixtureSource::Embedded,
        }
    }

    async fn rows(&self, file: FixtureFile) -> Result<Vec<RawRow>> {
        match self {
            FixtureSource::Embedded => parse_rows(file.embedded(), file.file_name()),
            FixtureSource::Directory(dir) => {
                let path = dir.join(file.file_name());
                let content = tokio::fs::read_to_string(&path).await?;
                parse_rows(&content, &path.display().to_string())
            }
            FixtureSource::Rows {
                sessions,
                analyses,
                messages,
            } => Ok(match file {
                FixtureFile::Sessions => sessions.clone(),
                FixtureFile::Analyses => analyses.clone(),
                FixtureFile::Messages => messages.clone(),
            }),
        }
    }
}

/// Parse a fixture file, which must hold a JSON array.
fn parse_rows(content: &str, file: &str) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(content)?;
    if !value.is_array() {
        return Err(Error::Fixture {
            file: file.to_string(),
            message: "expected a JSON array of rows".to_string(),
        });
    }
    Ok(rows_from_value(value, file))
}

/// Repository over the fixture dataset
#[derive(Debug)]
pub struct FixtureStore {
    source: FixtureSource,
    sessions: OnceCell<Vec<Session>>,
    analyses: OnceCell<Vec<SessionAnalysis>>,
    messages: OnceCell<Vec<ChatMessage>>,
}

impl FixtureStore {
    pub fn new(source: FixtureSource) -> Self {
        Self {
            source,
            sessions: OnceCell::new(),
            analyses: OnceCell::new(),
            messages: OnceCell::new(),
        }
    }

    /// Store over the embedded dataset
    pub fn embedded() -> Self {
        Self::new(FixtureSource::Embedded)
    }

    pub fn source(&self) -> &FixtureSource {
        &self.source
    }

    /// All fixture sessions, in file order
    pub async fn sessions(&self) -> Result<&[Session]> {
        let sessions = self
            .sessions
            .get_or_try_init(|| async {
                let rows = self.source.rows(FixtureFile::Sessions).await?;
                let mapped: Vec<Session> = rows.iter().map(|r| FIXTURE_SCHEMA.sessions.map(r)).collect();
                tracing::debug!(count = mapped.len(), "loaded fixture sessions");
                Ok::<_, Error>(mapped)
            })
            .await?;
        Ok(sessions.as_slice())
    }

    /// All fixture analyses, in file order
    pub async fn analyses(&self) -> Result<&[SessionAnalysis]> {
        let analyses = self
            .analyses
            .get_or_try_init(|| async {
                let rows = self.source.rows(FixtureFile::Analyses).await?;
                let mapped: Vec<SessionAnalysis> =
                    rows.iter().map(|r| FIXTURE_SCHEMA.analyses.map(r)).collect();
                tracing::debug!(count = mapped.len(), "loaded fixture analyses");
                Ok::<_, Error>(mapped)
            })
            .await?;
        Ok(analyses.as_slice())
    }

    /// All fixture messages, in file order
    pub async fn messages(&self) -> Result<&[ChatMessage]> {
        let messages = self
            .messages
            .get_or_try_init(|| async {
                let rows = self.source.rows(FixtureFile::Messages).await?;
                let mapped: Vec<ChatMessage> =
                    rows.iter().map(|r| FIXTURE_SCHEMA.messages.map(r)).collect();
                tracing::debug!(count = mapped.len(), "loaded fixture messages");
                Ok::<_, Error>(mapped)
            })
            .await?;
        Ok(messages.as_slice())
    }

    async fn owned_sessions(&self, owner: Owner<'_>) -> Result<Vec<Session>> {
        Ok(self
            .sessions()
            .await?
            .iter()
            .filter(|s| owner.owns(s))
            .cloned()
            .collect())
    }

    async fn with_analysis(
        &self,
        owner: Owner<'_>,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        let sessions = self.owned_sessions(owner).await?;
        let index = index_analyses(self.analyses().await?.iter().cloned());
        Ok(join_and_filter(sessions, &index, filters))
    }

    async fn analyses_for(
        &self,
        owner: Owner<'_>,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionAnalysis>> {
        let owned = self.owned_sessions(owner).await?;
        let analyses = self.analyses().await?.to_vec();
        Ok(filter_analyses(&owned, analyses, filters))
    }
}

#[async_trait]
impl AnalyticsBackend for FixtureStore {
    fn name(&self) -> String {
        "fixtures".to_string()
    }

    async fn sessions_by_assistant(
        &self,
        assistant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        let joined = self.with_analysis(Owner::Assistant(assistant_id), filters).await?;
        Ok(joined.into_iter().map(|j| j.session).collect())
    }

    async fn sessions_by_tenant(
        &self,
        tenant_id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<Session>> {
        let joined = self.with_analysis(Owner::Tenant(tenant_id), filters).await?;
        Ok(joined.into_iter().map(|j| j.session).collect())
    }

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self
            .sessions()
            .await?
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
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
        Ok(self
            .analyses()
            .await?
            .iter()
            .find(|a| a.session_id == session_id)
            .cloned())
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
        let mut messages: Vec<ChatMessage> = self
            .messages()
            .await?
            .iter()
            .filter(|m| session_ids.contains(&m.session_id))
            .cloned()
            .collect();
        sort_messages(&mut messages);
        Ok(messages)
    }
}
