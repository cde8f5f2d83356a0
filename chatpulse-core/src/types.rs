//! Core domain types for chatpulse
//!
//! These types represent the canonical data model that normalizes chat
//! activity from both backing stores (embedded fixtures and the live store).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tenant** | A customer organization owning one or more assistants |
//! | **Assistant** | A single configured chatbot instance |
//! | **Session** | One visitor interaction with one assistant |
//! | **SessionAnalysis** | Offline enrichment of a session (sentiment, questions, ...) |
//! | **ChatMessage** | One turn of a session's transcript |
//!
//! Every record here is read-only: the chat widget and the offline analysis
//! job create them, this crate only reads them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Timestamps keep the offset the source encoded, so day and hour
/// truncation happen in that zone without conversion.
pub type Timestamp = DateTime<FixedOffset>;

// ============================================
// Sessions
// ============================================

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Still open (no end reason, not flagged inactive)
    Active,
    /// Closed normally
    Ended,
    /// Closed by inactivity timeout
    Timeout,
    /// Closed by an error in the widget
    Error,
}

impl SessionStatus {
    /// All statuses, in display order.
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Active,
        SessionStatus::Ended,
        SessionStatus::Timeout,
        SessionStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
            SessionStatus::Timeout => "timeout",
            SessionStatus::Error => "error",
        }
    }

    /// Derive the status from a raw end reason and is-active flag.
    ///
    /// `timeout` and `error` end reasons map directly. An explicit
    /// `is_active = false`, or any other end reason, means the session
    /// ended. Only a session with neither is active.
    pub fn derive(end_reason: Option<&str>, is_active: Option<bool>) -> Self {
        let reason = end_reason.map(str::trim).filter(|r| !r.is_empty());
        match reason {
            Some("timeout") => SessionStatus::Timeout,
            Some("error") => SessionStatus::Error,
            _ if is_active == Some(false) => SessionStatus::Ended,
            Some(_) => SessionStatus::Ended,
            None => SessionStatus::Active,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            "timeout" => Ok(SessionStatus::Timeout),
            "error" => Ok(SessionStatus::Error),
            _ => Err(format!("unknown session status: {}", s)),
        }
    }
}

/// Who wrote a transcript entry or message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    /// The website visitor
    User,
    /// The assistant
    Bot,
}

impl Author {
    pub fn as_str(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Bot => "bot",
        }
    }
}

impl std::str::FromStr for Author {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "visitor" | "human" => Ok(Author::User),
            "bot" | "assistant" | "mascot" => Ok(Author::Bot),
            _ => Err(format!("unknown author: {}", s)),
        }
    }
}

/// One entry of a session's embedded transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub author: Author,
    pub message: String,
    pub timestamp: Option<Timestamp>,
}

/// One visitor interaction with one assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session
    pub id: String,
    /// Assistant the visitor talked to
    pub assistant_id: String,
    /// Tenant owning the assistant
    pub tenant_id: String,

    // Timeline
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub first_message_at: Option<Timestamp>,
    pub last_message_at: Option<Timestamp>,

    // Visitor
    /// IP address with the last octet masked
    pub visitor_ip_hash: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: Option<String>,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub is_mobile: bool,

    // Attribution
    pub referrer_url: Option<String>,
    pub landing_page: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,

    // Counters
    pub total_messages: i64,
    pub user_messages: i64,
    pub assistant_messages: i64,
    pub total_tokens: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_cost_eur: f64,
    pub total_cost_usd: f64,
    /// Average assistant response latency, when the widget measured it
    pub average_response_time_ms: Option<f64>,
    /// `ended_at - started_at` in whole seconds, never negative
    pub session_duration_seconds: Option<i64>,

    pub status: SessionStatus,
    /// End reason as the widget reported it (`user_closed`, `timeout`, ...)
    pub end_reason: Option<String>,
    pub easter_eggs_triggered: i64,

    // Asset load telemetry
    pub asset_source: Option<String>,
    pub asset_transfer_size: Option<i64>,

    /// Full transcript, when the source embeds one
    pub transcript: Vec<TranscriptEntry>,
}

impl Session {
    /// Calendar date of the session start, in the zone the source encoded.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.started_at.map(|ts| ts.date_naive())
    }
}

// ============================================
// Session analyses
// ============================================

/// Overall visitor sentiment of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(format!("unknown sentiment: {}", s)),
        }
    }
}

/// Whether the assistant resolved the visitor's request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    Partial,
    Unresolved,
}

impl ResolutionStatus {
    pub const ALL: [ResolutionStatus; 3] = [
        ResolutionStatus::Resolved,
        ResolutionStatus::Partial,
        ResolutionStatus::Unresolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Resolved => "resolved",
            ResolutionStatus::Partial => "partial",
            ResolutionStatus::Unresolved => "unresolved",
        }
    }
}

impl std::str::FromStr for ResolutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resolved" => Ok(ResolutionStatus::Resolved),
            "partial" => Ok(ResolutionStatus::Partial),
            "unresolved" => Ok(ResolutionStatus::Unresolved),
            _ => Err(format!("unknown resolution status: {}", s)),
        }
    }
}

/// How engaged the visitor was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    pub const ALL: [EngagementLevel; 3] = [
        EngagementLevel::Low,
        EngagementLevel::Medium,
        EngagementLevel::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::Low => "low",
            EngagementLevel::Medium => "medium",
            EngagementLevel::High => "high",
        }
    }
}

impl std::str::FromStr for EngagementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(EngagementLevel::Low),
            "medium" => Ok(EngagementLevel::Medium),
            "high" => Ok(EngagementLevel::High),
            _ => Err(format!("unknown engagement level: {}", s)),
        }
    }
}

/// Whether the visitor was chatting or pursuing a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    Casual,
    GoalDriven,
}

impl ConversationType {
    pub const ALL: [ConversationType; 2] = [ConversationType::Casual, ConversationType::GoalDriven];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Casual => "casual",
            ConversationType::GoalDriven => "goal_driven",
        }
    }
}

impl std::str::FromStr for ConversationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "casual" => Ok(ConversationType::Casual),
            "goal_driven" | "goal-driven" => Ok(ConversationType::GoalDriven),
            _ => Err(format!("unknown conversation type: {}", s)),
        }
    }
}

/// Category used when an analysis has none.
pub const UNKNOWN: &str = "Unknown";

/// Offline enrichment of a single session.
///
/// Produced asynchronously by an external analysis job, so a session may
/// not have one yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    /// Session this analysis belongs to (unique)
    pub session_id: String,
    /// When the analysis job wrote this record
    pub created_at: Option<Timestamp>,
    pub sentiment: Option<Sentiment>,
    /// Free-text category, [`UNKNOWN`] when absent
    pub category: String,
    pub resolution_status: Option<ResolutionStatus>,
    pub escalated: bool,
    pub language: Option<String>,
    /// Questions the visitor asked
    pub questions: Vec<String>,
    /// Questions the assistant could not answer
    pub unanswered_questions: Vec<String>,
    /// Outbound links surfaced to the visitor
    pub urls: Vec<String>,
    /// Outbound email addresses surfaced to the visitor
    pub emails: Vec<String>,
    pub engagement: Option<EngagementLevel>,
    pub conversation_type: Option<ConversationType>,

    // Analysis-stage usage, separate from chat-stage counters
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cost_eur: f64,
    pub cost_usd: f64,
}

impl SessionAnalysis {
    /// Unanswered questions that never appear in `questions`.
    ///
    /// The analysis job does not guarantee the subset relation; a non-empty
    /// result is tolerated but worth flagging.
    pub fn stray_unanswered_questions(&self) -> Vec<&str> {
        self.unanswered_questions
            .iter()
            .filter(|q| !self.questions.contains(q))
            .map(String::as_str)
            .collect()
    }

    /// Calendar date the analysis was created, in the encoded zone.
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.date_naive())
    }
}

/// A session left-joined with its (optional) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWithAnalysis {
    pub session: Session,
    pub analysis: Option<SessionAnalysis>,
}

// ============================================
// Messages
// ============================================

/// One turn of a session transcript, with animation telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub session_id: String,
    pub author: Author,
    pub message: String,
    pub timestamp: Option<Timestamp>,
    pub response_time_ms: Option<f64>,
    /// Animation played with a bot response
    pub response_animation: Option<String>,
    /// Easter-egg animation id, when one is attached
    pub easter_egg_animation: Option<String>,
    pub easter_egg_triggered: bool,
    /// Wait sequence played while the response was generated
    pub wait_sequence: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
    pub cost_eur: Option<f64>,
}

// ============================================
// Query filters
// ============================================

/// A `[start, end)` instant range; a missing bound is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl DateRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A range with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `ts` falls inside the range.
    ///
    /// A missing timestamp only matches an unbounded range.
    pub fn contains(&self, ts: Option<&Timestamp>) -> bool {
        let Some(ts) = ts else {
            return self.is_unbounded();
        };
        if let Some(start) = &self.start {
            if ts < start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if ts >= end {
                return false;
            }
        }
        true
    }
}

/// Narrowing applied to session and analysis queries.
///
/// All present fields are ANDed; an absent field imposes no restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSessionFilters {
    pub date_range: DateRange,
    pub sentiment: Option<Sentiment>,
    pub category: Option<String>,
    pub resolution: Option<ResolutionStatus>,
    pub escalated: Option<bool>,
    pub language: Option<String>,
    pub device_type: Option<String>,
    pub country: Option<String>,
}

impl ChatSessionFilters {
    /// Filters that only restrict the date range.
    pub fn for_range(date_range: DateRange) -> Self {
        Self {
            date_range,
            ..Default::default()
        }
    }

    /// True when any filter needs the session's analysis to decide.
    pub fn has_analysis_filters(&self) -> bool {
        self.sentiment.is_some()
            || self.category.is_some()
            || self.resolution.is_some()
            || self.escalated.is_some()
            || self.language.is_some()
    }

    /// Session-level equality filters (device type, country).
    pub fn matches_session(&self, session: &Session) -> bool {
        matches_opt(&self.device_type, session.device_type.as_deref())
            && matches_opt(&self.country, session.country.as_deref())
    }

    /// Analysis-level equality filters.
    ///
    /// A missing analysis fails every analysis-level filter that is set.
    pub fn matches_analysis(&self, analysis: Option<&SessionAnalysis>) -> bool {
        if !self.has_analysis_filters() {
            return true;
        }
        let Some(analysis) = analysis else {
            return false;
        };
        self.sentiment.map_or(true, |s| analysis.sentiment == Some(s))
            && self
                .category
                .as_deref()
                .map_or(true, |c| analysis.category == c)
            && self
                .resolution
                .map_or(true, |r| analysis.resolution_status == Some(r))
            && self.escalated.map_or(true, |e| analysis.escalated == e)
            && matches_opt(&self.language, analysis.language.as_deref())
    }
}

fn matches_opt(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match wanted {
        Some(w) => actual == Some(w.as_str()),
        None => true,
    }
}
