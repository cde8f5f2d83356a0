//! Live store field tables
//!
//! The live store keeps the widget data already split into columns
//! (`browser_name`, `browser_version`), a pre-masked `visitor_ip_hash`,
//! and an explicit `status` column on newer rows.

use crate::ingest::mapper::{AnalysisFields, MessageFields, Rule, SessionFields, SourceSchema};

/// Table holding one row per chat session.
pub const SESSIONS_TABLE: &str = "chat_sessions";
/// Table holding one row per session analysis.
pub const ANALYSES_TABLE: &str = "chat_session_analyses";
/// Table holding one row per chat message.
pub const MESSAGES_TABLE: &str = "chat_messages";

pub const SESSIONS: SessionFields = SessionFields {
    id: Rule::Field("id"),
    assistant_id: Rule::Field("mascot_id"),
    tenant_id: Rule::Field("client_id"),
    started_at: Rule::Field("session_started_at"),
    ended_at: Rule::Field("session_ended_at"),
    first_message_at: Rule::Field("first_message_at"),
    last_message_at: Rule::Field("last_message_at"),
    visitor_ip_hash: Rule::Field("visitor_ip_hash"),
    country: Rule::Field("visitor_country"),
    city: Rule::Field("visitor_city"),
    device_type: Rule::Field("device_type"),
    browser_name: Rule::Field("browser_name"),
    browser_version: Rule::Field("browser_version"),
    os_name: Rule::Field("os_name"),
    os_version: Rule::Field("os_version"),
    is_mobile: Rule::Field("is_mobile"),
    referrer_url: Rule::Field("referrer_url"),
    landing_page: Rule::Field("landing_page"),
    utm_source: Rule::Field("utm_source"),
    utm_medium: Rule::Field("utm_medium"),
    utm_campaign: Rule::Field("utm_campaign"),
    utm_term: Rule::Field("utm_term"),
    utm_content: Rule::Field("utm_content"),
    total_messages: Rule::Field("total_messages"),
    user_messages: Rule::Field("user_messages"),
    assistant_messages: Rule::Field("assistant_messages"),
    total_tokens: Rule::Field("total_tokens"),
    input_tokens: Rule::Field("input_tokens"),
    output_tokens: Rule::Field("output_tokens"),
    total_cost_eur: Rule::Field("total_cost_eur"),
    total_cost_usd: Rule::Field("total_cost_usd"),
    average_response_time_ms: Rule::Field("average_response_time_ms"),
    session_duration_seconds: Rule::Field("session_duration_seconds"),
    status: Rule::Field("status"),
    end_reason: Rule::Field("end_reason"),
    is_active: Rule::Field("is_active"),
    easter_eggs_triggered: Rule::Field("easter_eggs_triggered"),
    asset_source: Rule::Field("glb_source"),
    asset_transfer_size: Rule::Field("glb_transfer_size"),
    transcript: Rule::Field("full_transcript"),
};

pub const ANALYSES: AnalysisFields = AnalysisFields {
    session_id: Rule::Field("session_id"),
    created_at: Rule::Field("created_at"),
    sentiment: Rule::Field("sentiment"),
    category: Rule::Field("category"),
    resolution_status: Rule::Field("resolution_status"),
    escalated: Rule::Field("escalated"),
    language: Rule::Field("language"),
    questions: Rule::Field("questions"),
    unanswered_questions: Rule::Field("unanswered_questions"),
    urls: Rule::Field("url_links"),
    emails: Rule::Field("email_links"),
    engagement: Rule::Field("engagement_level"),
    conversation_type: Rule::Field("conversation_type"),
    prompt_tokens: Rule::Field("analysis_prompt_tokens"),
    completion_tokens: Rule::Field("analysis_completion_tokens"),
    total_tokens: Rule::Field("analysis_total_tokens"),
    cost_eur: Rule::Field("analysis_cost_eur"),
    cost_usd: Rule::Field("analysis_cost_usd"),
};

pub const MESSAGES: MessageFields = MessageFields {
    session_id: Rule::Field("session_id"),
    author: Rule::Field("role"),
    message: Rule::Field("content"),
    timestamp: Rule::Field("created_at"),
    response_time_ms: Rule::Field("response_time_ms"),
    response_animation: Rule::Field("response_animation"),
    easter_egg_animation: Rule::Field("easter_egg_animation"),
    easter_egg_triggered: Rule::Field("easter_egg_triggered"),
    wait_sequence: Rule::Field("wait_sequence"),
    input_tokens: Rule::Field("prompt_tokens"),
    output_tokens: Rule::Field("completion_tokens"),
    total_tokens: Rule::Field("total_tokens"),
    cost_eur: Rule::Field("cost_eur"),
};

pub const LIVE_SCHEMA: SourceSchema = SourceSchema {
    name: "live",
    sessions: SESSIONS,
    analyses: ANALYSES,
    messages: MESSAGES,
};

/// Column read by a direct rule. A derived rule fails to compile.
const fn column(rule: Rule) -> &'static str {
    match rule {
        Rule::Field(key) => key,
        _ => panic!("live query columns must be direct fields"),
    }
}

// Columns the live repository filters and orders on
pub const SESSION_ID_COLUMN: &str = column(SESSIONS.id);
pub const ASSISTANT_COLUMN: &str = column(SESSIONS.assistant_id);
pub const TENANT_COLUMN: &str = column(SESSIONS.tenant_id);
pub const DEVICE_TYPE_COLUMN: &str = column(SESSIONS.device_type);
pub const COUNTRY_COLUMN: &str = column(SESSIONS.country);
pub const ANALYSIS_SESSION_COLUMN: &str = column(ANALYSES.session_id);
pub const MESSAGE_SESSION_COLUMN: &str = column(MESSAGES.session_id);
/// Primary key of the messages table. Only used to make paging order total.
pub const MESSAGE_ID_COLUMN: &str = "id";

/// Live column the date range and ordering apply to, per table.
pub fn timestamp_column(table: &str) -> &'static str {
    match table {
        SESSIONS_TABLE => column(SESSIONS.started_at),
        ANALYSES_TABLE => column(ANALYSES.created_at),
        _ => column(MESSAGES.timestamp),
    }
}
