//! Embedded fixture dataset field tables
//!
//! The demo dataset is a flat export from the chat widget: combined
//! browser/OS strings, raw visitor IPs, and a status spread over
//! `end_reason` and `is_active`.
//!
//! ```json
//! {
//!   "session_id": "demo-s-001",
//!   "mascot_id": "demo-mascot-1",
//!   "client_id": "demo-client",
//!   "session_start": "2024-05-01T09:15:00+02:00",
//!   "browser": "Chrome 124.0",
//!   "ip_address": "84.115.12.34",
//!   "total_user_messages": 4,
//!   "total_bot_messages": 4,
//!   "end_reason": "user_closed"
//! }
//! ```

use crate::ingest::mapper::{AnalysisFields, MessageFields, Rule, SessionFields, SourceSchema};

pub const SESSIONS: SessionFields = SessionFields {
    id: Rule::Field("session_id"),
    assistant_id: Rule::Field("mascot_id"),
    tenant_id: Rule::Field("client_id"),
    started_at: Rule::Field("session_start"),
    ended_at: Rule::Field("session_end"),
    first_message_at: Rule::Field("first_message_at"),
    last_message_at: Rule::Field("last_message_at"),
    visitor_ip_hash: Rule::MaskedIp("ip_address"),
    country: Rule::Field("country"),
    city: Rule::Field("city"),
    device_type: Rule::Field("device_type"),
    browser_name: Rule::Head("browser"),
    browser_version: Rule::Tail("browser"),
    os_name: Rule::Head("os"),
    os_version: Rule::Tail("os"),
    is_mobile: Rule::Absent,
    referrer_url: Rule::Field("referrer"),
    landing_page: Rule::Field("landing_page"),
    utm_source: Rule::Field("utm_source"),
    utm_medium: Rule::Field("utm_medium"),
    utm_campaign: Rule::Field("utm_campaign"),
    utm_term: Rule::Field("utm_term"),
    utm_content: Rule::Field("utm_content"),
    total_messages: Rule::Absent,
    user_messages: Rule::Field("total_user_messages"),
    assistant_messages: Rule::Field("total_bot_messages"),
    total_tokens: Rule::Field("total_tokens"),
    input_tokens: Rule::Field("total_input_tokens"),
    output_tokens: Rule::Field("total_output_tokens"),
    total_cost_eur: Rule::Field("total_cost_eur"),
    total_cost_usd: Rule::Field("total_cost_usd"),
    average_response_time_ms: Rule::Field("avg_response_time_ms"),
    session_duration_seconds: Rule::Absent,
    status: Rule::Absent,
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
    urls: Rule::Field("urls"),
    emails: Rule::Field("emails"),
    engagement: Rule::Field("engagement"),
    conversation_type: Rule::Field("conversation_type"),
    prompt_tokens: Rule::Field("prompt_tokens"),
    completion_tokens: Rule::Field("completion_tokens"),
    total_tokens: Rule::Absent,
    cost_eur: Rule::Field("cost_eur"),
    cost_usd: Rule::Field("cost_usd"),
};

pub const MESSAGES: MessageFields = MessageFields {
    session_id: Rule::Field("session_id"),
    author: Rule::Field("author"),
    message: Rule::Field("message"),
    timestamp: Rule::Field("timestamp"),
    response_time_ms: Rule::Field("response_time_ms"),
    response_animation: Rule::Field("response_animation"),
    easter_egg_animation: Rule::Field("easter_egg_animation"),
    easter_egg_triggered: Rule::Field("is_easter_egg"),
    wait_sequence: Rule::Field("wait_sequence"),
    input_tokens: Rule::Field("input_tokens"),
    output_tokens: Rule::Field("output_tokens"),
    total_tokens: Rule::Field("total_tokens"),
    cost_eur: Rule::Field("cost_eur"),
};

pub const FIXTURE_SCHEMA: SourceSchema = SourceSchema {
    name: "fixture",
    sessions: SESSIONS,
    analyses: ANALYSES,
    messages: MESSAGES,
};
