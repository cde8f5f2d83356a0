//! Canonical record mapper
//!
//! Every backing store hands us JSON objects whose field names differ
//! (`session_start` vs `session_started_at`, `total_bot_messages` vs
//! `assistant_messages`, ...). Each source declares a field table
//! ([`SessionFields`], [`AnalysisFields`], [`MessageFields`]) made of
//! [`Rule`]s, and the mapper evaluates that table against a [`RawRow`].
//!
//! ## Error Handling
//!
//! Mapping never fails. Missing or malformed fields degrade to their
//! documented default (`None`, `0`, `false`, empty list), and a bad
//! timestamp only costs the derived duration.

use crate::types::{
    Author, ChatMessage, Session, SessionAnalysis, SessionStatus, Timestamp, TranscriptEntry,
    UNKNOWN,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

// ============================================
// Raw rows
// ============================================

/// One raw record as delivered by a backing store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Field value, with JSON `null` treated as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Non-empty text. Numbers and booleans are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Integer value; floats are rounded and numeric strings parsed.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
            }
            _ => None,
        }
    }

    /// Floating point value; numeric strings are parsed.
    pub fn float(&self, key: &str) -> Option<f64> {
        let value = match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|f| f.is_finite())
    }

    /// Boolean value; accepts `true`/`false`, `1`/`0` and their string forms.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// List of non-empty strings.
    ///
    /// Accepts a JSON array, or a string holding a JSON-encoded array (some
    /// exports double-encode list columns).
    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => string_items(items),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Array(items)) => string_items(&items),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Timestamp from an RFC 3339 / SQL string or epoch milliseconds.
    pub fn timestamp(&self, key: &str) -> Option<Timestamp> {
        match self.get(key)? {
            Value::String(s) => parse_timestamp(s),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.fixed_offset()),
            _ => None,
        }
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a timestamp string, keeping the offset it encodes.
///
/// Accepts RFC 3339, SQL-style `YYYY-MM-DD HH:MM:SS[.f][+HH[:MM]]`, and
/// naive date-times (read as `+00:00`).
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    None
}

/// Render a timestamp the way sources write them (`Z` for UTC).
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Mask the last IPv4 octet (or IPv6 group) with `xxx`.
pub fn mask_ip(ip: &str) -> String {
    if let Some((prefix, _)) = ip.rsplit_once('.') {
        format!("{}.xxx", prefix)
    } else if let Some((prefix, _)) = ip.rsplit_once(':') {
        format!("{}:xxx", prefix)
    } else {
        "xxx".to_string()
    }
}

/// Split `"Chrome 120.0"` into name and version at the first space.
///
/// The version is the remainder re-joined with single spaces, so
/// `"Mac OS X 10.15"` yields `("Mac", "OS X 10.15")`.
pub fn split_name_version(combined: &str) -> (Option<String>, Option<String>) {
    let mut words = combined.split_whitespace();
    let name = words.next().map(str::to_string);
    let rest: Vec<&str> = words.collect();
    let version = (!rest.is_empty()).then(|| rest.join(" "));
    (name, version)
}

/// Session duration in whole seconds, clamped at zero.
pub fn duration_seconds(start: Option<&Timestamp>, end: Option<&Timestamp>) -> Option<i64> {
    let (start, end) = (start?, end?);
    let millis = end.signed_duration_since(*start).num_milliseconds();
    Some(((millis as f64) / 1000.0).round().max(0.0) as i64)
}

// ============================================
// Field rules
// ============================================

/// How one canonical field is read from a source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The source never supplies this field
    Absent,
    /// Read the named field
    Field(&'static str),
    /// Read the first of several alternative fields that is present
    FirstOf(&'static [&'static str]),
    /// First word of a combined `"Name Version"` field
    Head(&'static str),
    /// Everything after the first word of a combined field
    Tail(&'static str),
    /// IP address field, masked with [`mask_ip`]
    MaskedIp(&'static str),
}

impl Rule {
    /// The source field written back by a projection, for direct rules.
    pub fn direct_key(&self) -> Option<&'static str> {
        match self {
            Rule::Field(key) => Some(*key),
            Rule::FirstOf(keys) => keys.first().copied(),
            _ => None,
        }
    }

    fn scalar<T>(&self, row: &RawRow, get: impl Fn(&RawRow, &str) -> Option<T>) -> Option<T> {
        match self {
            Rule::Field(key) => get(row, *key),
            Rule::FirstOf(keys) => keys.iter().find_map(|key| get(row, *key)),
            _ => None,
        }
    }

    pub fn text(&self, row: &RawRow) -> Option<String> {
        match self {
            Rule::Absent => None,
            Rule::Field(_) | Rule::FirstOf(_) => self.scalar(row, RawRow::text),
            Rule::Head(key) => row.text(key).and_then(|s| split_name_version(&s).0),
            Rule::Tail(key) => row.text(key).and_then(|s| split_name_version(&s).1),
            Rule::MaskedIp(key) => row.text(key).map(|ip| mask_ip(&ip)),
        }
    }

    pub fn int(&self, row: &RawRow) -> Option<i64> {
        self.scalar(row, RawRow::int)
    }

    pub fn float(&self, row: &RawRow) -> Option<f64> {
        self.scalar(row, RawRow::float)
    }

    pub fn flag(&self, row: &RawRow) -> Option<bool> {
        self.scalar(row, RawRow::flag)
    }

    pub fn timestamp(&self, row: &RawRow) -> Option<Timestamp> {
        self.scalar(row, RawRow::timestamp)
    }

    pub fn strings(&self, row: &RawRow) -> Vec<String> {
        self.scalar(row, |row, key| {
            let items = row.strings(key);
            (!items.is_empty()).then_some(items)
        })
        .unwrap_or_default()
    }

    fn value<'a>(&self, row: &'a RawRow) -> Option<&'a Value> {
        match self {
            Rule::Field(key) => row.get(key),
            Rule::FirstOf(keys) => keys.iter().find_map(|key| row.get(key)),
            _ => None,
        }
    }
}

/// Write `value` under the rule's direct key, skipping nulls and derived rules.
fn put(row: &mut RawRow, rule: Rule, value: Value) {
    if let Some(key) = rule.direct_key() {
        if !value.is_null() {
            row.insert(key, value);
        }
    }
}

/// Rejoin a name and version that a source stores as one `"Name Version"` field.
fn put_combined(row: &mut RawRow, rules: (Rule, Rule), parts: (Option<&str>, Option<&str>)) {
    let Rule::Head(key) = rules.0 else {
        return;
    };
    let combined = match parts {
        (Some(name), Some(version)) if rules.1 == Rule::Tail(key) => format!("{} {}", name, version),
        (Some(name), _) => name.to_string(),
        (None, _) => return,
    };
    row.insert(key, Value::String(combined));
}

fn ts_value(ts: Option<&Timestamp>) -> Value {
    ts.map_or(Value::Null, |ts| Value::String(format_timestamp(ts)))
}

// ============================================
// Sessions
// ============================================

/// Field table for session rows.
#[derive(Debug, Clone, Copy)]
pub struct SessionFields {
    pub id: Rule,
    pub assistant_id: Rule,
    pub tenant_id: Rule,
    pub started_at: Rule,
    pub ended_at: Rule,
    pub first_message_at: Rule,
    pub last_message_at: Rule,
    pub visitor_ip_hash: Rule,
    pub country: Rule,
    pub city: Rule,
    pub device_type: Rule,
    pub browser_name: Rule,
    pub browser_version: Rule,
    pub os_name: Rule,
    pub os_version: Rule,
    pub is_mobile: Rule,
    pub referrer_url: Rule,
    pub landing_page: Rule,
    pub utm_source: Rule,
    pub utm_medium: Rule,
    pub utm_campaign: Rule,
    pub utm_term: Rule,
    pub utm_content: Rule,
    pub total_messages: Rule,
    pub user_messages: Rule,
    pub assistant_messages: Rule,
    pub total_tokens: Rule,
    pub input_tokens: Rule,
    pub output_tokens: Rule,
    pub total_cost_eur: Rule,
    pub total_cost_usd: Rule,
    pub average_response_time_ms: Rule,
    pub session_duration_seconds: Rule,
    /// Canonical status, when the source stores it already derived
    pub status: Rule,
    pub end_reason: Rule,
    pub is_active: Rule,
    pub easter_eggs_triggered: Rule,
    pub asset_source: Rule,
    pub asset_transfer_size: Rule,
    pub transcript: Rule,
}

impl SessionFields {
    /// Map a raw row to a canonical [`Session`].
    pub fn map(&self, row: &RawRow) -> Session {
        let started_at = self.started_at.timestamp(row);
        let ended_at = self.ended_at.timestamp(row);

        let user_messages = self.user_messages.int(row).unwrap_or(0);
        let assistant_messages = self.assistant_messages.int(row).unwrap_or(0);
        let input_tokens = self.input_tokens.int(row).unwrap_or(0);
        let output_tokens = self.output_tokens.int(row).unwrap_or(0);

        let device_type = self.device_type.text(row);
        let is_mobile = self.is_mobile.flag(row).unwrap_or_else(|| {
            device_type
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case("mobile"))
        });

        let end_reason = self.end_reason.text(row);
        let status = self
            .status
            .text(row)
            .and_then(|s| s.parse::<SessionStatus>().ok())
            .unwrap_or_else(|| {
                SessionStatus::derive(end_reason.as_deref(), self.is_active.flag(row))
            });

        let session_duration_seconds = self
            .session_duration_seconds
            .int(row)
            .map(|secs| secs.max(0))
            .or_else(|| duration_seconds(started_at.as_ref(), ended_at.as_ref()));

        Session {
            id: self.id.text(row).unwrap_or_default(),
            assistant_id: self.assistant_id.text(row).unwrap_or_default(),
            tenant_id: self.tenant_id.text(row).unwrap_or_default(),
            started_at,
            ended_at,
            first_message_at: self.first_message_at.timestamp(row),
            last_message_at: self.last_message_at.timestamp(row),
            visitor_ip_hash: self.visitor_ip_hash.text(row),
            country: self.country.text(row),
            city: self.city.text(row),
            device_type,
            browser_name: self.browser_name.text(row),
            browser_version: self.browser_version.text(row),
            os_name: self.os_name.text(row),
            os_version: self.os_version.text(row),
            is_mobile,
            referrer_url: self.referrer_url.text(row),
            landing_page: self.landing_page.text(row),
            utm_source: self.utm_source.text(row),
            utm_medium: self.utm_medium.text(row),
            utm_campaign: self.utm_campaign.text(row),
            utm_term: self.utm_term.text(row),
            utm_content: self.utm_content.text(row),
            total_messages: self
                .total_messages
                .int(row)
                .unwrap_or(user_messages.saturating_add(assistant_messages)),
            user_messages,
            assistant_messages,
            total_tokens: self
                .total_tokens
                .int(row)
                .unwrap_or(input_tokens.saturating_add(output_tokens)),
            input_tokens,
            output_tokens,
            total_cost_eur: self.total_cost_eur.float(row).unwrap_or(0.0),
            total_cost_usd: self.total_cost_usd.float(row).unwrap_or(0.0),
            average_response_time_ms: self.average_response_time_ms.float(row),
            session_duration_seconds,
            status,
            end_reason,
            easter_eggs_triggered: self.easter_eggs_triggered.int(row).unwrap_or(0),
            asset_source: self.asset_source.text(row),
            asset_transfer_size: self.asset_transfer_size.int(row),
            transcript: self
                .transcript
                .value(row)
                .map(map_transcript)
                .unwrap_or_default(),
        }
    }

    /// Write a session back under this source's field names.
    ///
    /// Re-mapping the result yields the same session. The raw IP is the one
    /// value that cannot be recovered: the masked form is written in its
    /// place.
    pub fn project(&self, session: &Session) -> RawRow {
        let mut row = RawRow::default();
        put(&mut row, self.id, json!(session.id));
        put(&mut row, self.assistant_id, json!(session.assistant_id));
        put(&mut row, self.tenant_id, json!(session.tenant_id));
        put(&mut row, self.started_at, ts_value(session.started_at.as_ref()));
        put(&mut row, self.ended_at, ts_value(session.ended_at.as_ref()));
        put(&mut row, self.first_message_at, ts_value(session.first_message_at.as_ref()));
        put(&mut row, self.last_message_at, ts_value(session.last_message_at.as_ref()));
        put(&mut row, self.visitor_ip_hash, json!(session.visitor_ip_hash));
        put(&mut row, self.country, json!(session.country));
        put(&mut row, self.city, json!(session.city));
        put(&mut row, self.device_type, json!(session.device_type));
        put(&mut row, self.browser_name, json!(session.browser_name));
        put(&mut row, self.browser_version, json!(session.browser_version));
        put(&mut row, self.os_name, json!(session.os_name));
        put(&mut row, self.os_version, json!(session.os_version));
        put(&mut row, self.is_mobile, json!(session.is_mobile));
        put(&mut row, self.referrer_url, json!(session.referrer_url));
        put(&mut row, self.landing_page, json!(session.landing_page));
        put(&mut row, self.utm_source, json!(session.utm_source));
        put(&mut row, self.utm_medium, json!(session.utm_medium));
        put(&mut row, self.utm_campaign, json!(session.utm_campaign));
        put(&mut row, self.utm_term, json!(session.utm_term));
        put(&mut row, self.utm_content, json!(session.utm_content));
        put(&mut row, self.total_messages, json!(session.total_messages));
        put(&mut row, self.user_messages, json!(session.user_messages));
        put(&mut row, self.assistant_messages, json!(session.assistant_messages));
        put(&mut row, self.total_tokens, json!(session.total_tokens));
        put(&mut row, self.input_tokens, json!(session.input_tokens));
        put(&mut row, self.output_tokens, json!(session.output_tokens));
        put(&mut row, self.total_cost_eur, json!(session.total_cost_eur));
        put(&mut row, self.total_cost_usd, json!(session.total_cost_usd));
        put(&mut row, self.average_response_time_ms, json!(session.average_response_time_ms));
        put(&mut row, self.session_duration_seconds, json!(session.session_duration_seconds));
        put(&mut row, self.status, json!(session.status.as_str()));
        put(&mut row, self.is_active, json!(session.status == SessionStatus::Active));
        let end_reason = session.end_reason.clone().or_else(|| match session.status {
            SessionStatus::Timeout | SessionStatus::Error => Some(session.status.to_string()),
            SessionStatus::Active | SessionStatus::Ended => None,
        });
        put(&mut row, self.end_reason, json!(end_reason));
        put_combined(
            &mut row,
            (self.browser_name, self.browser_version),
            (session.browser_name.as_deref(), session.browser_version.as_deref()),
        );
        put_combined(
            &mut row,
            (self.os_name, self.os_version),
            (session.os_name.as_deref(), session.os_version.as_deref()),
        );
        if let Rule::MaskedIp(key) = self.visitor_ip_hash {
            if let Some(masked) = &session.visitor_ip_hash {
                row.insert(key, json!(masked));
            }
        }
        put(&mut row, self.easter_eggs_triggered, json!(session.easter_eggs_triggered));
        put(&mut row, self.asset_source, json!(session.asset_source));
        put(&mut row, self.asset_transfer_size, json!(session.asset_transfer_size));
        if !session.transcript.is_empty() {
            let entries: Vec<Value> = session
                .transcript
                .iter()
                .map(|entry| {
                    json!({
                        "author": entry.author.as_str(),
                        "message": entry.message,
                        "timestamp": ts_value(entry.timestamp.as_ref()),
                    })
                })
                .collect();
            put(&mut row, self.transcript, Value::Array(entries));
        }
        row
    }
}

/// Transcript entries, accepting a few common key spellings.
///
/// Entries without a recognizable author are dropped.
fn map_transcript(value: &Value) -> Vec<TranscriptEntry> {
    let items = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    const AUTHOR: Rule = Rule::FirstOf(&["author", "role", "sender"]);
    const MESSAGE: Rule = Rule::FirstOf(&["message", "content", "text"]);
    const TIMESTAMP: Rule = Rule::FirstOf(&["timestamp", "created_at", "time"]);

    items
        .into_iter()
        .filter_map(RawRow::from_value)
        .filter_map(|entry| {
            let author = AUTHOR.text(&entry)?.parse::<Author>().ok()?;
            Some(TranscriptEntry {
                author,
                message: MESSAGE.text(&entry).unwrap_or_default(),
                timestamp: TIMESTAMP.timestamp(&entry),
            })
        })
        .collect()
}

// ============================================
// Session analyses
// ============================================

/// Field table for session analysis rows.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisFields {
    pub session_id: Rule,
    pub created_at: Rule,
    pub sentiment: Rule,
    pub category: Rule,
    pub resolution_status: Rule,
    pub escalated: Rule,
    pub language: Rule,
    pub questions: Rule,
    pub unanswered_questions: Rule,
    pub urls: Rule,
    pub emails: Rule,
    pub engagement: Rule,
    pub conversation_type: Rule,
    pub prompt_tokens: Rule,
    pub completion_tokens: Rule,
    pub total_tokens: Rule,
    pub cost_eur: Rule,
    pub cost_usd: Rule,
}

impl AnalysisFields {
    /// Map a raw row to a canonical [`SessionAnalysis`].
    pub fn map(&self, row: &RawRow) -> SessionAnalysis {
        let prompt_tokens = self.prompt_tokens.int(row);
        let completion_tokens = self.completion_tokens.int(row);
        let total_tokens = self
            .total_tokens
            .int(row)
            .or_else(|| combine_tokens(prompt_tokens, completion_tokens));

        SessionAnalysis {
            session_id: self.session_id.text(row).unwrap_or_default(),
            created_at: self.created_at.timestamp(row),
            sentiment: self.sentiment.text(row).and_then(|s| s.parse().ok()),
            category: self
                .category
                .text(row)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            resolution_status: self.resolution_status.text(row).and_then(|s| s.parse().ok()),
            escalated: self.escalated.flag(row).unwrap_or(false),
            language: self.language.text(row),
            questions: self.questions.strings(row),
            unanswered_questions: self.unanswered_questions.strings(row),
            urls: self.urls.strings(row),
            emails: self.emails.strings(row),
            engagement: self.engagement.text(row).and_then(|s| s.parse().ok()),
            conversation_type: self.conversation_type.text(row).and_then(|s| s.parse().ok()),
            prompt_tokens,
            completion_tokens,
            total_tokens,
            cost_eur: self.cost_eur.float(row).unwrap_or(0.0),
            cost_usd: self.cost_usd.float(row).unwrap_or(0.0),
        }
    }

    /// Write an analysis back under this source's direct field names.
    pub fn project(&self, analysis: &SessionAnalysis) -> RawRow {
        let mut row = RawRow::default();
        put(&mut row, self.session_id, json!(analysis.session_id));
        put(&mut row, self.created_at, ts_value(analysis.created_at.as_ref()));
        put(&mut row, self.sentiment, json!(analysis.sentiment.map(|s| s.as_str())));
        put(&mut row, self.category, json!(analysis.category));
        put(
            &mut row,
            self.resolution_status,
            json!(analysis.resolution_status.map(|r| r.as_str())),
        );
        put(&mut row, self.escalated, json!(analysis.escalated));
        put(&mut row, self.language, json!(analysis.language));
        put(&mut row, self.questions, json!(analysis.questions));
        put(&mut row, self.unanswered_questions, json!(analysis.unanswered_questions));
        put(&mut row, self.urls, json!(analysis.urls));
        put(&mut row, self.emails, json!(analysis.emails));
        put(&mut row, self.engagement, json!(analysis.engagement.map(|e| e.as_str())));
        put(
            &mut row,
            self.conversation_type,
            json!(analysis.conversation_type.map(|c| c.as_str())),
        );
        put(&mut row, self.prompt_tokens, json!(analysis.prompt_tokens));
        put(&mut row, self.completion_tokens, json!(analysis.completion_tokens));
        put(&mut row, self.total_tokens, json!(analysis.total_tokens));
        put(&mut row, self.cost_eur, json!(analysis.cost_eur));
        put(&mut row, self.cost_usd, json!(analysis.cost_usd));
        row
    }
}

/// Combined token count when no total is stored.
///
/// A missing half does not count as zero: with only one side present the
/// total is that side, and with neither it stays unknown.
pub fn combine_tokens(prompt: Option<i64>, completion: Option<i64>) -> Option<i64> {
    match (prompt, completion) {
        (Some(p), Some(c)) => Some(p.saturating_add(c)),
        (Some(p), None) => Some(p),
        (None, Some(c)) => Some(c),
        (None, None) => None,
    }
}

// ============================================
// Messages
// ============================================

/// Field table for chat message rows.
#[derive(Debug, Clone, Copy)]
pub struct MessageFields {
    pub session_id: Rule,
    pub author: Rule,
    pub message: Rule,
    pub timestamp: Rule,
    pub response_time_ms: Rule,
    pub response_animation: Rule,
    pub easter_egg_animation: Rule,
    pub easter_egg_triggered: Rule,
    pub wait_sequence: Rule,
    pub input_tokens: Rule,
    pub output_tokens: Rule,
    pub total_tokens: Rule,
    pub cost_eur: Rule,
}

impl MessageFields {
    /// Map a raw row to a canonical [`ChatMessage`].
    ///
    /// Rows without a recognizable author are attributed to the bot, since
    /// the widget only omits the author on generated turns.
    pub fn map(&self, row: &RawRow) -> ChatMessage {
        let easter_egg_animation = self.easter_egg_animation.text(row);
        let input_tokens = self.input_tokens.int(row);
        let output_tokens = self.output_tokens.int(row);

        ChatMessage {
            session_id: self.session_id.text(row).unwrap_or_default(),
            author: self
                .author
                .text(row)
                .and_then(|a| a.parse().ok())
                .unwrap_or(Author::Bot),
            message: self.message.text(row).unwrap_or_default(),
            timestamp: self.timestamp.timestamp(row),
            response_time_ms: self.response_time_ms.float(row),
            response_animation: self.response_animation.text(row),
            easter_egg_triggered: self
                .easter_egg_triggered
                .flag(row)
                .unwrap_or(easter_egg_animation.is_some()),
            easter_egg_animation,
            wait_sequence: self.wait_sequence.text(row),
            total_tokens: self
                .total_tokens
                .int(row)
                .or_else(|| combine_tokens(input_tokens, output_tokens)),
            input_tokens,
            output_tokens,
            cost_eur: self.cost_eur.float(row),
        }
    }

    /// Write a message back under this source's direct field names.
    pub fn project(&self, message: &ChatMessage) -> RawRow {
        let mut row = RawRow::default();
        put(&mut row, self.session_id, json!(message.session_id));
        put(&mut row, self.author, json!(message.author.as_str()));
        put(&mut row, self.message, json!(message.message));
        put(&mut row, self.timestamp, ts_value(message.timestamp.as_ref()));
        put(&mut row, self.response_time_ms, json!(message.response_time_ms));
        put(&mut row, self.response_animation, json!(message.response_animation));
        put(&mut row, self.easter_egg_animation, json!(message.easter_egg_animation));
        put(&mut row, self.easter_egg_triggered, json!(message.easter_egg_triggered));
        put(&mut row, self.wait_sequence, json!(message.wait_sequence));
        put(&mut row, self.input_tokens, json!(message.input_tokens));
        put(&mut row, self.output_tokens, json!(message.output_tokens));
        put(&mut row, self.total_tokens, json!(message.total_tokens));
        put(&mut row, self.cost_eur, json!(message.cost_eur));
        row
    }
}

// ============================================
// Source schema
// ============================================

/// The three field tables of one backing store.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    /// Short name used in logs
    pub name: &'static str,
    pub sessions: SessionFields,
    pub analyses: AnalysisFields,
    pub messages: MessageFields,
}

/// Split a JSON array into raw rows, skipping (and logging) non-objects.
pub fn rows_from_value(value: Value, source: &str) -> Vec<RawRow> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            tracing::warn!(source, kind = %json_kind(&other), "expected an array of rows");
            return Vec::new();
        }
    };

    let total = items.len();
    let rows: Vec<RawRow> = items.into_iter().filter_map(RawRow::from_value).collect();
    if rows.len() < total {
        tracing::warn!(
            source,
            skipped = total - rows.len(),
            "skipped rows that are not JSON objects"
        );
    }
    rows
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
