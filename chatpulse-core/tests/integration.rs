//! Integration tests for the analytics facade over injected fixture rows
//!
//! Rows are written in the fixture file layout and injected through
//! `FixtureSource::Rows`, so every test exercises mapping, the repository
//! filters, and aggregation end to end.

use std::sync::Arc;

use async_trait::async_trait;
use chatpulse_core::analytics::{self, AnimationStats, OverviewMetrics};
use chatpulse_core::config::LiveStoreConfig;
use chatpulse_core::ingest::{parse_timestamp, RawRow, FIXTURE_SCHEMA};
use chatpulse_core::store::FixtureSource;
use chatpulse_core::{
    AnalyticsBackend, AnalyticsOperations, BackendChoice, ChatMessage, ChatSessionFilters,
    DateRange, DemoTenants, FixtureStore, LiveStore, Result, Router, Session, SessionAnalysis,
    SessionStatus, SessionWithAnalysis, StoreScope,
};
use chrono::DateTime;
use serde_json::{json, Value};

fn rows(values: Vec<Value>) -> Vec<RawRow> {
    values.into_iter().filter_map(RawRow::from_value).collect()
}

fn ops(sessions: Vec<Value>, analyses: Vec<Value>, messages: Vec<Value>) -> AnalyticsOperations {
    let store = FixtureStore::new(FixtureSource::Rows {
        sessions: rows(sessions),
        analyses: rows(analyses),
        messages: rows(messages),
    });
    AnalyticsOperations::new(Arc::new(store))
}

fn session(id: &str, assistant: &str, started_at: &str) -> Value {
    json!({
        "session_id": id,
        "mascot_id": assistant,
        "client_id": "acme",
        "session_start": started_at,
        "is_active": false,
    })
}

fn day(date: &str) -> chatpulse_core::Timestamp {
    DateTime::parse_from_rfc3339(&format!("{date}T00:00:00Z")).unwrap()
}

// ============================================
// Aggregation scenarios
// ============================================

#[tokio::test]
async fn test_overview_scenario() {
    let mut s1 = session("s1", "bot", "2024-05-01T10:00:00Z");
    s1["total_tokens"] = json!(100);
    s1["total_cost_eur"] = json!(1.0);
    s1["avg_response_time_ms"] = json!(800);
    let mut s2 = session("s2", "bot", "2024-05-01T11:00:00Z");
    s2["total_tokens"] = json!(200);
    s2["total_cost_eur"] = json!(2.0);
    s2["avg_response_time_ms"] = json!(1200);
    let mut s3 = session("s3", "bot", "2024-05-01T12:00:00Z");
    s3["total_cost_eur"] = json!(0.5);

    let ops = ops(
        vec![s1, s2, s3],
        vec![json!({
            "session_id": "s1",
            "created_at": "2024-05-01T10:30:00Z",
            "resolution_status": "resolved",
        })],
        vec![],
    );

    let overview = ops
        .aggregations()
        .overview_by_assistant("bot", &DateRange::unbounded())
        .await
        .unwrap();

    assert_eq!(overview.total_sessions, 3);
    assert_eq!(overview.total_tokens, 300);
    assert!((overview.total_cost_eur - 3.5).abs() < 1e-9);
    assert!((overview.resolution_rate - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(overview.escalation_rate, 0.0);
    // The session without a measured latency is left out of the mean
    assert_eq!(overview.average_response_time_ms, 1000.0);
}

#[tokio::test]
async fn test_hourly_breakdown_scenario() {
    let ops = ops(
        vec![
            session("s1", "bot", "2024-05-01T00:05:00Z"),
            session("s2", "bot", "2024-05-02T00:55:00Z"),
            session("s3", "bot", "2024-05-02T23:10:00Z"),
        ],
        vec![],
        vec![],
    );

    let buckets = ops
        .aggregations()
        .hourly_breakdown_by_tenant("acme", &DateRange::unbounded())
        .await
        .unwrap();

    assert_eq!(buckets.len(), 24);
    assert_eq!(buckets[0].count, 2);
    assert_eq!(buckets[23].count, 1);
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 3);
    let total: f64 = buckets.iter().map(|b| b.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_question_analytics_scenario() {
    let ops = ops(
        vec![
            session("a", "bot", "2024-05-01T10:00:00Z"),
            session("b", "bot", "2024-05-01T11:00:00Z"),
        ],
        vec![
            json!({
                "session_id": "a",
                "created_at": "2024-05-01T10:30:00Z",
                "questions": ["refund policy", "shipping time"],
                "unanswered_questions": ["shipping time"],
            }),
            json!({
                "session_id": "b",
                "created_at": "2024-05-01T11:30:00Z",
                "questions": ["refund policy"],
            }),
        ],
        vec![],
    );

    let stats = ops
        .aggregations()
        .question_analytics_by_tenant("acme", &DateRange::unbounded())
        .await
        .unwrap();

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].question, "refund policy");
    assert_eq!(stats[0].frequency, 2);
    assert!(stats[0].answered);
    assert_eq!(stats[1].question, "shipping time");
    assert_eq!(stats[1].frequency, 1);
    assert!(!stats[1].answered);
}

#[tokio::test]
async fn test_empty_range_returns_zero_shapes() {
    let ops = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));
    let aggregations = ops.aggregations();
    let range = DateRange::new(day("2030-01-01"), day("2030-02-01"));

    let overview = aggregations.overview_by_tenant("demo-client", &range).await.unwrap();
    assert_eq!(overview, OverviewMetrics::default());

    let sentiment = aggregations
        .sentiment_breakdown_by_tenant("demo-client", &range)
        .await
        .unwrap();
    assert_eq!(sentiment.total(), 0);

    assert!(aggregations.category_breakdown_by_tenant("demo-client", &range).await.unwrap().is_empty());
    assert!(aggregations.country_breakdown_by_tenant("demo-client", &range).await.unwrap().is_empty());
    assert!(aggregations.time_series_by_tenant("demo-client", &range).await.unwrap().is_empty());
    assert!(aggregations.question_analytics_by_tenant("demo-client", &range).await.unwrap().is_empty());

    let hourly = aggregations.hourly_breakdown_by_tenant("demo-client", &range).await.unwrap();
    assert_eq!(hourly.len(), 24);
    assert!(hourly.iter().all(|b| b.count == 0 && b.percentage == 0.0));

    // Fixed buckets are still listed, at zero
    let status = aggregations.status_breakdown_by_tenant("demo-client", &range).await.unwrap();
    assert_eq!(status.len(), SessionStatus::ALL.len());
    assert!(status.iter().all(|e| e.count == 0 && e.percentage == 0.0));

    let animations = aggregations.animation_stats_by_tenant("demo-client", &range).await.unwrap();
    assert_eq!(animations, AnimationStats::default());
}

#[tokio::test]
async fn test_breakdowns_over_embedded_dataset() {
    let ops = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));
    let aggregations = ops.aggregations();
    let range = DateRange::unbounded();

    let countries = aggregations.country_breakdown_by_tenant("demo-client", &range).await.unwrap();
    assert_eq!(countries[0].key, "Austria");
    assert_eq!(countries[0].count, 4);
    assert!(countries.iter().any(|e| e.key == "Unknown" && e.count == 1));
    let total: f64 = countries.iter().map(|e| e.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);

    let sentiment = aggregations
        .sentiment_breakdown_by_tenant("demo-client", &range)
        .await
        .unwrap();
    assert_eq!((sentiment.positive, sentiment.neutral, sentiment.negative), (4, 3, 2));

    let mascot_two = aggregations
        .device_breakdown_by_assistant("demo-mascot-2", &range)
        .await
        .unwrap();
    assert_eq!(mascot_two.iter().map(|e| e.count).sum::<usize>(), 4);
}

#[tokio::test]
async fn test_date_range_is_half_open() {
    let ops = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));
    let sessions = ops.sessions();

    // 2024-05-02T00:00Z up to 2024-05-04T00:00Z
    let filters = ChatSessionFilters::for_range(DateRange::new(day("2024-05-02"), day("2024-05-04")));
    let in_range = sessions.by_tenant("demo-client", &filters).await.unwrap();
    let ids: Vec<&str> = in_range.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["demo-s-006", "demo-s-005", "demo-s-004", "demo-s-003"]);
}

// ============================================
// Repositories
// ============================================

#[tokio::test]
async fn test_sessions_with_analysis_is_a_left_join() {
    let ops = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));
    let joined = ops
        .sessions()
        .with_analysis_by_assistant("demo-mascot-1", &ChatSessionFilters::default())
        .await
        .unwrap();

    assert_eq!(joined.len(), 6);
    let without: Vec<&SessionWithAnalysis> = joined.iter().filter(|j| j.analysis.is_none()).collect();
    assert_eq!(without.len(), 1);
    assert_eq!(without[0].session.id, "demo-s-009");
}

#[tokio::test]
async fn test_lookup_by_id() {
    let ops = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));

    let session = ops.sessions().by_id("demo-s-004").await.unwrap().unwrap();
    assert_eq!(session.assistant_id, "demo-mascot-2");
    assert!(ops.sessions().by_id("missing").await.unwrap().is_none());
    assert!(ops.analyses().by_session_id("demo-s-009").await.unwrap().is_none());
}

// ============================================
// Unimplemented operations
// ============================================

/// Backend that serves sessions but never implemented message retrieval
struct SessionsOnly(FixtureStore);

#[async_trait]
impl AnalyticsBackend for SessionsOnly {
    fn name(&self) -> String {
        "sessions-only".to_string()
    }

    async fn sessions_by_assistant(&self, id: &str, filters: &ChatSessionFilters) -> Result<Vec<Session>> {
        self.0.sessions_by_assistant(id, filters).await
    }

    async fn sessions_by_tenant(&self, id: &str, filters: &ChatSessionFilters) -> Result<Vec<Session>> {
        self.0.sessions_by_tenant(id, filters).await
    }

    async fn session_by_id(&self, id: &str) -> Result<Option<Session>> {
        self.0.session_by_id(id).await
    }

    async fn sessions_with_analysis_by_assistant(
        &self,
        id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        self.0.sessions_with_analysis_by_assistant(id, filters).await
    }

    async fn sessions_with_analysis_by_tenant(
        &self,
        id: &str,
        filters: &ChatSessionFilters,
    ) -> Result<Vec<SessionWithAnalysis>> {
        self.0.sessions_with_analysis_by_tenant(id, filters).await
    }

    async fn analysis_by_session_id(&self, id: &str) -> Result<Option<SessionAnalysis>> {
        self.0.analysis_by_session_id(id).await
    }

    async fn analyses_by_assistant(&self, id: &str, filters: &ChatSessionFilters) -> Result<Vec<SessionAnalysis>> {
        self.0.analyses_by_assistant(id, filters).await
    }

    async fn analyses_by_tenant(&self, id: &str, filters: &ChatSessionFilters) -> Result<Vec<SessionAnalysis>> {
        self.0.analyses_by_tenant(id, filters).await
    }
}

#[tokio::test]
async fn test_unimplemented_messages_degrade_to_empty() {
    chatpulse_core::logging::init_test();
    let ops = AnalyticsOperations::new(Arc::new(SessionsOnly(FixtureStore::embedded())));

    let stats = ops
        .aggregations()
        .animation_stats_by_tenant("demo-client", &DateRange::unbounded())
        .await
        .unwrap();
    assert_eq!(stats, AnimationStats::default());

    // Every other aggregate still works
    let overview = ops
        .aggregations()
        .overview_by_tenant("demo-client", &DateRange::unbounded())
        .await
        .unwrap();
    assert_eq!(overview.total_sessions, 10);
}

// ============================================
// Router
// ============================================

fn unconfigured(scope: StoreScope) -> LiveStore {
    LiveStore::from_config(&LiveStoreConfig::unconfigured(scope))
}

#[tokio::test]
async fn test_router_sends_demo_tenants_to_fixtures() {
    let router = Router::with_backends(
        Arc::new(DemoTenants::new(vec!["showroom".to_string()], None)),
        FixtureStore::embedded(),
        unconfigured(StoreScope::Demo),
        LiveStore::from_config(&LiveStoreConfig::new(
            StoreScope::Production,
            "https://db.example.com/rest/v1",
            "key",
        )),
    );

    assert_eq!(router.choose("showroom"), BackendChoice::Fixtures);
    assert_eq!(router.choose("acme"), BackendChoice::Live(StoreScope::Production));
    assert_eq!(router.resolve("acme").backend_name(), "live:production");

    // Repeated resolution never changes the answer
    for _ in 0..3 {
        assert_eq!(router.resolve("showroom").backend_name(), "fixtures");
    }
}

#[tokio::test]
async fn test_router_accepts_closure_classifier() {
    let classifier = |tenant: &str| tenant.ends_with("-sandbox");
    let router = Router::with_backends(
        Arc::new(classifier),
        FixtureStore::embedded(),
        unconfigured(StoreScope::Demo),
        unconfigured(StoreScope::Production),
    );

    assert_eq!(router.choose("acme-sandbox"), BackendChoice::Fixtures);
    // Nothing live is configured, so real tenants fall back too
    assert_eq!(router.choose("acme"), BackendChoice::Fixtures);
}

#[tokio::test]
async fn test_router_resolves_assistant_through_fixture_tenant() {
    let router = Router::with_backends(
        Arc::new(DemoTenants::new(Vec::new(), Some("demo-".to_string()))),
        FixtureStore::embedded(),
        unconfigured(StoreScope::Demo),
        LiveStore::from_config(&LiveStoreConfig::new(
            StoreScope::Production,
            "https://db.example.com/rest/v1",
            "key",
        )),
    );

    assert_eq!(router.choose_for_assistant("demo-mascot-2").await, BackendChoice::Fixtures);
    assert_eq!(
        router.choose_for_assistant("acme-bot").await,
        BackendChoice::Live(StoreScope::Production)
    );
}

// ============================================
// Mapping
// ============================================

#[test]
fn test_fixture_mapping_is_idempotent() {
    let row = RawRow::from_value(json!({
        "session_id": "s1",
        "mascot_id": "bot",
        "client_id": "acme",
        "session_start": "2024-05-01T09:15:00+02:00",
        "session_end": "2024-05-01T09:20:00+02:00",
        "browser": "Firefox 125.0",
        "ip_address": "10.1.2.3",
        "total_user_messages": 3,
        "total_bot_messages": 3,
        "end_reason": "timeout",
    }))
    .unwrap();

    let first = FIXTURE_SCHEMA.sessions.map(&row);
    let second = FIXTURE_SCHEMA.sessions.map(&row);
    assert_eq!(first, second);

    assert_eq!(first.total_messages, 6);
    assert_eq!(first.session_duration_seconds, Some(300));
    assert_eq!(first.status, SessionStatus::Timeout);
    assert_eq!(first.browser_name.as_deref(), Some("Firefox"));
    assert_eq!(first.visitor_ip_hash.as_deref(), Some("10.1.2.xxx"));
}

/// Compare a supplied raw value with its projection.
///
/// Numbers compare by value (`850` and `850.0` agree) and timestamps by
/// instant and offset, since projections render them canonically.
fn assert_same(path: &str, supplied: &Value, projected: Option<&Value>) {
    let Some(projected) = projected else {
        panic!("{path}: supplied {supplied} but not projected");
    };
    match (supplied, projected) {
        (Value::Number(a), Value::Number(b)) => assert_eq!(a.as_f64(), b.as_f64(), "{path}"),
        (Value::String(a), Value::String(b)) if a != b => {
            let (a_ts, b_ts) = (parse_timestamp(a), parse_timestamp(b));
            assert!(a_ts.is_some(), "{path}: {a:?} != {b:?}");
            assert_eq!(a_ts, b_ts, "{path}");
            assert_eq!(a_ts.map(|t| *t.offset()), b_ts.map(|t| *t.offset()), "{path}");
        }
        (Value::Array(a), Value::Array(b)) => {
            assert_eq!(a.len(), b.len(), "{path}");
            for (i, (x, y)) in a.iter().zip(b).enumerate() {
                assert_same(&format!("{path}[{i}]"), x, Some(y));
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            for (key, value) in a.iter().filter(|(_, v)| !v.is_null()) {
                assert_same(&format!("{path}.{key}"), value, b.get(key));
            }
        }
        _ => assert_eq!(supplied, projected, "{path}"),
    }
}

fn embedded(json: &str) -> Vec<RawRow> {
    rows(serde_json::from_str::<Vec<Value>>(json).unwrap())
}

#[test]
fn test_fixture_projection_recovers_supplied_session_fields() {
    let row = RawRow::from_value(json!({
        "session_id": "s1",
        "mascot_id": "bot",
        "client_id": "acme",
        "session_start": "2024-05-01T09:15:00+02:00",
        "country": "Austria",
        "browser": "Firefox 125.0",
        "os": "Mac OS X 10.15",
        "ip_address": "10.1.2.3",
        "total_input_tokens": 120,
        "total_output_tokens": 80,
        "total_cost_eur": 0.02,
        "avg_response_time_ms": 850,
        "is_active": false,
    }))
    .unwrap();

    let session = FIXTURE_SCHEMA.sessions.map(&row);
    assert_eq!(session.status, SessionStatus::Ended);

    let projected = FIXTURE_SCHEMA.sessions.project(&session);
    for (key, value) in row.as_map().iter().filter(|(k, _)| *k != "ip_address") {
        assert_same(key, value, projected.get(key));
    }
    assert_eq!(projected.get("ip_address"), Some(&json!("10.1.2.xxx")));

    let again = FIXTURE_SCHEMA.sessions.map(&projected);
    assert_eq!(again, session);
    assert_eq!(again.status, SessionStatus::Ended);
    assert_eq!(again.os_name.as_deref(), Some("Mac"));
    assert_eq!(again.os_version.as_deref(), Some("OS X 10.15"));
}

#[test]
fn test_fixture_projection_derives_status_columns() {
    let mut session = FIXTURE_SCHEMA.sessions.map(
        &RawRow::from_value(json!({"session_id": "s1", "end_reason": "error"})).unwrap(),
    );
    assert_eq!(session.status, SessionStatus::Error);

    // A status that arrived without an end reason still survives the fixture layout
    session.end_reason = None;
    let projected = FIXTURE_SCHEMA.sessions.project(&session);
    assert_eq!(projected.get("end_reason"), Some(&json!("error")));
    assert_eq!(projected.get("is_active"), Some(&json!(false)));
    assert_eq!(FIXTURE_SCHEMA.sessions.map(&projected).status, SessionStatus::Error);
}

#[test]
fn test_embedded_rows_survive_projection() {
    let schema = &FIXTURE_SCHEMA;

    for row in embedded(include_str!("../fixtures/sessions.json")) {
        let session = schema.sessions.map(&row);
        let projected = schema.sessions.project(&session);
        for (key, value) in row.as_map().iter().filter(|(_, v)| !v.is_null()) {
            if key == "ip_address" {
                continue;
            }
            assert_same(&format!("{}.{key}", session.id), value, projected.get(key));
        }
        assert_eq!(schema.sessions.map(&projected), session);
    }

    for row in embedded(include_str!("../fixtures/session_analyses.json")) {
        let analysis = schema.analyses.map(&row);
        let projected = schema.analyses.project(&analysis);
        for (key, value) in row.as_map().iter().filter(|(_, v)| !v.is_null()) {
            assert_same(&format!("{}.{key}", analysis.session_id), value, projected.get(key));
        }
        assert_eq!(schema.analyses.map(&projected), analysis);
    }

    for row in embedded(include_str!("../fixtures/messages.json")) {
        let message = schema.messages.map(&row);
        let projected = schema.messages.project(&message);
        for (key, value) in row.as_map().iter().filter(|(_, v)| !v.is_null()) {
            assert_same(&format!("{}.{key}", message.session_id), value, projected.get(key));
        }
        assert_eq!(schema.messages.map(&projected), message);
    }
}

// ============================================
// Determinism
// ============================================

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap()
}

async fn every_aggregate(ops: &AnalyticsOperations, tenant: &str) -> Vec<String> {
    let agg = ops.aggregations();
    let range = DateRange::unbounded();
    vec![
        to_json(&agg.overview_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.sentiment_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.category_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.language_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.country_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.device_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.browser_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.status_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.resolution_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.engagement_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.conversation_type_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.time_series_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.sentiment_time_series_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.hourly_breakdown_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.question_analytics_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.unanswered_questions_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.outbound_links_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.animation_stats_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.usage_summary_by_tenant(tenant, &range).await.unwrap()),
        to_json(&agg.asset_load_stats_by_tenant(tenant, &range).await.unwrap()),
    ]
}

#[tokio::test]
async fn test_repeated_aggregation_is_byte_identical() {
    let ops = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));

    let first = every_aggregate(&ops, "demo-client").await;
    let second = every_aggregate(&ops, "demo-client").await;
    assert_eq!(first, second);

    // A fresh store maps the dataset again from scratch
    let fresh = AnalyticsOperations::new(Arc::new(FixtureStore::embedded()));
    assert_eq!(every_aggregate(&fresh, "demo-client").await, first);
}

/// The input in its original order, reversed, and rotated by a third.
fn orderings<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let original = items.to_vec();
    let mut reversed = original.clone();
    reversed.reverse();
    let mut rotated = original.clone();
    rotated.rotate_left(items.len() / 3);
    vec![original, reversed, rotated]
}

fn ranked_aggregates(
    sessions: &[Session],
    analyses: &[SessionAnalysis],
    messages: &[ChatMessage],
) -> Vec<String> {
    vec![
        to_json(&analytics::category_breakdown(analyses)),
        to_json(&analytics::language_breakdown(analyses)),
        to_json(&analytics::country_breakdown(sessions)),
        to_json(&analytics::device_breakdown(sessions)),
        to_json(&analytics::browser_breakdown(sessions)),
        to_json(&analytics::status_breakdown(sessions)),
        to_json(&analytics::question_analytics(analyses)),
        to_json(&analytics::unanswered_questions(analyses)),
        to_json(&analytics::outbound_links(analyses, 10)),
        to_json(&analytics::animation_stats(messages)),
        to_json(&analytics::asset_load_stats(sessions)),
    ]
}

#[tokio::test]
async fn test_ranked_aggregates_ignore_input_order() {
    let store = FixtureStore::embedded();
    let sessions = store.sessions().await.unwrap();
    let analyses = store.analyses().await.unwrap();
    let messages = store.messages().await.unwrap();

    let expected = ranked_aggregates(sessions, analyses, messages);
    for ((s, a), m) in orderings(sessions)
        .into_iter()
        .zip(orderings(analyses))
        .zip(orderings(messages))
    {
        assert_eq!(ranked_aggregates(&s, &a, &m), expected);
    }
}
