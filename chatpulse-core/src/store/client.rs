//! Client for the live store's PostgREST-style HTTP interface
//!
//! The live store exposes one endpoint per table (`GET {url}/{table}`) and
//! takes filters as query parameters:
//!
//! ```text
//! GET /chat_sessions?select=*&client_id=eq.acme&session_started_at=gte.2024-05-01T00:00:00Z&order=session_started_at.desc
//! ```
//!
//! [`LiveClient`] is the seam the live repository talks through;
//! [`HttpLiveClient`] implements it with reqwest and [`MemoryLiveClient`]
//! evaluates the same [`Query`] against rows held in memory.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;

use crate::config::LiveStoreConfig;
use crate::error::{Error, Result};
use crate::ingest::mapper::{parse_timestamp, rows_from_value, RawRow};

/// One column filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, String),
    /// `column >= value`
    Gte(String, String),
    /// `column < value`
    Lt(String, String),
    /// `column IN (values)`
    In(String, Vec<String>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::Gte(c, _) | Filter::Lt(c, _) | Filter::In(c, _) => c,
        }
    }

    /// PostgREST operator expression, e.g. `eq.acme` or `in.(a,b)`
    fn operand(&self) -> String {
        match self {
            Filter::Eq(_, v) => format!("eq.{}", v),
            Filter::Gte(_, v) => format!("gte.{}", v),
            Filter::Lt(_, v) => format!("lt.{}", v),
            Filter::In(_, values) => {
                let items: Vec<String> = values.iter().map(|v| quote_list_item(v)).collect();
                format!("in.({})", items.join(","))
            }
        }
    }

    /// Evaluate the filter against a row.
    ///
    /// Range comparisons use instants when both sides parse as timestamps,
    /// numbers when both parse as numbers, and text otherwise.
    pub fn matches(&self, row: &RawRow) -> bool {
        let Some(actual) = row.text(self.column()) else {
            return false;
        };
        match self {
            Filter::Eq(_, v) => actual == *v,
            Filter::In(_, values) => values.iter().any(|v| *v == actual),
            Filter::Gte(_, v) => compare(&actual, v).is_ge(),
            Filter::Lt(_, v) => compare(&actual, v).is_lt(),
        }
    }
}

fn compare(actual: &str, bound: &str) -> std::cmp::Ordering {
    if let (Some(a), Some(b)) = (parse_timestamp(actual), parse_timestamp(bound)) {
        return a.cmp(&b);
    }
    if let (Ok(a), Ok(b)) = (actual.parse::<f64>(), bound.parse::<f64>()) {
        return a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal);
    }
    actual.cmp(bound)
}

/// Quote a list item containing PostgREST reserved characters.
fn quote_list_item(value: &str) -> String {
    if value.contains(&[',', '(', ')', '"', ' '][..]) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// A read query against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    select: String,
    filters: Vec<Filter>,
    order: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn lt(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Lt(column.to_string(), value.into()));
        self
    }

    pub fn in_list(mut self, column: &str, values: &[String]) -> Self {
        self.filters
            .push(Filter::In(column.to_string(), values.to_vec()));
        self
    }

    /// Sort descending on `column`; later calls add tie-breakers.
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(column.to_string());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Query parameters as unencoded `(key, value)` pairs
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        for filter in &self.filters {
            params.push((filter.column().to_string(), filter.operand()));
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(|c| format!("{}.desc", c)).collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    /// Encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Read access to the live store's tables
#[async_trait]
pub trait LiveClient: Send + Sync {
    /// Rows of `table` matching `query`
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<RawRow>>;
}

/// HTTP client for the live store
pub struct HttpLiveClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpLiveClient {
    /// Create a new client from configuration
    ///
    /// Returns a configuration error if the URL or service key is missing.
    pub fn new(config: &LiveStoreConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::Config(format!("live.{}.url is required", config.scope)))?
            .trim_end_matches('/')
            .to_string();
        let service_key = config.service_key.as_deref().ok_or_else(|| {
            Error::Config(format!("live.{}.service_key is required", config.scope))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(service_key)
                .map_err(|e| Error::Config(format!("invalid service_key: {}", e)))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", service_key))
                .map_err(|e| Error::Config(format!("invalid service_key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn url(&self, table: &str, query: &Query) -> String {
        format!(
            "{}/{}?{}",
            self.base_url,
            urlencoding::encode(table),
            query.to_query_string()
        )
    }
}

#[async_trait]
impl LiveClient for HttpLiveClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<RawRow>> {
        let url = self.url(table, query);
        tracing::debug!(table, "live store select");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let body: Value = response
                .json()
                .await
                .map_err(|e| Error::Http(format!("failed to parse response: {}", e)))?;
            Ok(rows_from_value(body, table))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Http(format!("API error ({}): {}", status, error_text)))
        }
    }
}

/// A live store held in memory.
///
/// Evaluates filters, ordering and paging the way the HTTP endpoint does,
/// and records every query it receives.
#[derive(Default)]
pub struct MemoryLiveClient {
    tables: HashMap<String, Vec<RawRow>>,
    requests: Mutex<Vec<(String, Query)>>,
}

impl MemoryLiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table holding `rows`
    pub fn with_table(mut self, table: &str, rows: Vec<RawRow>) -> Self {
        self.tables.insert(table.to_string(), rows);
        self
    }

    /// Queries received so far, oldest first
    pub fn requests(&self) -> Vec<(String, Query)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LiveClient for MemoryLiveClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<RawRow>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((table.to_string(), query.clone()));
        }

        let rows = self
            .tables
            .get(table)
            .ok_or_else(|| Error::Http(format!("API error (404 Not Found): no table {}", table)))?;

        let mut matched: Vec<RawRow> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        // Descending, nulls last, like PostgREST's default for `.desc`
        matched.sort_by(|a, b| {
            for column in &query.order {
                let ordering = match (a.text(column), b.text(column)) {
                    (Some(x), Some(y)) => compare(&y, &x),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                if ordering.is_ne() {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }
}
