//! chatpulse-report - CLI tool to print chat analytics for a tenant or assistant
//!
//! Resolves the backing store for the requested owner and prints the
//! selected aggregates as text or JSON.

use chatpulse_core::analytics::{
    AnimationStats, BreakdownEntry, HourlyBucket, OutboundLinks, OverviewMetrics, QuestionFrequency,
    QuestionStat, SentimentBreakdown, SentimentTimePoint, TimeSeriesPoint, UsageSummary,
};
use chatpulse_core::operations::Aggregations;
use chatpulse_core::{Config, DateRange, Owner, Router, Timestamp};
use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{ArgGroup, Parser, ValueEnum};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "chatpulse-report")]
#[command(about = "Print chat analytics for a tenant or an assistant")]
#[command(version)]
#[command(group(ArgGroup::new("owner").required(true).args(["tenant", "assistant"])))]
struct Args {
    /// Tenant (client) ID
    #[arg(long)]
    tenant: Option<String>,

    /// Assistant (mascot) ID
    #[arg(long)]
    assistant: Option<String>,

    /// First day included, YYYY-MM-DD (UTC)
    #[arg(long, value_parser = parse_date)]
    from: Option<Timestamp>,

    /// First day excluded, YYYY-MM-DD (UTC)
    #[arg(long, value_parser = parse_date)]
    to: Option<Timestamp>,

    /// Which aggregates to print
    #[arg(short, long, value_enum, default_value_t = ReportKind::Overview)]
    report: ReportKind,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportKind {
    Overview,
    Breakdowns,
    Timeseries,
    Questions,
    Animations,
    All,
}

impl ReportKind {
    fn includes(self, other: ReportKind) -> bool {
        self == ReportKind::All || self == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Parse `YYYY-MM-DD` as UTC midnight.
fn parse_date(value: &str) -> std::result::Result<Timestamp, String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date: {value}"))?;
    Ok(Utc.from_utc_datetime(&midnight).into())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Breakdowns {
    sentiment: SentimentBreakdown,
    category: Vec<BreakdownEntry>,
    language: Vec<BreakdownEntry>,
    country: Vec<BreakdownEntry>,
    device: Vec<BreakdownEntry>,
    browser: Vec<BreakdownEntry>,
    status: Vec<BreakdownEntry>,
    resolution: Vec<BreakdownEntry>,
    engagement: Vec<BreakdownEntry>,
    conversation_type: Vec<BreakdownEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeSeries {
    daily: Vec<TimeSeriesPoint>,
    sentiment: Vec<SentimentTimePoint>,
    hourly: Vec<HourlyBucket>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Questions {
    asked: Vec<QuestionStat>,
    unanswered: Vec<QuestionFrequency>,
    links: OutboundLinks,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    overview: Option<OverviewMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<UsageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdowns: Option<Breakdowns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeseries: Option<TimeSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    questions: Option<Questions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    animations: Option<AnimationStats>,
}

async fn build_report(
    aggregations: Aggregations<'_>,
    backend: String,
    owner: Owner<'_>,
    range: &DateRange,
    kind: ReportKind,
) -> Result<Report> {
    let mut report = Report {
        backend,
        overview: None,
        usage: None,
        breakdowns: None,
        timeseries: None,
        questions: None,
        animations: None,
    };

    if kind.includes(ReportKind::Overview) {
        report.overview = Some(aggregations.overview(owner, range).await?);
        report.usage = Some(aggregations.usage_summary(owner, range).await?);
    }

    if kind.includes(ReportKind::Breakdowns) {
        report.breakdowns = Some(Breakdowns {
            sentiment: aggregations.sentiment_breakdown(owner, range).await?,
            category: aggregations.category_breakdown(owner, range).await?,
            language: aggregations.language_breakdown(owner, range).await?,
            country: aggregations.country_breakdown(owner, range).await?,
            device: aggregations.device_breakdown(owner, range).await?,
            browser: aggregations.browser_breakdown(owner, range).await?,
            status: aggregations.status_breakdown(owner, range).await?,
            resolution: aggregations.resolution_breakdown(owner, range).await?,
            engagement: aggregations.engagement_breakdown(owner, range).await?,
            conversation_type: aggregations.conversation_type_breakdown(owner, range).await?,
        });
    }

    if kind.includes(ReportKind::Timeseries) {
        report.timeseries = Some(TimeSeries {
            daily: aggregations.time_series(owner, range).await?,
            sentiment: aggregations.sentiment_time_series(owner, range).await?,
            hourly: aggregations.hourly_breakdown(owner, range).await?,
        });
    }

    if kind.includes(ReportKind::Questions) {
        report.questions = Some(Questions {
            asked: aggregations.question_analytics(owner, range).await?,
            unanswered: aggregations.unanswered_questions(owner, range).await?,
            links: aggregations.outbound_links(owner, range).await?,
        });
    }

    if kind.includes(ReportKind::Animations) {
        report.animations = Some(aggregations.animation_stats(owner, range).await?);
    }

    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        chatpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        if from >= to {
            anyhow::bail!("--from must be before --to");
        }
    }
    let range = DateRange {
        start: args.from,
        end: args.to,
    };

    let router = Router::new(&config);
    let (owner, ops) = match (&args.tenant, &args.assistant) {
        (Some(tenant), _) => (Owner::Tenant(tenant.as_str()), router.resolve(tenant)),
        (None, Some(assistant)) => (
            Owner::Assistant(assistant.as_str()),
            router.resolve_for_assistant(assistant).await,
        ),
        (None, None) => anyhow::bail!("either --tenant or --assistant is required"),
    };

    tracing::info!(owner = ?owner, backend = %ops.backend_name(), "Building report");

    let report = build_report(ops.aggregations(), ops.backend_name(), owner, &range, args.report)
        .await
        .with_context(|| format!("failed to build report from {}", ops.backend_name()))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report, owner, &range),
    }

    Ok(())
}

// ============================================
// Text output
// ============================================

fn describe_owner(owner: Owner<'_>) -> String {
    match owner {
        Owner::Tenant(id) => format!("tenant {id}"),
        Owner::Assistant(id) => format!("assistant {id}"),
    }
}

fn describe_range(range: &DateRange) -> String {
    let day = |ts: &Option<Timestamp>| ts.map(|t| t.format("%Y-%m-%d").to_string());
    match (day(&range.start), day(&range.end)) {
        (None, None) => "all time".to_string(),
        (Some(start), None) => format!("from {start}"),
        (None, Some(end)) => format!("before {end}"),
        (Some(start), Some(end)) => format!("{start} to {end} (exclusive)"),
    }
}

fn print_entries(title: &str, entries: &[BreakdownEntry]) {
    println!("  {title}:");
    if entries.is_empty() {
        println!("    (none)");
    }
    for entry in entries {
        println!("    {:<24} {:>6}  {:>5.1}%", entry.key, entry.count, entry.percentage);
    }
}

fn print_text(report: &Report, owner: Owner<'_>, range: &DateRange) {
    println!("Backend: {}", report.backend);
    println!("Owner:   {}", describe_owner(owner));
    println!("Range:   {}", describe_range(range));

    if let Some(overview) = &report.overview {
        println!();
        println!("Overview");
        println!("  Sessions:              {}", overview.total_sessions);
        println!("  Messages:              {}", overview.total_messages);
        println!("  Tokens:                {}", overview.total_tokens);
        println!("  Cost (EUR):            {:.4}", overview.total_cost_eur);
        println!("  Avg response time:     {:.0} ms", overview.average_response_time_ms);
        println!(
            "  Avg session duration:  {:.0} s",
            overview.average_session_duration_seconds
        );
        println!("  Resolution rate:       {:.1}%", overview.resolution_rate);
        println!("  Escalation rate:       {:.1}%", overview.escalation_rate);
    }

    if let Some(usage) = &report.usage {
        println!();
        println!("Usage");
        println!(
            "  Chat:      {} tokens, {:.4} EUR, {:.4} USD",
            usage.chat_tokens, usage.chat_cost_eur, usage.chat_cost_usd
        );
        println!(
            "  Analysis:  {} tokens, {:.4} EUR, {:.4} USD",
            usage.analysis_tokens, usage.analysis_cost_eur, usage.analysis_cost_usd
        );
        println!(
            "  Total:     {} tokens, {:.4} EUR, {:.4} USD",
            usage.total_tokens, usage.total_cost_eur, usage.total_cost_usd
        );
    }

    if let Some(breakdowns) = &report.breakdowns {
        println!();
        println!("Breakdowns");
        let s = &breakdowns.sentiment;
        println!(
            "  Sentiment: {} positive, {} neutral, {} negative",
            s.positive, s.neutral, s.negative
        );
        print_entries("Category", &breakdowns.category);
        print_entries("Language", &breakdowns.language);
        print_entries("Country", &breakdowns.country);
        print_entries("Device", &breakdowns.device);
        print_entries("Browser", &breakdowns.browser);
        print_entries("Status", &breakdowns.status);
        print_entries("Resolution", &breakdowns.resolution);
        print_entries("Engagement", &breakdowns.engagement);
        print_entries("Conversation type", &breakdowns.conversation_type);
    }

    if let Some(series) = &report.timeseries {
        println!();
        println!("Daily");
        for point in &series.daily {
            println!(
                "  {}  {:>4} sessions  {:>5} messages  {:>7} tokens  {:.4} EUR",
                point.date, point.sessions, point.messages, point.tokens, point.cost
            );
        }
        println!();
        println!("Sentiment by day");
        for point in &series.sentiment {
            println!(
                "  {}  +{} ={} -{}",
                point.date, point.positive, point.neutral, point.negative
            );
        }
        println!();
        println!("Sessions by hour");
        for bucket in series.hourly.iter().filter(|b| b.count > 0) {
            println!("  {:02}:00  {:>4}  {:>5.1}%", bucket.hour, bucket.count, bucket.percentage);
        }
    }

    if let Some(questions) = &report.questions {
        println!();
        println!("Questions");
        for q in &questions.asked {
            let marker = if q.answered { " " } else { "?" };
            println!("  {marker} {:>3}x  {}", q.frequency, q.question);
        }
        println!();
        println!("Unanswered");
        for q in &questions.unanswered {
            println!("    {:>3}x  {}", q.frequency, q.question);
        }
        println!();
        println!("Outbound links");
        for link in questions.links.urls.iter().chain(&questions.links.emails) {
            println!("    {:>3}x  {}", link.count, link.link);
        }
    }

    if let Some(animations) = &report.animations {
        println!();
        println!("Animations");
        println!("  Triggers:                 {}", animations.total_triggers);
        println!("  Easter eggs:              {}", animations.easter_eggs_triggered);
        println!("  Sessions with easter eggs: {}", animations.sessions_with_easter_eggs);
        for animation in &animations.top_animations {
            println!("    {:<20} {:>4}", animation.name, animation.count);
        }
        if !animations.top_easter_eggs.is_empty() {
            println!("  Top easter eggs:");
            for egg in &animations.top_easter_eggs {
                println!("    {:<20} {:>4}", egg.name, egg.count);
            }
        }
        if !animations.wait_sequences.is_empty() {
            println!("  Wait sequences:");
            for sequence in &animations.wait_sequences {
                println!("    {:<20} {:>4}", sequence.name, sequence.count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_is_utc_midnight() {
        let ts = parse_date("2024-05-02").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-02T00:00:00+00:00");
        assert!(parse_date("05/02/2024").is_err());
    }

    #[test]
    fn test_report_kind_all_includes_everything() {
        assert!(ReportKind::All.includes(ReportKind::Questions));
        assert!(ReportKind::Overview.includes(ReportKind::Overview));
        assert!(!ReportKind::Overview.includes(ReportKind::Animations));
    }

    #[test]
    fn test_describe_range() {
        assert_eq!(describe_range(&DateRange::unbounded()), "all time");
        let range = DateRange::new(
            parse_date("2024-05-01").unwrap(),
            parse_date("2024-05-03").unwrap(),
        );
        assert_eq!(describe_range(&range), "2024-05-01 to 2024-05-03 (exclusive)");
    }
}
