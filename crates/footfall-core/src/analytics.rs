//! Visitor analytics: time ranges, the dashboard summary, the aggregator that
//! derives it from raw page views, and the storage abstraction it reads from.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::CoreError;
use crate::event::{DeviceType, PageViewEvent, UserRole};

/// Maximum number of rows in `topPages`.
pub const TOP_PAGES_LIMIT: usize = 10;
/// Maximum number of rows in `trafficSources`.
pub const TRAFFIC_SOURCES_LIMIT: usize = 5;
/// Color tags assigned to traffic sources by rank, cycling.
pub const SOURCE_COLORS: &[&str] = &[
    "bg-blue-500",
    "bg-green-500",
    "bg-yellow-500",
    "bg-pink-500",
    "bg-purple-500",
    "bg-orange-500",
    "bg-cyan-500",
    "bg-red-500",
];

/// Trailing window selectable from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Last7Days,
    Last30Days,
    Last90Days,
}

impl TimeRange {
    /// Parse the `range` query parameter. Absent or blank means `7d`.
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw.map(str::trim) {
            None | Some("") | Some("7d") => Ok(Self::Last7Days),
            Some("30d") => Ok(Self::Last30Days),
            Some("90d") => Ok(Self::Last90Days),
            Some(other) => Err(CoreError::InvalidRange(other.to_string())),
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Self::Last7Days => 7,
            Self::Last30Days => 30,
            Self::Last90Days => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
        }
    }
}

/// Boundaries of the three working sets read for one summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    /// `W` is every event at or after this instant.
    pub start: DateTime<Utc>,
    /// `W_prev` is `[previous_start, start)`.
    pub previous_start: DateTime<Utc>,
    /// `W_recent` is every event at or after this instant.
    pub realtime_start: DateTime<Utc>,
}

impl WindowBounds {
    pub fn resolve(range: TimeRange, now: DateTime<Utc>, realtime_minutes: i64) -> Self {
        let span = Duration::days(range.days());
        let start = now - span;
        Self {
            start,
            previous_start: start - span,
            realtime_start: now - Duration::minutes(realtime_minutes),
        }
    }
}

/// The only figures of `W_prev` the summary needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    pub page_views: i64,
    /// Distinct non-empty session ids.
    pub sessions: i64,
}

/// Everything the aggregator consumes for one request.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsWindow {
    /// `W`, in storage order (newest first). Encounter order breaks ties in
    /// the page and source rankings.
    pub current: Vec<PageViewEvent>,
    pub previous: PeriodTotals,
    /// Distinct sessions in `W_recent`.
    pub realtime_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyVisitors {
    /// Local calendar day as `M/D`.
    pub date: String,
    pub visitors: i64,
    pub page_views: i64,
    pub new_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPage {
    pub path: String,
    pub title: String,
    pub views: i64,
    pub percentage: i64,
    pub avg_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStat {
    pub device: String,
    pub count: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSource {
    pub source: String,
    /// Raw event count for the category.
    pub visitors: i64,
    pub percentage: i64,
    pub color: String,
}

/// The dashboard payload returned by `GET /api/admin/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Distinct sessions in the window.
    pub total_visitors: i64,
    pub unique_visitors: i64,
    pub total_page_views: i64,
    pub visitors_change: f64,
    pub page_views_change: f64,
    pub avg_duration: i64,
    pub bounce_rate: i64,
    pub new_visitors: i64,
    pub returning_visitors: i64,
    pub new_visitor_percentage: i64,
    pub realtime_visitors: i64,
    pub daily_visitors: Vec<DailyVisitors>,
    pub hourly_stats: [i64; 24],
    pub top_pages: Vec<TopPage>,
    pub device_stats: Vec<DeviceStat>,
    pub traffic_sources: Vec<TrafficSource>,
}

/// Pure transformation of an [`AnalyticsWindow`] into an [`AnalyticsSummary`].
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    pub range: TimeRange,
    pub timezone: Tz,
    pub catalog: &'a Catalog,
}

#[derive(Default)]
struct DayBucket<'e> {
    sessions: HashSet<&'e str>,
    page_views: i64,
    new_visitors: i64,
}

struct PageBucket<'e> {
    path: &'e str,
    views: i64,
    duration_sum: i64,
    duration_count: i64,
}

impl<'a> Aggregator<'a> {
    pub fn new(range: TimeRange, timezone: Tz, catalog: &'a Catalog) -> Self {
        Self {
            range,
            timezone,
            catalog,
        }
    }

    pub fn summarize(&self, window: &AnalyticsWindow) -> AnalyticsSummary {
        let events = &window.current;
        let total_page_views = events.len() as i64;

        let mut session_counts: HashMap<&str, i64> = HashMap::new();
        let mut visitors: HashSet<&str> = HashSet::new();
        let mut new_visitors = 0i64;
        let mut duration_sum = 0i64;
        let mut duration_count = 0i64;
        let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        let mut hourly_stats = [0i64; 24];
        let mut pages: Vec<PageBucket> = Vec::new();
        let mut page_index: HashMap<&str, usize> = HashMap::new();
        let mut devices = [0i64; 3];
        let mut sources: Vec<(String, i64)> = Vec::new();
        let mut source_index: HashMap<String, usize> = HashMap::new();

        for event in events {
            let session = event.session_key();
            if let Some(s) = session {
                *session_counts.entry(s).or_insert(0) += 1;
            }
            if let Some(v) = event.visitor_key() {
                visitors.insert(v);
            }
            if event.is_new_visitor {
                new_visitors += 1;
            }
            if event.duration > 0 {
                duration_sum += event.duration;
                duration_count += 1;
            }

            let local = event.created_at.with_timezone(&self.timezone);
            let day = days.entry(local.date_naive()).or_default();
            if let Some(s) = session {
                day.sessions.insert(s);
            }
            day.page_views += 1;
            if event.is_new_visitor {
                day.new_visitors += 1;
            }
            hourly_stats[local.hour() as usize] += 1;

            let idx = *page_index.entry(event.path.as_str()).or_insert_with(|| {
                pages.push(PageBucket {
                    path: event.path.as_str(),
                    views: 0,
                    duration_sum: 0,
                    duration_count: 0,
                });
                pages.len() - 1
            });
            let page = &mut pages[idx];
            page.views += 1;
            if event.duration > 0 {
                page.duration_sum += event.duration;
                page.duration_count += 1;
            }

            match event.device_type {
                Some(DeviceType::Mobile) => devices[0] += 1,
                Some(DeviceType::Desktop) => devices[1] += 1,
                Some(DeviceType::Tablet) => devices[2] += 1,
                None => {}
            }

            let source = self.catalog.categorize_referrer(event.referrer.as_deref());
            let idx = match source_index.get(&source) {
                Some(idx) => *idx,
                None => {
                    sources.push((source.clone(), 0));
                    source_index.insert(source, sources.len() - 1);
                    sources.len() - 1
                }
            };
            sources[idx].1 += 1;
        }

        let total_sessions = session_counts.len() as i64;
        let bounced = session_counts.values().filter(|&&c| c == 1).count() as i64;

        let mut daily_visitors: Vec<DailyVisitors> = days
            .into_iter()
            .map(|(date, bucket)| DailyVisitors {
                date: format!("{}/{}", date.month(), date.day()),
                visitors: bucket.sessions.len() as i64,
                page_views: bucket.page_views,
                new_visitors: bucket.new_visitors,
            })
            .collect();
        let keep = self.range.days() as usize;
        if daily_visitors.len() > keep {
            daily_visitors.drain(..daily_visitors.len() - keep);
        }

        // Stable sort: equal view counts keep encounter order.
        pages.sort_by(|a, b| b.views.cmp(&a.views));
        let top_pages = pages
            .into_iter()
            .take(TOP_PAGES_LIMIT)
            .map(|p| TopPage {
                path: p.path.to_string(),
                title: self.catalog.page_title(p.path),
                views: p.views,
                percentage: percentage(p.views, total_page_views),
                avg_duration: rounded_mean(p.duration_sum, p.duration_count),
            })
            .collect();

        let total_devices: i64 = devices.iter().sum();
        let device_stats = [DeviceType::Mobile, DeviceType::Desktop, DeviceType::Tablet]
            .iter()
            .zip(devices)
            .map(|(device, count)| DeviceStat {
                device: device.label().to_string(),
                count,
                percentage: percentage(count, total_devices),
            })
            .collect();

        let total_sourced: i64 = sources.iter().map(|(_, c)| c).sum();
        sources.sort_by(|a, b| b.1.cmp(&a.1));
        let traffic_sources = sources
            .into_iter()
            .take(TRAFFIC_SOURCES_LIMIT)
            .enumerate()
            .map(|(rank, (source, count))| TrafficSource {
                source,
                visitors: count,
                percentage: percentage(count, total_sourced),
                color: SOURCE_COLORS[rank % SOURCE_COLORS.len()].to_string(),
            })
            .collect();

        AnalyticsSummary {
            total_visitors: total_sessions,
            unique_visitors: visitors.len() as i64,
            total_page_views,
            visitors_change: percent_change(total_sessions, window.previous.sessions),
            page_views_change: percent_change(total_page_views, window.previous.page_views),
            avg_duration: rounded_mean(duration_sum, duration_count),
            bounce_rate: percentage(bounced, total_sessions),
            new_visitors,
            returning_visitors: total_page_views - new_visitors,
            new_visitor_percentage: percentage(new_visitors, total_page_views),
            realtime_visitors: window.realtime_visitors,
            daily_visitors,
            hourly_stats,
            top_pages,
            device_stats,
            traffic_sources,
        }
    }
}

/// Round half toward positive infinity, so `2.5 → 3` and `-2.5 → -2`.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
fn percentage(part: i64, whole: i64) -> i64 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0) as i64
}

/// Percent change rounded to one decimal, or 0 when `previous` is 0.
fn percent_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    round_half_up((current - previous) as f64 / previous as f64 * 100.0 * 10.0) / 10.0
}

fn rounded_mean(sum: i64, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    round_half_up(sum as f64 / count as f64) as i64
}

/// Storage operations used by ingestion, the duration patch and the summary.
#[async_trait::async_trait]
pub trait AnalyticsBackend: Send + Sync + 'static {
    async fn insert_page_view(&self, event: &PageViewEvent) -> anyhow::Result<()>;

    /// Set `duration` on one event. Returns `false` when no event has that id.
    async fn update_duration(&self, page_view_id: &str, duration: i64) -> anyhow::Result<bool>;

    /// Every event with `created_at >= start`, newest first.
    async fn page_views_since(&self, start: DateTime<Utc>)
        -> anyhow::Result<Vec<PageViewEvent>>;

    /// Totals over `[start, end)`.
    async fn period_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<PeriodTotals>;

    /// Distinct non-empty session ids with `created_at >= since`.
    async fn active_sessions_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64>;

    async fn user_role(&self, user_id: &str) -> anyhow::Result<Option<UserRole>>;
}

/// Read the three working sets for `bounds`. Any storage failure aborts the
/// whole read.
pub async fn load_window(
    backend: &dyn AnalyticsBackend,
    bounds: &WindowBounds,
) -> anyhow::Result<AnalyticsWindow> {
    let current = backend.page_views_since(bounds.start).await?;
    let previous = backend
        .period_totals(bounds.previous_start, bounds.start)
        .await?;
    let realtime_visitors = backend.active_sessions_since(bounds.realtime_start).await?;
    Ok(AnalyticsWindow {
        current,
        previous,
        realtime_visitors,
    })
}
