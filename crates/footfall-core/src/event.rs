use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::classify_device;

/// The payload the client sends to POST /api/admin/analytics.
///
/// `session_id` and `visitor_id` are generated and persisted by the browser;
/// the server treats them as opaque strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPayload {
    pub path: Option<String>,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub visitor_id: Option<String>,
    /// Absent and `null` both mean `false`.
    pub is_new_visitor: Option<bool>,
}

/// The payload sent to POST /api/admin/analytics/duration when a page is left.
///
/// The camelCase aliases let beacon clients use `eventId` / `durationSeconds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationPatch {
    #[serde(alias = "eventId")]
    pub page_view_id: Option<String>,
    #[serde(alias = "durationSeconds")]
    pub duration: Option<i64>,
}

/// Coarse device class derived from the User-Agent at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
            DeviceType::Tablet => "tablet",
        }
    }

    /// Display label used in the dashboard breakdown.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Desktop => "Desktop",
            DeviceType::Tablet => "Tablet",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(DeviceType::Mobile),
            "desktop" => Ok(DeviceType::Desktop),
            "tablet" => Ok(DeviceType::Tablet),
            other => Err(format!("unknown device type: {other}")),
        }
    }
}

/// A stored page view, mirroring the DuckDB `page_views` table columns.
///
/// Every field is immutable after insert except `duration`, which is patched
/// at most once by the duration endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewEvent {
    pub id: String,
    pub path: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: Option<DeviceType>,
    pub session_id: Option<String>,
    pub visitor_id: Option<String>,
    pub user_id: Option<String>,
    pub is_new_visitor: bool,
    /// Seconds on page. 0 until the duration patch arrives.
    pub duration: i64,
    pub created_at: DateTime<Utc>,
}

/// Request context captured by the ingestion handler.
///
/// Identity and correlation ids are passed in explicitly rather than read from
/// any ambient state.
#[derive(Debug, Clone, Default)]
pub struct TrackContext {
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
}

impl PageViewEvent {
    /// Build a fresh event from a validated payload.
    ///
    /// `path` must already be checked for presence by the caller. Empty
    /// referrers are normalised to `None` so they count as direct traffic.
    pub fn from_payload(
        path: String,
        payload: TrackPayload,
        ctx: TrackContext,
        now: DateTime<Utc>,
    ) -> Self {
        let device_type = Some(classify_device(ctx.user_agent.as_deref().unwrap_or("")));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            page_title: payload.page_title,
            referrer: payload.referrer.filter(|r| !r.is_empty()),
            user_agent: ctx.user_agent,
            device_type,
            session_id: payload.session_id,
            visitor_id: payload.visitor_id,
            user_id: ctx.user_id,
            is_new_visitor: payload.is_new_visitor.unwrap_or(false),
            duration: 0,
            created_at: now,
        }
    }

    /// `session_id` if present and non-empty.
    pub fn session_key(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }

    /// `visitor_id` if present and non-empty.
    pub fn visitor_key(&self) -> Option<&str> {
        self.visitor_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Role stored in `user_profiles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
