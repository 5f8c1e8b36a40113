use chrono::{DateTime, Utc};

use footfall_core::analytics::{AnalyticsBackend, PeriodTotals};
use footfall_core::event::{PageViewEvent, UserRole};

use crate::DuckDbBackend;

#[async_trait::async_trait]
impl AnalyticsBackend for DuckDbBackend {
    async fn insert_page_view(&self, event: &PageViewEvent) -> anyhow::Result<()> {
        DuckDbBackend::insert_page_view(self, event).await
    }

    async fn update_duration(&self, page_view_id: &str, duration: i64) -> anyhow::Result<bool> {
        DuckDbBackend::update_duration(self, page_view_id, duration).await
    }

    async fn page_views_since(
        &self,
        start: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PageViewEvent>> {
        DuckDbBackend::page_views_since(self, start).await
    }

    async fn period_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<PeriodTotals> {
        DuckDbBackend::period_totals(self, start, end).await
    }

    async fn active_sessions_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64> {
        DuckDbBackend::active_sessions_since(self, since).await
    }

    async fn user_role(&self, user_id: &str) -> anyhow::Result<Option<UserRole>> {
        DuckDbBackend::user_role(self, user_id).await
    }
}
