use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, Action};
use crate::features::dashboard::dtos::IncidentStats;
use crate::features::incidents::services::IncidentService;
use crate::features::reports::dtos::{ReportQuery, ReportResponseDto};

/// Service for the administrator incident report
pub struct ReportService {
    incidents: Arc<IncidentService>,
}

impl ReportService {
    pub fn new(incidents: Arc<IncidentService>) -> Self {
        Self { incidents }
    }

    /// Every incident matching `query`, with per-status counts
    pub async fn generate(
        &self,
        actor: &AuthenticatedUser,
        query: &ReportQuery,
    ) -> Result<ReportResponseDto> {
        authorize(actor, Action::ViewReport)?;

        let filters = query.filter();
        let incidents = self.incidents.search(&filters).await?;
        let statistics = IncidentStats::tally(incidents.iter().map(|i| i.status));

        tracing::info!(
            "Report generated by '{}': {} incidents",
            actor.username,
            statistics.total
        );

        Ok(ReportResponseDto {
            incidents,
            statistics,
            filters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::error::AppError;
    use crate::features::accounts::models::AccountRole;
    use crate::features::incidents::dtos::CreateIncidentDto;
    use crate::features::incidents::models::IncidentCategory;
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{insert_account, test_minio_config};
    use chrono::{NaiveDate, TimeZone, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    struct Fixture {
        reports: ReportService,
        admin: AuthenticatedUser,
        worker: AuthenticatedUser,
        late_evening: Uuid,
        next_morning: Uuid,
    }

    /// One incident at 23:30Z on May 10th and one at 00:30Z on May 11th
    async fn fixture(pool: &PgPool) -> Fixture {
        let late = Utc.with_ymd_and_hms(2025, 5, 10, 23, 30, 0).unwrap();
        let clock = FixedClock::new(late);
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let incidents = Arc::new(IncidentService::new(
            pool.clone(),
            storage,
            Arc::new(clock.clone()),
        ));

        let worker = insert_account(pool, AccountRole::Worker, late).await;
        let admin = insert_account(pool, AccountRole::Administrator, late).await;

        let create = |description: &str| CreateIncidentDto {
            category: IncidentCategory::Hardware,
            description: description.to_string(),
            priority: None,
            location: None,
        };

        let late_evening = incidents
            .create(&worker, create("printer jammed"))
            .await
            .unwrap()
            .incident
            .id;
        clock.set(Utc.with_ymd_and_hms(2025, 5, 11, 0, 30, 0).unwrap());
        let next_morning = incidents
            .create(&worker, create("badge reader offline"))
            .await
            .unwrap()
            .incident
            .id;

        Fixture {
            reports: ReportService::new(incidents),
            admin,
            worker,
            late_evening,
            next_morning,
        }
    }

    fn dates(from: Option<&str>, to: Option<&str>) -> ReportQuery {
        ReportQuery {
            date_from: from.map(str::to_string),
            date_to: to.map(str::to_string),
            ..Default::default()
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_future_start_date_matches_nothing(pool: PgPool) {
        let f = fixture(&pool).await;

        let report = f
            .reports
            .generate(&f.admin, &dates(Some("2099-01-01"), None))
            .await
            .unwrap();

        assert!(report.incidents.is_empty());
        assert_eq!(report.statistics, IncidentStats::default());
        assert_eq!(
            report.filters.date_from,
            NaiveDate::from_ymd_opt(2099, 1, 1)
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_day_bounds_are_inclusive_utc_days(pool: PgPool) {
        let f = fixture(&pool).await;

        let same_day = f
            .reports
            .generate(&f.admin, &dates(Some("2025-05-10"), Some("2025-05-10")))
            .await
            .unwrap();
        assert_eq!(
            same_day.incidents.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![f.late_evening]
        );
        assert_eq!(same_day.statistics.total, 1);
        assert_eq!(same_day.statistics.pending, 1);

        let both_days = f
            .reports
            .generate(&f.admin, &dates(Some("2025-05-10"), Some("2025-05-11")))
            .await
            .unwrap();
        assert_eq!(
            both_days.incidents.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![f.next_morning, f.late_evening]
        );

        let unbounded = f.reports.generate(&f.admin, &dates(None, None)).await.unwrap();
        assert_eq!(unbounded.statistics.total, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_workers_cannot_generate_reports(pool: PgPool) {
        let f = fixture(&pool).await;

        let result = f.reports.generate(&f.worker, &ReportQuery::default()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
