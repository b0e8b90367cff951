use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, Action, IncidentScope};
use crate::features::dashboard::dtos::IncidentStats;
use crate::features::incidents::filters::IncidentFilter;

fn stats_query(filter: &IncidentFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(
        r#"SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE i.status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE i.status = 'in_progress') AS in_progress,
            COUNT(*) FILTER (WHERE i.status = 'resolved') AS resolved
        FROM incidents i"#,
    );
    filter.push_conditions(&mut qb);
    qb
}

/// Service for role-scoped incident statistics
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Counts over every incident the caller may see
    pub async fn statistics(&self, actor: &AuthenticatedUser) -> Result<IncidentStats> {
        authorize(actor, Action::ViewStatistics)?;
        let filter = IncidentFilter::scoped(IncidentScope::for_actor(actor));

        stats_query(&filter)
            .build_query_as::<IncidentStats>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to compute incident statistics: {:?}", e);
                AppError::Database(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, FixedClock};
    use crate::features::accounts::models::AccountRole;
    use crate::features::incidents::dtos::{ChangeStatusDto, CreateIncidentDto};
    use crate::features::incidents::models::{IncidentCategory, IncidentPriority, IncidentStatus};
    use crate::features::incidents::IncidentService;
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{insert_account, test_minio_config};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_worker_statistics_are_owner_scoped() {
        let owner = Uuid::now_v7();
        let filter = IncidentFilter::scoped(IncidentScope::OwnedBy(owner));
        let qb = stats_query(&filter);
        assert!(qb.sql().ends_with("FROM incidents i WHERE TRUE AND i.creator_id = $1"));
    }

    #[test]
    fn test_admin_statistics_cover_everything() {
        let filter = IncidentFilter::scoped(IncidentScope::All);
        let qb = stats_query(&filter);
        assert!(qb.sql().ends_with("FROM incidents i WHERE TRUE"));
        assert!(qb.sql().contains("FILTER (WHERE i.status = 'in_progress') AS in_progress"));
    }

    fn incident(category: IncidentCategory, description: &str) -> CreateIncidentDto {
        CreateIncidentDto {
            category,
            description: description.to_string(),
            priority: Some(IncidentPriority::High),
            location: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_resolved_monitor_counts_for_its_reporter(pool: PgPool) {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 5, 10, 8, 0, 0).unwrap());
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let incidents = IncidentService::new(pool.clone(), storage, Arc::new(clock.clone()));
        let dashboard = DashboardService::new(pool.clone());

        let worker = insert_account(&pool, AccountRole::Worker, clock.now()).await;
        let colleague = insert_account(&pool, AccountRole::Worker, clock.now()).await;
        let admin = insert_account(&pool, AccountRole::Administrator, clock.now()).await;

        let monitor = incidents
            .create(&worker, incident(IncidentCategory::Hardware, "monitor dead"))
            .await
            .unwrap()
            .incident
            .id;
        incidents
            .create(&colleague, incident(IncidentCategory::Software, "mail client hangs"))
            .await
            .unwrap();

        clock.advance(Duration::hours(1));
        incidents
            .change_status(
                &admin,
                monitor,
                ChangeStatusDto {
                    status: IncidentStatus::Resolved,
                    comment: None,
                },
            )
            .await
            .unwrap();

        let own = dashboard.statistics(&worker).await.unwrap();
        assert_eq!(
            own,
            IncidentStats {
                total: 1,
                pending: 0,
                in_progress: 0,
                resolved: 1,
            }
        );

        let everything = dashboard.statistics(&admin).await.unwrap();
        assert_eq!(
            everything,
            IncidentStats {
                total: 2,
                pending: 1,
                in_progress: 0,
                resolved: 1,
            }
        );
    }
}
