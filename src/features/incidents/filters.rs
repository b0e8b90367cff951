//! Row filters shared by incident listings, statistics and reports.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use utoipa::ToSchema;
use uuid::Uuid;

use super::dtos::ListIncidentsQuery;
use super::models::{IncidentCategory, IncidentPriority, IncidentStatus};
use crate::features::auth::policy::IncidentScope;
use crate::shared::types::lenient_filter;

/// Conditions over the `incidents` table, aliased as `i`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IncidentFilter {
    /// Owner restriction from the caller's role; never echoed back
    #[serde(skip)]
    pub owner: Option<Uuid>,
    pub status: Option<IncidentStatus>,
    pub category: Option<IncidentCategory>,
    pub priority: Option<IncidentPriority>,
    /// Inclusive lower bound on the UTC creation day
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the UTC creation day
    pub date_to: Option<NaiveDate>,
}

impl IncidentFilter {
    /// Filter containing only the caller's scope
    pub fn scoped(scope: IncidentScope) -> Self {
        Self {
            owner: scope.owner(),
            ..Default::default()
        }
    }

    /// Add the enum filters from a listing query; unknown values are dropped
    pub fn with_query(mut self, query: &ListIncidentsQuery) -> Self {
        self.status = lenient_filter(query.status.as_deref(), |s| s.parse().ok());
        self.category = lenient_filter(query.category.as_deref(), |s| s.parse().ok());
        self.priority = lenient_filter(query.priority.as_deref(), |s| s.parse().ok());
        self
    }

    /// Add creation-day bounds; malformed dates are dropped
    pub fn with_dates(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.date_from = lenient_filter(from, parse_day);
        self.date_to = lenient_filter(to, parse_day);
        self
    }

    /// Append `WHERE` conditions for this filter
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(owner) = self.owner {
            qb.push(" AND i.creator_id = ").push_bind(owner);
        }
        if let Some(status) = self.status {
            qb.push(" AND i.status = ").push_bind(status);
        }
        if let Some(category) = self.category {
            qb.push(" AND i.category = ").push_bind(category);
        }
        if let Some(priority) = self.priority {
            qb.push(" AND i.priority = ").push_bind(priority);
        }
        if let Some(from) = self.date_from {
            qb.push(" AND (i.created_at AT TIME ZONE 'UTC')::date >= ")
                .push_bind(from);
        }
        if let Some(to) = self.date_to {
            qb.push(" AND (i.created_at AT TIME ZONE 'UTC')::date <= ")
                .push_bind(to);
        }
    }
}

/// Parse a `YYYY-MM-DD` day
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(filter: &IncidentFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM incidents i");
        filter.push_conditions(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_unfiltered_admin_scope() {
        let filter = IncidentFilter::scoped(IncidentScope::All);
        assert_eq!(sql_for(&filter), "SELECT COUNT(*) FROM incidents i WHERE TRUE");
    }

    #[test]
    fn test_worker_scope_always_restricts_owner() {
        let owner = Uuid::now_v7();
        let filter = IncidentFilter::scoped(IncidentScope::OwnedBy(owner)).with_query(
            &ListIncidentsQuery {
                status: Some("pendiente".to_string()),
                category: None,
                priority: Some("alta".to_string()),
            },
        );
        assert_eq!(filter.owner, Some(owner));
        assert_eq!(filter.status, Some(IncidentStatus::Pending));
        assert_eq!(filter.priority, Some(IncidentPriority::High));
        assert_eq!(
            sql_for(&filter),
            "SELECT COUNT(*) FROM incidents i WHERE TRUE AND i.creator_id = $1 AND i.status = $2 AND i.priority = $3"
        );
    }

    #[test]
    fn test_wildcards_and_unknown_values_ignored() {
        let filter = IncidentFilter::scoped(IncidentScope::All).with_query(&ListIncidentsQuery {
            status: Some("todos".to_string()),
            category: Some("plumbing".to_string()),
            priority: Some("todas".to_string()),
        });
        assert_eq!(filter, IncidentFilter::default());
    }

    #[test]
    fn test_malformed_dates_ignored() {
        let filter = IncidentFilter::default().with_dates(Some("2025-13-45"), Some("yesterday"));
        assert_eq!(filter.date_from, None);
        assert_eq!(filter.date_to, None);

        let filter = IncidentFilter::default().with_dates(Some("2099-01-01"), Some(""));
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2099, 1, 1));
        assert_eq!(filter.date_to, None);
        assert_eq!(
            sql_for(&filter),
            "SELECT COUNT(*) FROM incidents i WHERE TRUE AND (i.created_at AT TIME ZONE 'UTC')::date >= $1"
        );
    }

    #[test]
    fn test_echo_omits_owner() {
        let filter = IncidentFilter::scoped(IncidentScope::OwnedBy(Uuid::now_v7()))
            .with_dates(Some("2025-01-01"), None);
        let json = serde_json::to_value(&filter).unwrap();
        assert!(json.get("owner").is_none());
        assert_eq!(json["date_from"], "2025-01-01");
        assert!(json["status"].is_null());
    }
}
