use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::auth::policy::IncidentScope;
use crate::features::dashboard::dtos::IncidentStats;
use crate::features::incidents::dtos::{IncidentResponseDto, ListIncidentsQuery};
use crate::features::incidents::filters::IncidentFilter;

/// Query parameters for the administrator report.
///
/// Every parameter is optional; malformed dates and unknown values are ignored.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// First creation day to include (`YYYY-MM-DD`, UTC)
    #[serde(alias = "fecha_desde")]
    pub date_from: Option<String>,
    /// Last creation day to include (`YYYY-MM-DD`, UTC)
    #[serde(alias = "fecha_hasta")]
    pub date_to: Option<String>,
    #[serde(alias = "estado")]
    pub status: Option<String>,
    #[serde(alias = "tipo")]
    pub category: Option<String>,
    #[serde(alias = "prioridad")]
    pub priority: Option<String>,
}

impl ReportQuery {
    /// The filter this query actually applies
    pub fn filter(&self) -> IncidentFilter {
        IncidentFilter::scoped(IncidentScope::All)
            .with_query(&ListIncidentsQuery {
                status: self.status.clone(),
                category: self.category.clone(),
                priority: self.priority.clone(),
            })
            .with_dates(self.date_from.as_deref(), self.date_to.as_deref())
    }
}

/// Report body: matching incidents, their counts and the applied filters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportResponseDto {
    /// Newest first
    pub incidents: Vec<IncidentResponseDto>,
    pub statistics: IncidentStats,
    pub filters: IncidentFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::incidents::models::{IncidentCategory, IncidentStatus};
    use chrono::NaiveDate;

    fn query(
        status: Option<&str>,
        category: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> ReportQuery {
        ReportQuery {
            date_from: from.map(str::to_string),
            date_to: to.map(str::to_string),
            status: status.map(str::to_string),
            category: category.map(str::to_string),
            priority: Some("todas".to_string()),
        }
    }

    #[test]
    fn test_spanish_values_build_full_filter() {
        let filter = query(
            Some("resuelto"),
            Some("red"),
            Some("2025-01-01"),
            Some("2025-01-31"),
        )
        .filter();

        assert_eq!(filter.owner, None);
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(filter.date_to, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(filter.status, Some(IncidentStatus::Resolved));
        assert_eq!(filter.category, Some(IncidentCategory::Network));
        assert_eq!(filter.priority, None);
    }

    #[test]
    fn test_future_lower_bound_is_kept() {
        let filter = query(None, None, Some("2099-01-01"), None).filter();
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2099, 1, 1));
    }

    #[test]
    fn test_malformed_values_are_dropped() {
        let filter = query(Some("archived"), Some("todos"), Some("01/02/2025"), None).filter();
        assert_eq!(filter, IncidentFilter::default());
    }

    #[test]
    fn test_filter_echo_omits_owner() {
        let filter = query(Some("pendiente"), None, None, Some("2025-06-30")).filter();
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "pending",
                "category": null,
                "priority": null,
                "date_from": null,
                "date_to": "2025-06-30"
            })
        );
    }
}
