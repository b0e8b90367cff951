use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::features::incidents::models::IncidentStatus;

/// Incident counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct IncidentStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

impl IncidentStats {
    /// Count statuses of an already fetched set of incidents
    pub fn tally(statuses: impl IntoIterator<Item = IncidentStatus>) -> Self {
        statuses
            .into_iter()
            .fold(Self::default(), |mut stats, status| {
                stats.total += 1;
                match status {
                    IncidentStatus::Pending => stats.pending += 1,
                    IncidentStatus::InProgress => stats.in_progress += 1,
                    IncidentStatus::Resolved => stats.resolved += 1,
                }
                stats
            })
    }
}
