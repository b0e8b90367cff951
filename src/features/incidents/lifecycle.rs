//! Incident status transitions.
//!
//! Transitions are permissive: any status may follow any other, including
//! itself. Planning is pure so the rules can be checked without storage; the
//! service applies a [`Transition`] inside one transaction.

use chrono::{DateTime, Utc};

use super::models::IncidentStatus;

/// Comment recorded on the first audit entry of every incident
pub const CREATION_COMMENT: &str = "Incident created";

/// Everything the store must write for one status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<IncidentStatus>,
    pub next: IncidentStatus,
    pub comment: String,
    /// New value of the incident's resolution timestamp
    pub resolved_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

/// Audit entry synthesized when an incident is filed
pub fn creation(at: DateTime<Utc>) -> Transition {
    Transition {
        previous: None,
        next: IncidentStatus::Pending,
        comment: CREATION_COMMENT.to_string(),
        resolved_at: None,
        at,
    }
}

/// Plan a change from `current` to `next` at instant `at`
pub fn plan(
    current: IncidentStatus,
    next: IncidentStatus,
    comment: Option<&str>,
    at: DateTime<Utc>,
) -> Transition {
    let comment = comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_comment(next));

    Transition {
        previous: Some(current),
        next,
        comment,
        resolved_at: (next == IncidentStatus::Resolved).then_some(at),
        at,
    }
}

pub fn default_comment(status: IncidentStatus) -> String {
    format!("Status changed to {}", status)
}
