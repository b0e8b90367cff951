use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::IncidentStatus;

/// Audit entry for one status transition, joined with the actor's name
#[derive(Debug, Clone, FromRow)]
pub struct StatusChange {
    pub id: Uuid,
    /// `None` only for the creation entry
    pub previous_status: Option<IncidentStatus>,
    pub new_status: IncidentStatus,
    pub comment: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub created_at: DateTime<Utc>,
}

/// Administrator note on an incident, joined with the actor's name
#[derive(Debug, Clone, FromRow)]
pub struct AdminComment {
    pub id: Uuid,
    pub message: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}
