use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Incident category matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "incident_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    Hardware,
    Software,
    #[serde(alias = "red")]
    Network,
    #[serde(alias = "otro")]
    Other,
}

impl std::fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentCategory::Hardware => write!(f, "hardware"),
            IncidentCategory::Software => write!(f, "software"),
            IncidentCategory::Network => write!(f, "network"),
            IncidentCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for IncidentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardware" => Ok(IncidentCategory::Hardware),
            "software" => Ok(IncidentCategory::Software),
            "network" | "red" => Ok(IncidentCategory::Network),
            "other" | "otro" => Ok(IncidentCategory::Other),
            other => Err(format!("Unknown incident category '{}'", other)),
        }
    }
}

/// Incident priority matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "incident_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentPriority {
    #[serde(alias = "baja")]
    Low,
    #[serde(alias = "media")]
    Medium,
    #[serde(alias = "alta")]
    High,
}

impl std::fmt::Display for IncidentPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentPriority::Low => write!(f, "low"),
            IncidentPriority::Medium => write!(f, "medium"),
            IncidentPriority::High => write!(f, "high"),
        }
    }
}

impl FromStr for IncidentPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "baja" => Ok(IncidentPriority::Low),
            "medium" | "media" => Ok(IncidentPriority::Medium),
            "high" | "alta" => Ok(IncidentPriority::High),
            other => Err(format!("Unknown incident priority '{}'", other)),
        }
    }
}

/// Incident status matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "incident_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    #[serde(alias = "pendiente")]
    Pending,
    #[serde(alias = "en_proceso")]
    InProgress,
    #[serde(alias = "resuelto")]
    Resolved,
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::Pending => write!(f, "pending"),
            IncidentStatus::InProgress => write!(f, "in_progress"),
            IncidentStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pendiente" => Ok(IncidentStatus::Pending),
            "in_progress" | "en_proceso" => Ok(IncidentStatus::InProgress),
            "resolved" | "resuelto" => Ok(IncidentStatus::Resolved),
            other => Err(format!("Unknown incident status '{}'", other)),
        }
    }
}

/// Database model for incident, joined with its creator's display name
#[derive(Debug, Clone, FromRow)]
pub struct Incident {
    pub id: Uuid,
    pub category: IncidentCategory,
    pub description: String,
    pub priority: IncidentPriority,
    pub location: String,
    pub status: IncidentStatus,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub image_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
