use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::incidents::models::{
    AdminComment, Incident, IncidentCategory, IncidentPriority, IncidentStatus, StatusChange,
};
use crate::shared::constants::MAX_COMMENT_LENGTH;
use crate::shared::validation::not_blank;

/// Request DTO for filing an incident
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateIncidentDto {
    #[serde(alias = "tipo_incidencia")]
    pub category: IncidentCategory,

    #[serde(alias = "descripcion")]
    #[validate(
        length(min = 1, max = 5000, message = "Description must be 1-5000 characters"),
        custom(function = "not_blank")
    )]
    pub description: String,

    /// Defaults to medium
    #[serde(default, alias = "prioridad")]
    pub priority: Option<IncidentPriority>,

    #[serde(default, alias = "ubicacion")]
    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,
}

/// Request DTO for editing an incident's details.
///
/// Status is not editable here; it changes only through the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateIncidentDto {
    #[serde(default, alias = "tipo_incidencia")]
    pub category: Option<IncidentCategory>,

    #[serde(default, alias = "descripcion")]
    #[validate(
        length(min = 1, max = 5000, message = "Description must be 1-5000 characters"),
        custom(function = "not_blank")
    )]
    pub description: Option<String>,

    #[serde(default, alias = "prioridad")]
    pub priority: Option<IncidentPriority>,

    #[serde(default, alias = "ubicacion")]
    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,
}

/// Request DTO for a status change
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangeStatusDto {
    #[serde(alias = "estado")]
    pub status: IncidentStatus,

    /// Defaults to "Status changed to <status>" when absent or blank
    #[serde(default, alias = "comentario")]
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Request DTO for an administrator comment
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddCommentDto {
    #[serde(alias = "mensaje")]
    #[validate(
        length(min = 1, max = MAX_COMMENT_LENGTH, message = "Message must be 1-1000 characters"),
        custom(function = "not_blank")
    )]
    pub message: String,

    #[serde(default = "default_visible", alias = "es_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Multipart form for attaching an image
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadImageDto {
    /// JPEG, PNG, WebP or GIF, at most 5 MB (field name `image` or `imagen`)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

/// Query parameters for listing incidents
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListIncidentsQuery {
    /// Status filter; "todos" or unknown values are ignored
    #[serde(alias = "estado")]
    pub status: Option<String>,
    /// Category filter; "todos" or unknown values are ignored
    #[serde(alias = "tipo")]
    pub category: Option<String>,
    /// Priority filter; "todas" or unknown values are ignored
    #[serde(alias = "prioridad")]
    pub priority: Option<String>,
}

/// Response DTO for one audit entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeResponseDto {
    pub id: Uuid,
    pub previous_status: Option<IncidentStatus>,
    pub new_status: IncidentStatus,
    pub comment: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<StatusChange> for StatusChangeResponseDto {
    fn from(c: StatusChange) -> Self {
        Self {
            id: c.id,
            previous_status: c.previous_status,
            new_status: c.new_status,
            comment: c.comment,
            actor_id: c.actor_id,
            actor_name: c.actor_name,
            created_at: c.created_at,
        }
    }
}

/// Response DTO for an administrator comment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminCommentResponseDto {
    pub id: Uuid,
    pub message: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AdminComment> for AdminCommentResponseDto {
    fn from(c: AdminComment) -> Self {
        Self {
            id: c.id,
            message: c.message,
            actor_id: c.actor_id,
            actor_name: c.actor_name,
            is_visible: c.is_visible,
            created_at: c.created_at,
        }
    }
}

/// Response DTO for incident in listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentResponseDto {
    pub id: Uuid,
    pub category: IncidentCategory,
    pub description: String,
    pub priority: IncidentPriority,
    pub location: String,
    pub status: IncidentStatus,
    pub creator_id: Uuid,
    pub creator_name: String,
    /// Public URL of the attached image
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl IncidentResponseDto {
    /// Build from a model, resolving the image key to a URL
    pub fn from_incident(incident: Incident, image_url: impl Fn(&str) -> String) -> Self {
        Self {
            id: incident.id,
            category: incident.category,
            description: incident.description,
            priority: incident.priority,
            location: incident.location,
            status: incident.status,
            creator_id: incident.creator_id,
            creator_name: incident.creator_name,
            image_url: incident.image_key.as_deref().map(image_url),
            created_at: incident.created_at,
            updated_at: incident.updated_at,
            resolved_at: incident.resolved_at,
        }
    }
}

/// Response DTO for one incident with its audit trail and comments
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentDetailResponseDto {
    #[serde(flatten)]
    pub incident: IncidentResponseDto,
    /// Oldest first; the first entry is always the creation event
    pub history: Vec<StatusChangeResponseDto>,
    /// Oldest first; hidden comments are omitted for non-administrators
    pub comments: Vec<AdminCommentResponseDto>,
}
