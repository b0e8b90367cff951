use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::auth::guards::RequireTriage;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::incidents::dtos::{
    AddCommentDto, AdminCommentResponseDto, ChangeStatusDto, CreateIncidentDto,
    IncidentDetailResponseDto, IncidentResponseDto, ListIncidentsQuery, UpdateIncidentDto,
    UploadImageDto,
};
use crate::features::incidents::services::{ImageService, IncidentService};
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List incidents visible to the caller
#[utoipa::path(
    get,
    path = "/api/incidencias",
    params(ListIncidentsQuery, PaginationQuery),
    responses(
        (status = 200, description = "Incidents retrieved successfully", body = ApiResponse<Vec<IncidentResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_incidents(
    user: AuthenticatedUser,
    State(service): State<Arc<IncidentService>>,
    AppQuery(query): AppQuery<ListIncidentsQuery>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentResponseDto>>>> {
    let (incidents, total) = service.list(&user, &query, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(incidents),
        None,
        Some(Meta { total }),
    )))
}

/// File a new incident
#[utoipa::path(
    post,
    path = "/api/incidencias",
    request_body = CreateIncidentDto,
    responses(
        (status = 201, description = "Incident created", body = ApiResponse<IncidentDetailResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_incident(
    user: AuthenticatedUser,
    State(service): State<Arc<IncidentService>>,
    AppJson(dto): AppJson<CreateIncidentDto>,
) -> Result<(StatusCode, Json<ApiResponse<IncidentDetailResponseDto>>)> {
    dto.validate()?;

    let incident = service.create(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(incident),
            Some("Incident created".to_string()),
            None,
        )),
    ))
}

/// Get an incident with its history and comments
#[utoipa::path(
    get,
    path = "/api/incidencias/{id}",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident retrieved successfully", body = ApiResponse<IncidentDetailResponseDto>),
        (status = 403, description = "Incident belongs to another account"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_incident(
    user: AuthenticatedUser,
    State(service): State<Arc<IncidentService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<IncidentDetailResponseDto>>> {
    let incident = service.get(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(incident), None, None)))
}

/// Edit an incident's details
#[utoipa::path(
    put,
    path = "/api/incidencias/{id}",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    request_body = UpdateIncidentDto,
    responses(
        (status = 200, description = "Incident updated", body = ApiResponse<IncidentDetailResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Incident belongs to another account"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_incident(
    user: AuthenticatedUser,
    State(service): State<Arc<IncidentService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateIncidentDto>,
) -> Result<Json<ApiResponse<IncidentDetailResponseDto>>> {
    dto.validate()?;

    let incident = service.update(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(incident),
        Some("Incident updated".to_string()),
        None,
    )))
}

/// Delete an incident
#[utoipa::path(
    delete,
    path = "/api/incidencias/{id}",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident deleted"),
        (status = 403, description = "Incident belongs to another account"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_incident(
    user: AuthenticatedUser,
    State(service): State<Arc<IncidentService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Incident deleted".to_string()),
        None,
    )))
}

/// Change an incident's status (administrators only)
#[utoipa::path(
    post,
    path = "/api/incidencias/{id}/cambiar-estado",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    request_body = ChangeStatusDto,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<IncidentDetailResponseDto>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_incident_status(
    RequireTriage(admin): RequireTriage,
    State(service): State<Arc<IncidentService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<ChangeStatusDto>,
) -> Result<Json<ApiResponse<IncidentDetailResponseDto>>> {
    dto.validate()?;

    let incident = service.change_status(&admin, id, dto).await?;
    let message = format!("Status changed to {}", incident.incident.status);
    Ok(Json(ApiResponse::success(Some(incident), Some(message), None)))
}

/// Add an administrator comment
#[utoipa::path(
    post,
    path = "/api/incidencias/{id}/agregar-comentario",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    request_body = AddCommentDto,
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<AdminCommentResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_incident_comment(
    RequireTriage(admin): RequireTriage,
    State(service): State<Arc<IncidentService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<AddCommentDto>,
) -> Result<(StatusCode, Json<ApiResponse<AdminCommentResponseDto>>)> {
    dto.validate()?;

    let comment = service.add_comment(&admin, id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(comment),
            Some("Comment added".to_string()),
            None,
        )),
    ))
}

/// Attach or replace the incident's image
///
/// Accepts multipart/form-data with one `image` (or `imagen`) file field.
#[utoipa::path(
    post,
    path = "/api/incidencias/{id}/imagen",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    request_body(
        content = UploadImageDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Image attached", body = ApiResponse<IncidentDetailResponseDto>),
        (status = 400, description = "Missing, oversized or unsupported image"),
        (status = 403, description = "Incident belongs to another account"),
        (status = 404, description = "Incident not found")
    ),
    tag = "incidents",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn attach_incident_image(
    user: AuthenticatedUser,
    State(service): State<Arc<ImageService>>,
    AppPath(id): AppPath<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<IncidentDetailResponseDto>>> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image" | "imagen" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read image bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read image data: {}", e))
                })?;

                upload = Some((data.to_vec(), content_type));
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (data, content_type) =
        upload.ok_or_else(|| AppError::BadRequest("Image is required".to_string()))?;

    let incident = service.attach(&user, id, data, &content_type).await?;
    Ok(Json(ApiResponse::success(
        Some(incident),
        Some("Image attached".to_string()),
        None,
    )))
}
