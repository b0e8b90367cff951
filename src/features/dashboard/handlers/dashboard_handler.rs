use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::dtos::IncidentStats;
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::ApiResponse;

/// Incident counts per status; workers see only their own incidents
#[utoipa::path(
    get,
    path = "/api/estadisticas",
    tag = "dashboard",
    responses(
        (status = 200, description = "Incident statistics", body = ApiResponse<IncidentStats>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_statistics(
    user: AuthenticatedUser,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<IncidentStats>>> {
    let stats = service.statistics(&user).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}
