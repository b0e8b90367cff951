use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::core::extractor::AppQuery;
use crate::features::auth::guards::RequireReportAccess;
use crate::features::reports::dtos::{ReportQuery, ReportResponseDto};
use crate::features::reports::services::ReportService;
use crate::shared::types::ApiResponse;

/// Filtered incident report (administrators only)
#[utoipa::path(
    get,
    path = "/api/reportes",
    params(ReportQuery),
    responses(
        (status = 200, description = "Report generated", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn generate_report(
    RequireReportAccess(admin): RequireReportAccess,
    State(service): State<Arc<ReportService>>,
    AppQuery(query): AppQuery<ReportQuery>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.generate(&admin, &query).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}
