use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Create routes for the reports feature
pub fn routes(report_service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/reportes", get(handlers::generate_report))
        .with_state(report_service)
}
