use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;

/// Create dashboard routes
pub fn routes(dashboard_service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/estadisticas", get(handlers::get_statistics))
        .with_state(dashboard_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database::lazy_test_pool;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    #[tokio::test]
    async fn test_statistics_require_identity() {
        let server =
            TestServer::new(routes(Arc::new(DashboardService::new(lazy_test_pool())))).unwrap();

        let response = server.get("/api/estadisticas").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
    }
}
