use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::incidents::handlers;
use crate::features::incidents::services::{ImageService, IncidentService};
use crate::shared::constants::MAX_IMAGE_SIZE;

/// Incident routes for any authenticated account
pub fn routes(incidents: Arc<IncidentService>, images: Arc<ImageService>) -> Router {
    let incident_routes = Router::new()
        .route(
            "/api/incidencias",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route(
            "/api/incidencias/{id}",
            get(handlers::get_incident)
                .put(handlers::update_incident)
                .delete(handlers::delete_incident),
        )
        .route(
            "/api/incidencias/{id}/cambiar-estado",
            post(handlers::change_incident_status),
        )
        .route(
            "/api/incidencias/{id}/agregar-comentario",
            post(handlers::add_incident_comment),
        )
        .with_state(incidents);

    let image_routes = Router::new()
        .route(
            "/api/incidencias/{id}/imagen",
            post(handlers::attach_incident_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024)),
        )
        .with_state(images);

    incident_routes.merge(image_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, SystemClock};
    use crate::core::database::lazy_test_pool;
    use crate::features::auth::model::AuthenticatedUser;
    use crate::modules::storage::MinIOClient;
    use crate::shared::test_helpers::{
        create_administrator_user, create_worker_user, test_minio_config, with_user,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn router() -> Router {
        let pool = lazy_test_pool();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = Arc::new(MinIOClient::new(test_minio_config()).unwrap());
        let incidents = Arc::new(IncidentService::new(pool, storage.clone(), clock));
        let images = Arc::new(ImageService::new(incidents.clone(), storage));
        routes(incidents, images)
    }

    fn server_for(user: AuthenticatedUser) -> TestServer {
        TestServer::new(with_user(router(), user)).unwrap()
    }

    #[tokio::test]
    async fn test_worker_cannot_triage_whatever_the_payload() {
        let server = server_for(create_worker_user());
        let id = Uuid::now_v7();

        let responses = vec![
            server
                .post(&format!("/api/incidencias/{}/cambiar-estado", id))
                .json(&json!({"estado": "resuelto"}))
                .await,
            server
                .post(&format!("/api/incidencias/{}/cambiar-estado", id))
                .json(&json!({"estado": "archived"}))
                .await,
            server
                .post(&format!("/api/incidencias/{}/agregar-comentario", id))
                .json(&json!({"mensaje": "Replacement ordered"}))
                .await,
            server
                .post(&format!("/api/incidencias/{}/agregar-comentario", id))
                .json(&json!({}))
                .await,
        ];

        for response in responses {
            assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
            let body: Value = response.json();
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "You do not have permission to perform this action");
        }
    }

    #[tokio::test]
    async fn test_admin_status_change_rejects_unknown_status() {
        let server = server_for(create_administrator_user());

        let response = server
            .post(&format!("/api/incidencias/{}/cambiar-estado", Uuid::now_v7()))
            .json(&json!({"estado": "archived"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_admin_comment_requires_message() {
        let server = server_for(create_administrator_user());

        let response = server
            .post(&format!("/api/incidencias/{}/agregar-comentario", Uuid::now_v7()))
            .json(&json!({"mensaje": ""}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload_before_storage() {
        let server = server_for(create_worker_user());

        let empty_description = server
            .post("/api/incidencias")
            .json(&json!({"tipo_incidencia": "hardware", "descripcion": ""}))
            .await;
        assert_eq!(empty_description.status_code(), StatusCode::BAD_REQUEST);

        let blank_description = server
            .post("/api/incidencias")
            .json(&json!({"tipo_incidencia": "hardware", "descripcion": "   "}))
            .await;
        assert_eq!(blank_description.status_code(), StatusCode::BAD_REQUEST);

        let unknown_category = server
            .post("/api/incidencias")
            .json(&json!({"tipo_incidencia": "furniture", "descripcion": "chair broke"}))
            .await;
        assert_eq!(unknown_category.status_code(), StatusCode::BAD_REQUEST);

        let long_location = server
            .post("/api/incidencias")
            .json(&json!({
                "tipo_incidencia": "red",
                "descripcion": "switch down",
                "ubicacion": "x".repeat(201)
            }))
            .await;
        assert_eq!(long_location.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_incident_id_is_bad_request() {
        let server = server_for(create_worker_user());

        let response = server.get("/api/incidencias/not-a-uuid").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let server = TestServer::new(router()).unwrap();

        let response = server.get("/api/incidencias").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .post(&format!("/api/incidencias/{}/cambiar-estado", Uuid::now_v7()))
            .json(&json!({"estado": "resuelto"}))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
