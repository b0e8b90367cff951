use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::accounts::handlers;
use crate::features::accounts::services::AccountService;

/// Account administration routes (administrators only)
pub fn routes(service: Arc<AccountService>) -> Router {
    Router::new()
        .route(
            "/api/usuarios",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/api/usuarios/{id}",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route(
            "/api/usuarios/{id}/cambiar-estado",
            post(handlers::set_account_status),
        )
        .route(
            "/api/usuarios/{id}/restablecer-password",
            post(handlers::reset_account_password),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, SystemClock};
    use crate::core::database::lazy_test_pool;
    use crate::features::auth::services::SessionService;
    use crate::features::auth::model::AuthenticatedUser;
    use crate::shared::test_helpers::{create_administrator_user, create_worker_user, with_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn server_for(user: AuthenticatedUser) -> TestServer {
        let pool = lazy_test_pool();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let sessions = Arc::new(SessionService::new(pool.clone(), clock.clone()));
        let service = Arc::new(AccountService::new(pool, sessions, clock));
        TestServer::new(with_user(routes(service), user)).unwrap()
    }

    #[tokio::test]
    async fn test_worker_is_refused_on_every_account_endpoint() {
        let server = server_for(create_worker_user());
        let id = Uuid::now_v7();

        let responses = vec![
            server.get("/api/usuarios").await,
            server.post("/api/usuarios").json(&json!({})).await,
            server.get(&format!("/api/usuarios/{}", id)).await,
            server
                .put(&format!("/api/usuarios/{}", id))
                .json(&json!({"full_name": "x"}))
                .await,
            server.delete(&format!("/api/usuarios/{}", id)).await,
            server
                .post(&format!("/api/usuarios/{}/cambiar-estado", id))
                .json(&json!({"estado": "nonsense"}))
                .await,
            server
                .post(&format!("/api/usuarios/{}/restablecer-password", id))
                .await,
        ];

        for response in responses {
            assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
            let body: Value = response.json();
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "You do not have permission to manage accounts");
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload_before_storage() {
        let server = server_for(create_administrator_user());

        let response = server
            .post("/api/usuarios")
            .json(&json!({
                "username": "1bad",
                "nombre_completo": "Bad Name",
                "email": "bad@example.org",
                "password": "secret1",
                "confirm_password": "secret2"
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn test_status_toggle_rejects_unknown_status() {
        let server = server_for(create_administrator_user());

        let response = server
            .post(&format!("/api/usuarios/{}/cambiar-estado", Uuid::now_v7()))
            .json(&json!({"estado": "suspendido"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_account_id_is_bad_request() {
        let server = server_for(create_administrator_user());

        let response = server.get("/api/usuarios/not-a-uuid").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let admin = create_administrator_user();
        let own_id = admin.account_id;
        let server = server_for(admin);

        let response = server.delete(&format!("/api/usuarios/{}", own_id)).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let pool = lazy_test_pool();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let sessions = Arc::new(SessionService::new(pool.clone(), clock.clone()));
        let server =
            TestServer::new(routes(Arc::new(AccountService::new(pool, sessions, clock)))).unwrap();

        let response = server.get("/api/usuarios").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
