#[cfg(test)]
use crate::core::config::MinIOConfig;
#[cfg(test)]
use crate::features::accounts::models::AccountRole;
#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{Extension, Router};
#[cfg(test)]
use chrono::{DateTime, Utc};
#[cfg(test)]
use sqlx::PgPool;
#[cfg(test)]
use fake::{faker::internet::en::Username, faker::name::en::Name, Fake};
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
fn create_user(role: AccountRole) -> AuthenticatedUser {
    let username: String = Username().fake();
    AuthenticatedUser {
        account_id: Uuid::now_v7(),
        username: username.replace('.', "_"),
        full_name: Name().fake(),
        role,
        session_id: Uuid::now_v7(),
    }
}

#[cfg(test)]
pub fn create_worker_user() -> AuthenticatedUser {
    create_user(AccountRole::Worker)
}

#[cfg(test)]
pub fn create_administrator_user() -> AuthenticatedUser {
    create_user(AccountRole::Administrator)
}

/// Attach `user` to every request as if the auth middleware had resolved it
#[cfg(test)]
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(Extension(user))
}

/// Storage settings for clients that are built but never connected
#[cfg(test)]
pub fn test_minio_config() -> MinIOConfig {
    MinIOConfig {
        endpoint: "http://127.0.0.1:9000".to_string(),
        public_endpoint: "https://files.example.org/".to_string(),
        access_key: "minio".to_string(),
        secret_key: "minio-secret".to_string(),
        bucket: "incident-desk".to_string(),
        region: "us-east-1".to_string(),
        prefix: "/incidents/".to_string(),
    }
}

/// Insert an active account with `role` and return it as a signed-in user
#[cfg(test)]
pub async fn insert_account(
    pool: &PgPool,
    role: AccountRole,
    at: DateTime<Utc>,
) -> AuthenticatedUser {
    let mut user = create_user(role);
    user.username = format!("{}_{}", user.username, &user.account_id.simple().to_string()[24..]);
    sqlx::query(
        r#"
        INSERT INTO accounts (id, username, full_name, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'not-a-real-hash', $5, $6, $6)
        "#,
    )
    .bind(user.account_id)
    .bind(&user.username)
    .bind(&user.full_name)
    .bind(format!("{}@example.org", user.username))
    .bind(user.role)
    .bind(at)
    .execute(pool)
    .await
    .unwrap();
    user
}
