use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::error::Result;
use crate::features::accounts::models::{AccountRole, AccountStatus};
use crate::features::auth::model::AuthenticatedUser;

/// Session joined with the current state of its account
#[derive(Debug, sqlx::FromRow)]
struct SessionPrincipalRow {
    session_id: Uuid,
    account_id: Uuid,
    username: String,
    full_name: String,
    role: AccountRole,
    status: AccountStatus,
}

/// Server-side record of issued tokens
pub struct SessionService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Open a session for an account; returns its id
    pub async fn open(
        &self,
        account_id: Uuid,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let session_id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (id, account_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session_id)
        .bind(account_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(session_id)
    }

    /// Resolve a live session to the caller it belongs to.
    ///
    /// Returns `None` when the session is revoked, expired, belongs to
    /// another account, or the account is no longer active.
    pub async fn resolve(
        &self,
        session_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<AuthenticatedUser>> {
        let row = sqlx::query_as::<_, SessionPrincipalRow>(
            r#"
            SELECT s.id AS session_id, a.id AS account_id, a.username, a.full_name,
                   a.role, a.status
            FROM auth_sessions s
            JOIN accounts a ON a.id = s.account_id
            WHERE s.id = $1
              AND s.account_id = $2
              AND s.revoked_at IS NULL
              AND s.expires_at > $3
            "#,
        )
        .bind(session_id)
        .bind(account_id)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .filter(|r| r.status == AccountStatus::Active)
            .map(|r| AuthenticatedUser {
                account_id: r.account_id,
                username: r.username,
                full_name: r.full_name,
                role: r.role,
                session_id: r.session_id,
            }))
    }

    /// Revoke every open session of an account; returns how many were revoked
    pub async fn revoke_account(&self, account_id: Uuid) -> Result<u64> {
        self.revoke_all(&self.pool, account_id).await
    }

    /// Same as [`Self::revoke_account`] but inside the caller's transaction
    pub async fn revoke_all<'e, E>(&self, executor: E, account_id: Uuid) -> Result<u64>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE auth_sessions
            SET revoked_at = $2
            WHERE account_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(account_id)
        .bind(self.clock.now())
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
