use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::clock::Clock;
use crate::core::config::BootstrapAdminConfig;
use crate::core::error::{is_foreign_key_violation, is_unique_violation, AppError, Result};
use crate::features::accounts::dtos::{
    AccountResponseDto, CreateAccountDto, ListAccountsQuery, PasswordResetResponseDto,
    UpdateAccountDto,
};
use crate::features::accounts::models::{Account, AccountRole, AccountStatus};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::password::{hash_password, temporary_password};
use crate::features::auth::services::SessionService;
use crate::shared::types::{lenient_filter, PaginationQuery};

const ACCOUNT_COLUMNS: &str = "id, username, full_name, email, password_hash, role, status, \
     created_at, updated_at, last_access_at";

/// Filters applied when listing accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub search: Option<String>,
    pub role: Option<AccountRole>,
    pub status: Option<AccountStatus>,
}

impl AccountFilter {
    pub fn from_query(query: &ListAccountsQuery) -> Self {
        Self {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            role: lenient_filter(query.role.as_deref(), |s| s.parse().ok()),
            status: lenient_filter(query.status.as_deref(), |s| s.parse().ok()),
        }
    }

    /// Append `WHERE` conditions for this filter
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR username ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(role) = self.role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Service for account administration
pub struct AccountService {
    pool: PgPool,
    session_service: Arc<SessionService>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(pool: PgPool, session_service: Arc<SessionService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            session_service,
            clock,
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch account {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn require(&self, id: Uuid) -> Result<Account> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))
    }

    /// Look up an account by its login name
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE username = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, Account>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch account by username: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Record a successful sign-in
    pub async fn touch_last_access(&self, id: Uuid, at: DateTime<Utc>) -> Result<Account> {
        let sql = format!(
            "UPDATE accounts SET last_access_at = $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))
    }

    /// Create an account
    pub async fn create(&self, dto: CreateAccountDto) -> Result<AccountResponseDto> {
        let password_hash = hash_password(&dto.password)?;
        let now = self.clock.now();

        let sql = format!(
            r#"
            INSERT INTO accounts (id, username, full_name, email, password_hash, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(Uuid::now_v7())
            .bind(dto.username.trim())
            .bind(dto.full_name.trim())
            .bind(dto.email.trim())
            .bind(password_hash)
            .bind(dto.role.unwrap_or(AccountRole::Worker))
            .bind(dto.status.unwrap_or(AccountStatus::Active))
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation(format!("Username '{}' already exists", dto.username))
                } else {
                    tracing::error!("Failed to create account: {:?}", e);
                    AppError::Database(e)
                }
            })?;

        tracing::info!("Account '{}' created as {}", account.username, account.role);
        Ok(account.into())
    }

    /// List accounts, newest first
    pub async fn list(
        &self,
        filter: &AccountFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<AccountResponseDto>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        filter.push_conditions(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count accounts: {:?}", e);
                AppError::Database(e)
            })?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS));
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let accounts = qb
            .build_query_as::<Account>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list accounts: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((accounts.into_iter().map(Into::into).collect(), total))
    }

    /// Get one account
    pub async fn get(&self, id: Uuid) -> Result<AccountResponseDto> {
        self.require(id).await.map(Into::into)
    }

    /// Apply a partial update
    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateAccountDto,
    ) -> Result<AccountResponseDto> {
        let current = self.require(id).await?;
        if let Some(status) = dto.status {
            guard_self_deactivation(actor, id, status)?;
        }

        let username = dto
            .username
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.username)
            .to_string();

        let sql = format!(
            r#"
            UPDATE accounts
            SET username = $2, full_name = $3, email = $4, role = $5, status = $6, updated_at = $7
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(&username)
            .bind(dto.full_name.as_deref().map(str::trim).unwrap_or(&current.full_name))
            .bind(dto.email.as_deref().map(str::trim).unwrap_or(&current.email))
            .bind(dto.role.unwrap_or(current.role))
            .bind(dto.status.unwrap_or(current.status))
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation(format!("Username '{}' already exists", username))
                } else {
                    tracing::error!("Failed to update account {}: {:?}", id, e);
                    AppError::Database(e)
                }
            })?;

        Ok(account.into())
    }

    /// Toggle an account between active and inactive
    pub async fn set_status(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<AccountResponseDto> {
        self.require(id).await?;
        guard_self_deactivation(actor, id, status)?;

        let sql = format!(
            "UPDATE accounts SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(status)
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to set status of account {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        tracing::info!("Account '{}' is now {}", account.username, account.status);
        Ok(account.into())
    }

    /// Delete an account that nothing references
    pub async fn delete(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<()> {
        if actor.account_id == id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(
                        "Account is referenced by incidents or their history; deactivate it instead"
                            .to_string(),
                    )
                } else {
                    tracing::error!("Failed to delete account {}: {:?}", id, e);
                    AppError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Account {} not found", id)));
        }

        tracing::info!("Account {} deleted", id);
        Ok(())
    }

    /// Replace the password with a temporary one and revoke live sessions
    pub async fn reset_password(&self, id: Uuid) -> Result<PasswordResetResponseDto> {
        let account = self.require(id).await?;
        let temporary = temporary_password(account.id);
        let password_hash = hash_password(&temporary)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE accounts SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(self.clock.now())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to reset password for {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        let revoked = self.session_service.revoke_all(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Password reset for '{}'", account.username);
        Ok(PasswordResetResponseDto {
            account_id: id,
            temporary_password: temporary,
            revoked_sessions: revoked,
        })
    }

    /// Create the configured administrator when no administrator exists yet
    pub async fn ensure_bootstrap_admin(&self, config: &BootstrapAdminConfig) -> Result<bool> {
        let administrators: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE role = 'administrator'",
        )
        .fetch_one(&self.pool)
        .await?;

        if administrators > 0 {
            tracing::debug!("Administrator present; skipping bootstrap");
            return Ok(false);
        }

        let dto = CreateAccountDto {
            username: config.username.clone(),
            full_name: config.full_name.clone(),
            email: config.email.clone(),
            password: config.password.clone(),
            confirm_password: config.password.clone(),
            role: Some(AccountRole::Administrator),
            status: Some(AccountStatus::Active),
        };
        dto.validate()?;
        self.create(dto).await?;

        tracing::info!("Bootstrap administrator '{}' created", config.username);
        Ok(true)
    }
}

fn guard_self_deactivation(
    actor: &AuthenticatedUser,
    id: Uuid,
    status: AccountStatus,
) -> Result<()> {
    if actor.account_id == id && status == AccountStatus::Inactive {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::create_administrator_user;

    #[test]
    fn test_filter_ignores_wildcards_and_unknown_values() {
        let filter = AccountFilter::from_query(&ListAccountsQuery {
            search: Some("   ".to_string()),
            role: Some("todos".to_string()),
            status: Some("suspended".to_string()),
        });
        assert_eq!(filter, AccountFilter::default());
    }

    #[test]
    fn test_filter_parses_spanish_values() {
        let filter = AccountFilter::from_query(&ListAccountsQuery {
            search: Some(" lopez ".to_string()),
            role: Some("administrador".to_string()),
            status: Some("activo".to_string()),
        });
        assert_eq!(filter.search.as_deref(), Some("lopez"));
        assert_eq!(filter.role, Some(AccountRole::Administrator));
        assert_eq!(filter.status, Some(AccountStatus::Active));
    }

    #[test]
    fn test_filter_sql_binds_each_condition() {
        let filter = AccountFilter {
            search: Some("ana".to_string()),
            role: Some(AccountRole::Worker),
            status: None,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts");
        filter.push_conditions(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM accounts WHERE TRUE AND (full_name ILIKE $1 OR email ILIKE $2 OR username ILIKE $3) AND role = $4"
        );
    }

    #[test]
    fn test_like_metacharacters_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn test_self_deactivation_refused() {
        let admin = create_administrator_user();
        assert!(matches!(
            guard_self_deactivation(&admin, admin.account_id, AccountStatus::Inactive),
            Err(AppError::BadRequest(_))
        ));
        assert!(guard_self_deactivation(&admin, admin.account_id, AccountStatus::Active).is_ok());
        assert!(guard_self_deactivation(&admin, Uuid::now_v7(), AccountStatus::Inactive).is_ok());
    }
}
