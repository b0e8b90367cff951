use crate::core::clock::Clock;
use crate::core::error::{AppError, Result};
use crate::features::accounts::dtos::AccountResponseDto;
use crate::features::accounts::AccountService;
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, LogoutResponseDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::password::verify_password;
use crate::features::auth::services::{SessionService, TokenService};
use std::sync::Arc;

/// Service for authentication operations (login, logout, me)
pub struct AuthService {
    account_service: Arc<AccountService>,
    session_service: Arc<SessionService>,
    token_service: Arc<TokenService>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        account_service: Arc<AccountService>,
        session_service: Arc<SessionService>,
        token_service: Arc<TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            account_service,
            session_service,
            token_service,
            clock,
        }
    }

    /// Login with username and password
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let invalid = || AppError::Auth("Invalid credentials".to_string());

        let account = self
            .account_service
            .find_by_username(dto.username.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&dto.password, &account.password_hash) {
            tracing::info!("Failed login for '{}'", account.username);
            return Err(invalid());
        }

        if !account.is_active() {
            return Err(AppError::Auth("Account is inactive".to_string()));
        }

        let now = self.clock.now();
        let account = self.account_service.touch_last_access(account.id, now).await?;

        let ttl = self.token_service.ttl();
        let session_id = self.session_service.open(account.id, now, now + ttl).await?;
        let issued = self
            .token_service
            .issue(account.id, account.role, session_id, now)?;

        tracing::info!("Account '{}' signed in (session {})", account.username, session_id);

        Ok(AuthResponseDto {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: account.into(),
        })
    }

    /// Revoke every live session of the caller
    pub async fn logout(&self, user: &AuthenticatedUser) -> Result<LogoutResponseDto> {
        let revoked = self
            .session_service
            .revoke_account(user.account_id)
            .await?;

        tracing::info!(
            "Account '{}' signed out ({} sessions revoked)",
            user.username,
            revoked
        );

        Ok(LogoutResponseDto {
            revoked_sessions: revoked,
        })
    }

    /// Current account profile
    pub async fn me(&self, user: &AuthenticatedUser) -> Result<AccountResponseDto> {
        self.account_service.get(user.account_id).await
    }
}
