use super::model::AuthenticatedUser;
use super::services::{SessionService, TokenService};
use crate::core::error::AppError;
use std::sync::Arc;

/// Turns a bearer token into the caller it belongs to.
///
/// The token proves who signed in; the session row decides whether that
/// sign-in is still valid and supplies the account's current role.
pub struct JwtValidator {
    token_service: Arc<TokenService>,
    session_service: Arc<SessionService>,
}

impl JwtValidator {
    pub fn new(token_service: Arc<TokenService>, session_service: Arc<SessionService>) -> Self {
        Self {
            token_service,
            session_service,
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.token_service.verify(token)?;
        let (account_id, session_id) = TokenService::subject_ids(&claims)?;

        let user = self
            .session_service
            .resolve(session_id, account_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(
                    "Rejected token for account {}: session {} is not live",
                    account_id,
                    session_id
                );
                AppError::Auth("Session expired or revoked".to_string())
            })?;

        tracing::debug!("Authenticated {} ({})", user.username, user.role);
        Ok(user)
    }
}
