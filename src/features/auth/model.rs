use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::accounts::models::AccountRole;

/// Caller identity resolved from a live session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub account_id: Uuid,
    pub username: String,
    pub full_name: String,
    /// Role as currently stored, not as it was when the token was issued
    pub role: AccountRole,
    pub session_id: Uuid,
}

impl AuthenticatedUser {
    pub fn is_administrator(&self) -> bool {
        self.role == AccountRole::Administrator
    }
}

/// Claims carried by issued access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account id
    pub sub: String,
    /// Session id
    pub jti: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub role: AccountRole,
}
