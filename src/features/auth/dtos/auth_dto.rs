use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::accounts::dtos::AccountResponseDto;

/// Request DTO for login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response DTO for a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    /// Signed HS256 access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    /// Authenticated account
    pub user: AccountResponseDto,
}

/// Response DTO for logout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponseDto {
    /// Number of sessions that were revoked
    pub revoked_sessions: u64,
}
