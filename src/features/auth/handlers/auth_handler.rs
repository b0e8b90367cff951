use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::accounts::dtos::AccountResponseDto;
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, LogoutResponseDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials or inactive account")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    dto.validate()?;

    let auth_response = service.login(dto).await?;
    Ok(Json(ApiResponse::success(
        Some(auth_response),
        Some("Login successful".to_string()),
        None,
    )))
}

/// Revoke the caller's sessions
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<LogoutResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<LogoutResponseDto>>> {
    let response = service.logout(&user).await?;
    Ok(Json(ApiResponse::success(
        Some(response),
        Some("Logged out".to_string()),
        None,
    )))
}

/// Get current authenticated account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account retrieved successfully", body = ApiResponse<AccountResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<AccountResponseDto>>> {
    let account = service.me(&user).await?;
    Ok(Json(ApiResponse::success(Some(account), None, None)))
}
