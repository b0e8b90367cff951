use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppPath, AppQuery};
use crate::features::accounts::dtos::{
    AccountResponseDto, CreateAccountDto, ListAccountsQuery, PasswordResetResponseDto,
    SetAccountStatusDto, UpdateAccountDto,
};
use crate::features::accounts::services::{AccountFilter, AccountService};
use crate::features::auth::guards::RequireAccountAdmin;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// List accounts
#[utoipa::path(
    get,
    path = "/api/usuarios",
    params(ListAccountsQuery, PaginationQuery),
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_accounts(
    RequireAccountAdmin(_admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppQuery(query): AppQuery<ListAccountsQuery>,
    AppQuery(pagination): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AccountResponseDto>>>> {
    let filter = AccountFilter::from_query(&query);
    let (accounts, total) = service.list(&filter, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(accounts),
        None,
        Some(Meta { total }),
    )))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/usuarios",
    request_body = CreateAccountDto,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AccountResponseDto>),
        (status = 400, description = "Validation error or username taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator access required")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_account(
    RequireAccountAdmin(_admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppJson(dto): AppJson<CreateAccountDto>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponseDto>>)> {
    dto.validate()?;

    let account = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(account),
            Some("Account created".to_string()),
            None,
        )),
    ))
}

/// Get account by ID
#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponseDto>),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_account(
    RequireAccountAdmin(_admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<AccountResponseDto>>> {
    let account = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(account), None, None)))
}

/// Update account
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = UpdateAccountDto,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<AccountResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_account(
    RequireAccountAdmin(admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<UpdateAccountDto>,
) -> Result<Json<ApiResponse<AccountResponseDto>>> {
    dto.validate()?;

    let account = service.update(&admin, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(account),
        Some("Account updated".to_string()),
        None,
    )))
}

/// Delete account
#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Account still referenced")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_account(
    RequireAccountAdmin(admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&admin, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Account deleted".to_string()),
        None,
    )))
}

/// Activate or deactivate an account
#[utoipa::path(
    post,
    path = "/api/usuarios/{id}/cambiar-estado",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = SetAccountStatusDto,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<AccountResponseDto>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_account_status(
    RequireAccountAdmin(admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<SetAccountStatusDto>,
) -> Result<Json<ApiResponse<AccountResponseDto>>> {
    let account = service.set_status(&admin, id, dto.status).await?;
    let message = format!("Account {}", account.status);
    Ok(Json(ApiResponse::success(Some(account), Some(message), None)))
}

/// Reset an account's password to a temporary value
#[utoipa::path(
    post,
    path = "/api/usuarios/{id}/restablecer-password",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<PasswordResetResponseDto>),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Account not found")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reset_account_password(
    RequireAccountAdmin(_admin): RequireAccountAdmin,
    State(service): State<Arc<AccountService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<PasswordResetResponseDto>>> {
    let response = service.reset_password(id).await?;
    Ok(Json(ApiResponse::success(
        Some(response),
        Some("Password reset".to_string()),
        None,
    )))
}
