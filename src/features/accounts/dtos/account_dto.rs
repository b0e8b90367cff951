use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::accounts::models::{Account, AccountRole, AccountStatus};
use crate::shared::constants::MIN_PASSWORD_LENGTH;
use crate::shared::validation::not_blank;

/// Request DTO for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAccountDto {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *crate::shared::validation::USERNAME_REGEX,
            message = "Username may only contain letters, digits and underscores and must not start with a digit"
        )
    )]
    pub username: String,

    #[serde(alias = "nombre_completo")]
    #[validate(
        length(min = 1, max = 200, message = "Full name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,

    /// Defaults to worker
    #[serde(default, alias = "tipo_usuario")]
    pub role: Option<AccountRole>,

    /// Defaults to active
    #[serde(default, alias = "estado")]
    pub status: Option<AccountStatus>,
}

/// Request DTO for a partial account update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountDto {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *crate::shared::validation::USERNAME_REGEX,
            message = "Username may only contain letters, digits and underscores and must not start with a digit"
        )
    )]
    pub username: Option<String>,

    #[serde(default, alias = "nombre_completo")]
    #[validate(
        length(min = 1, max = 200, message = "Full name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, alias = "tipo_usuario")]
    pub role: Option<AccountRole>,

    #[serde(default, alias = "estado")]
    pub status: Option<AccountStatus>,
}

/// Request DTO for toggling an account's status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetAccountStatusDto {
    #[serde(alias = "estado")]
    pub status: AccountStatus,
}

/// Query parameters for listing accounts
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListAccountsQuery {
    /// Case-insensitive match over full name, email and username
    pub search: Option<String>,
    /// Role filter; unknown values are ignored
    #[serde(alias = "tipo")]
    pub role: Option<String>,
    /// Status filter; unknown values are ignored
    #[serde(alias = "estado")]
    pub status: Option<String>,
}

/// Response DTO for account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponseDto {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountResponseDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            full_name: a.full_name,
            email: a.email,
            role: a.role,
            status: a.status,
            created_at: a.created_at,
            updated_at: a.updated_at,
            last_access_at: a.last_access_at,
        }
    }
}

/// Response DTO for a password reset
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetResponseDto {
    pub account_id: Uuid,
    /// Shown once; the account should change it after signing in
    pub temporary_password: String,
    pub revoked_sessions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateAccountDto {
        CreateAccountDto {
            username: "maria_lopez".to_string(),
            full_name: "María López".to_string(),
            email: "maria@example.org".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            role: None,
            status: None,
        }
    }

    #[test]
    fn test_create_accepts_valid_payload() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_create_rejects_mismatched_confirmation() {
        let dto = CreateAccountDto {
            confirm_password: "secret2".to_string(),
            ..valid_create()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn test_create_rejects_bad_username_short_password_and_email() {
        let dto = CreateAccountDto {
            username: "9lives".to_string(),
            email: "not-an-email".to_string(),
            password: "12345".to_string(),
            confirm_password: "12345".to_string(),
            ..valid_create()
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_create_accepts_spanish_field_names() {
        let dto: CreateAccountDto = serde_json::from_value(serde_json::json!({
            "username": "jperez",
            "nombre_completo": "Juan Pérez",
            "email": "juan@example.org",
            "password": "abcdef",
            "confirm_password": "abcdef",
            "tipo_usuario": "administrador",
            "estado": "inactivo"
        }))
        .unwrap();
        assert_eq!(dto.full_name, "Juan Pérez");
        assert_eq!(dto.role, Some(AccountRole::Administrator));
        assert_eq!(dto.status, Some(AccountStatus::Inactive));
    }

    #[test]
    fn test_whitespace_only_full_name_is_rejected() {
        let create = CreateAccountDto {
            full_name: "   ".to_string(),
            ..valid_create()
        };
        assert!(create.validate().unwrap_err().field_errors().contains_key("full_name"));

        let update = UpdateAccountDto {
            full_name: Some("\t".to_string()),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("full_name"));
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        assert!(UpdateAccountDto::default().validate().is_ok());
        let dto = UpdateAccountDto {
            username: Some("bad name".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_response_never_exposes_password_hash() {
        let now = Utc::now();
        let later = now + chrono::Duration::minutes(3);
        let account = Account {
            id: Uuid::now_v7(),
            username: "ana".to_string(),
            full_name: "Ana".to_string(),
            email: "ana@example.org".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: AccountRole::Worker,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: later,
            last_access_at: None,
        };
        let dto = AccountResponseDto::from(account);
        assert_eq!(dto.updated_at, later);

        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"worker\""));
        assert!(json.contains("\"updated_at\""));
    }
}
