use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "account_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    #[serde(alias = "trabajador")]
    Worker,
    #[serde(alias = "administrador")]
    Administrator,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRole::Worker => write!(f, "worker"),
            AccountRole::Administrator => write!(f, "administrator"),
        }
    }
}

impl FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worker" | "trabajador" => Ok(AccountRole::Worker),
            "administrator" | "administrador" | "admin" => Ok(AccountRole::Administrator),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// Account status matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "account_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[serde(alias = "activo")]
    Active,
    #[serde(alias = "inactivo")]
    Inactive,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "activo" => Ok(AccountStatus::Active),
            "inactive" | "inactivo" => Ok(AccountStatus::Inactive),
            other => Err(format!("Unknown account status '{}'", other)),
        }
    }
}

/// Database model for account
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_spanish_aliases() {
        assert_eq!("trabajador".parse::<AccountRole>(), Ok(AccountRole::Worker));
        assert_eq!(
            "Administrador".parse::<AccountRole>(),
            Ok(AccountRole::Administrator)
        );
        assert!("root".parse::<AccountRole>().is_err());

        let role: AccountRole = serde_json::from_str("\"administrador\"").unwrap();
        assert_eq!(role, AccountRole::Administrator);
        assert_eq!(
            serde_json::to_string(&AccountRole::Administrator).unwrap(),
            "\"administrator\""
        );
    }

    #[test]
    fn test_status_round_trips_through_display() {
        for status in [AccountStatus::Active, AccountStatus::Inactive] {
            assert_eq!(status.to_string().parse::<AccountStatus>(), Ok(status));
        }
        assert_eq!("inactivo".parse::<AccountStatus>(), Ok(AccountStatus::Inactive));
    }
}
