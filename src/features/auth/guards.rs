//! Role guards for handlers.
//!
//! Guards run as `FromRequestParts` extractors, so they reject the request
//! before any body extractor parses the payload.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, Action};
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard for incident triage endpoints (status changes and comments).
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireTriage(user): RequireTriage) { ... }
/// ```
pub struct RequireTriage(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireTriage
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;
        authorize(user, Action::ChangeIncidentStatus)?;
        Ok(RequireTriage(user.clone()))
    }
}

/// Guard for account administration endpoints.
pub struct RequireAccountAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAccountAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;
        authorize(user, Action::ManageAccounts)?;
        Ok(RequireAccountAdmin(user.clone()))
    }
}

/// Guard for the administrator report.
pub struct RequireReportAccess(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireReportAccess
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;
        authorize(user, Action::ViewReport)?;
        Ok(RequireReportAccess(user.clone()))
    }
}
