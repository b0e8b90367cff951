use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::accounts::{
    dtos as accounts_dtos, handlers as accounts_handlers, models as accounts_models,
};
use crate::features::auth;
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::incidents::{
    dtos as incidents_dtos, filters as incidents_filters, handlers as incidents_handlers,
    models as incidents_models,
};
use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::get_me,
        // Incidents
        incidents_handlers::list_incidents,
        incidents_handlers::create_incident,
        incidents_handlers::get_incident,
        incidents_handlers::update_incident,
        incidents_handlers::delete_incident,
        incidents_handlers::change_incident_status,
        incidents_handlers::add_incident_comment,
        incidents_handlers::attach_incident_image,
        // Dashboard
        dashboard_handlers::get_statistics,
        // Reports
        reports_handlers::generate_report,
        // Accounts
        accounts_handlers::list_accounts,
        accounts_handlers::create_account,
        accounts_handlers::get_account,
        accounts_handlers::update_account,
        accounts_handlers::delete_account,
        accounts_handlers::set_account_status,
        accounts_handlers::reset_account_password,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::LogoutResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::LogoutResponseDto>,
            // Accounts
            accounts_models::AccountRole,
            accounts_models::AccountStatus,
            accounts_dtos::CreateAccountDto,
            accounts_dtos::UpdateAccountDto,
            accounts_dtos::SetAccountStatusDto,
            accounts_dtos::AccountResponseDto,
            accounts_dtos::PasswordResetResponseDto,
            ApiResponse<accounts_dtos::AccountResponseDto>,
            ApiResponse<Vec<accounts_dtos::AccountResponseDto>>,
            ApiResponse<accounts_dtos::PasswordResetResponseDto>,
            // Incidents
            incidents_models::IncidentCategory,
            incidents_models::IncidentPriority,
            incidents_models::IncidentStatus,
            incidents_filters::IncidentFilter,
            incidents_dtos::CreateIncidentDto,
            incidents_dtos::UpdateIncidentDto,
            incidents_dtos::ChangeStatusDto,
            incidents_dtos::AddCommentDto,
            incidents_dtos::UploadImageDto,
            incidents_dtos::IncidentResponseDto,
            incidents_dtos::IncidentDetailResponseDto,
            incidents_dtos::StatusChangeResponseDto,
            incidents_dtos::AdminCommentResponseDto,
            ApiResponse<Vec<incidents_dtos::IncidentResponseDto>>,
            ApiResponse<incidents_dtos::IncidentDetailResponseDto>,
            ApiResponse<incidents_dtos::AdminCommentResponseDto>,
            // Dashboard
            dashboard_dtos::IncidentStats,
            ApiResponse<dashboard_dtos::IncidentStats>,
            // Reports
            reports_dtos::ReportResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout and current account"),
        (name = "incidents", description = "Incident reporting, triage and audit trail"),
        (name = "dashboard", description = "Incident statistics scoped to the caller"),
        (name = "reports", description = "Filtered incident reports (administrators only)"),
        (name = "accounts", description = "Account administration (administrators only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Incident Desk API",
        version = "0.1.0",
        description = "API documentation for the Incident Desk service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/auth/login",
            "/api/auth/logout",
            "/api/auth/me",
            "/api/incidencias",
            "/api/incidencias/{id}",
            "/api/incidencias/{id}/cambiar-estado",
            "/api/incidencias/{id}/agregar-comentario",
            "/api/incidencias/{id}/imagen",
            "/api/estadisticas",
            "/api/reportes",
            "/api/usuarios",
            "/api/usuarios/{id}",
            "/api/usuarios/{id}/cambiar-estado",
            "/api/usuarios/{id}/restablecer-password",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
