//! Role-based authorization.
//!
//! Every operation boundary asks [`authorize`] whether the caller may perform
//! an [`Action`]. Workers are limited to incidents they created; administrators
//! may do everything. A refusal is always a permission error, never a
//! not-found, so callers must look the entity up (404) before authorizing.

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::accounts::models::AccountRole;
use crate::features::auth::model::AuthenticatedUser;

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateIncident,
    ListIncidents,
    ViewIncident { creator_id: Uuid },
    EditIncident { creator_id: Uuid },
    DeleteIncident { creator_id: Uuid },
    AttachImage { creator_id: Uuid },
    ChangeIncidentStatus,
    CommentIncident,
    ViewHiddenComments,
    ViewStatistics,
    ViewReport,
    ManageAccounts,
}

impl Action {
    fn denial_message(&self) -> &'static str {
        match self {
            Action::ViewIncident { .. } => "You do not have permission to view this incident",
            Action::EditIncident { .. } => "You do not have permission to edit this incident",
            Action::DeleteIncident { .. } => "You do not have permission to delete this incident",
            Action::AttachImage { .. } => {
                "You do not have permission to attach images to this incident"
            }
            Action::ChangeIncidentStatus | Action::CommentIncident => {
                "You do not have permission to perform this action"
            }
            Action::ViewHiddenComments => "Hidden comments are restricted to administrators",
            Action::ViewReport => "You do not have permission to generate reports",
            Action::ManageAccounts => "You do not have permission to manage accounts",
            Action::CreateIncident | Action::ListIncidents | Action::ViewStatistics => {
                "You do not have permission to perform this action"
            }
        }
    }
}

/// Which incidents a caller can see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentScope {
    All,
    OwnedBy(Uuid),
}

impl IncidentScope {
    pub fn for_actor(actor: &AuthenticatedUser) -> Self {
        if actor.is_administrator() {
            IncidentScope::All
        } else {
            IncidentScope::OwnedBy(actor.account_id)
        }
    }

    /// Owner restriction to apply to queries, if any
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            IncidentScope::All => None,
            IncidentScope::OwnedBy(id) => Some(*id),
        }
    }
}

fn is_allowed(actor: &AuthenticatedUser, action: Action) -> bool {
    match (actor.role, action) {
        (AccountRole::Administrator, _) => true,
        (
            AccountRole::Worker,
            Action::CreateIncident | Action::ListIncidents | Action::ViewStatistics,
        ) => true,
        (
            AccountRole::Worker,
            Action::ViewIncident { creator_id }
            | Action::EditIncident { creator_id }
            | Action::DeleteIncident { creator_id }
            | Action::AttachImage { creator_id },
        ) => creator_id == actor.account_id,
        (
            AccountRole::Worker,
            Action::ChangeIncidentStatus
            | Action::CommentIncident
            | Action::ViewHiddenComments
            | Action::ViewReport
            | Action::ManageAccounts,
        ) => false,
    }
}

/// Check that `actor` may perform `action`
pub fn authorize(actor: &AuthenticatedUser, action: Action) -> Result<()> {
    if is_allowed(actor, action) {
        Ok(())
    } else {
        tracing::debug!(
            "Denied {:?} for account {} ({})",
            action,
            actor.account_id,
            actor.role
        );
        Err(AppError::Forbidden(action.denial_message().to_string()))
    }
}

/// Non-failing variant for branching on visibility
pub fn can(actor: &AuthenticatedUser, action: Action) -> bool {
    is_allowed(actor, action)
}
