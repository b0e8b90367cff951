use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{authorize, can, Action, IncidentScope};
use crate::features::incidents::dtos::{
    AddCommentDto, AdminCommentResponseDto, ChangeStatusDto, CreateIncidentDto,
    IncidentDetailResponseDto, IncidentResponseDto, ListIncidentsQuery, UpdateIncidentDto,
};
use crate::features::incidents::filters::IncidentFilter;
use crate::features::incidents::lifecycle::{self, Transition};
use crate::features::incidents::models::{
    AdminComment, Incident, IncidentPriority, IncidentStatus, StatusChange,
};
use crate::modules::storage::MinIOClient;
use crate::shared::types::PaginationQuery;

const INCIDENT_SELECT: &str = "SELECT i.id, i.category, i.description, i.priority, i.location, \
     i.status, i.creator_id, a.full_name AS creator_name, i.image_key, i.created_at, \
     i.updated_at, i.resolved_at \
     FROM incidents i JOIN accounts a ON a.id = i.creator_id";

/// Service for incident records and their lifecycle
pub struct IncidentService {
    pool: PgPool,
    storage: Arc<MinIOClient>,
    clock: Arc<dyn Clock>,
}

impl IncidentService {
    pub fn new(pool: PgPool, storage: Arc<MinIOClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            storage,
            clock,
        }
    }

    fn to_response(&self, incident: Incident) -> IncidentResponseDto {
        IncidentResponseDto::from_incident(incident, |key| self.storage.public_url(key))
    }

    async fn find(&self, id: Uuid) -> Result<Incident> {
        let sql = format!("{} WHERE i.id = $1", INCIDENT_SELECT);
        sqlx::query_as::<_, Incident>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch incident {}: {:?}", id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    /// Load an incident and check `action` against its creator.
    ///
    /// Missing incidents are reported before permission problems.
    pub async fn load_authorized(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        action: fn(Uuid) -> Action,
    ) -> Result<Incident> {
        let incident = self.find(id).await?;
        authorize(actor, action(incident.creator_id))?;
        Ok(incident)
    }

    /// File a new incident; its first audit entry is written in the same transaction
    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        dto: CreateIncidentDto,
    ) -> Result<IncidentDetailResponseDto> {
        authorize(actor, Action::CreateIncident)?;

        let id = Uuid::now_v7();
        let created = lifecycle::creation(self.clock.now());

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO incidents (id, category, description, priority, location, status, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(id)
        .bind(dto.category)
        .bind(dto.description.trim())
        .bind(dto.priority.unwrap_or(IncidentPriority::Medium))
        .bind(dto.location.as_deref().map(str::trim).unwrap_or_default())
        .bind(created.next)
        .bind(actor.account_id)
        .bind(created.at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert incident: {:?}", e);
            AppError::Database(e)
        })?;

        insert_status_change(&mut tx, id, actor.account_id, &created).await?;
        tx.commit().await?;

        tracing::info!(
            "Incident {} created by '{}' ({}, {})",
            id,
            actor.username,
            dto.category,
            dto.priority.unwrap_or(IncidentPriority::Medium)
        );

        self.get(actor, id).await
    }

    /// List incidents visible to the caller, newest first
    pub async fn list(
        &self,
        actor: &AuthenticatedUser,
        query: &ListIncidentsQuery,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<IncidentResponseDto>, i64)> {
        authorize(actor, Action::ListIncidents)?;
        let filter = IncidentFilter::scoped(IncidentScope::for_actor(actor)).with_query(query);

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM incidents i");
        filter.push_conditions(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count incidents: {:?}", e);
                AppError::Database(e)
            })?;

        let mut qb = QueryBuilder::<Postgres>::new(INCIDENT_SELECT);
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY i.created_at DESC, i.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let incidents = qb
            .build_query_as::<Incident>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list incidents: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((
            incidents.into_iter().map(|i| self.to_response(i)).collect(),
            total,
        ))
    }

    /// Every incident matching `filter`, newest first
    pub async fn search(&self, filter: &IncidentFilter) -> Result<Vec<IncidentResponseDto>> {
        let mut qb = QueryBuilder::<Postgres>::new(INCIDENT_SELECT);
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY i.created_at DESC, i.id DESC");

        let incidents = qb
            .build_query_as::<Incident>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to search incidents: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(incidents.into_iter().map(|i| self.to_response(i)).collect())
    }

    /// One incident with its audit trail and the comments the caller may see
    pub async fn get(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> Result<IncidentDetailResponseDto> {
        let incident = self
            .load_authorized(actor, id, |creator_id| Action::ViewIncident { creator_id })
            .await?;

        let history = sqlx::query_as::<_, StatusChange>(
            r#"
            SELECT c.id, c.previous_status, c.new_status, c.comment, c.actor_id,
                   a.full_name AS actor_name, c.created_at
            FROM incident_status_changes c
            JOIN accounts a ON a.id = c.actor_id
            WHERE c.incident_id = $1
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load history of incident {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        let include_hidden = can(actor, Action::ViewHiddenComments);
        let comments = sqlx::query_as::<_, AdminComment>(
            r#"
            SELECT m.id, m.message, m.actor_id, a.full_name AS actor_name,
                   m.is_visible, m.created_at
            FROM incident_admin_comments m
            JOIN accounts a ON a.id = m.actor_id
            WHERE m.incident_id = $1 AND (m.is_visible OR $2)
            ORDER BY m.created_at, m.id
            "#,
        )
        .bind(id)
        .bind(include_hidden)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load comments of incident {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        Ok(IncidentDetailResponseDto {
            incident: self.to_response(incident),
            history: history.into_iter().map(Into::into).collect(),
            comments: comments.into_iter().map(Into::into).collect(),
        })
    }

    /// Edit details; status is left untouched
    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateIncidentDto,
    ) -> Result<IncidentDetailResponseDto> {
        let current = self
            .load_authorized(actor, id, |creator_id| Action::EditIncident { creator_id })
            .await?;

        sqlx::query(
            r#"
            UPDATE incidents
            SET category = $2, description = $3, priority = $4, location = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(dto.category.unwrap_or(current.category))
        .bind(dto.description.as_deref().map(str::trim).unwrap_or(&current.description))
        .bind(dto.priority.unwrap_or(current.priority))
        .bind(dto.location.as_deref().map(str::trim).unwrap_or(&current.location))
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update incident {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        self.get(actor, id).await
    }

    /// Delete an incident with its history, comments and image
    pub async fn delete(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let incident = self
            .load_authorized(actor, id, |creator_id| Action::DeleteIncident { creator_id })
            .await?;

        sqlx::query("DELETE FROM incidents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete incident {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        if let Some(key) = incident.image_key {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!("Incident {} deleted but image '{}' remains: {}", id, key, e);
            }
        }

        tracing::info!("Incident {} deleted by '{}'", id, actor.username);
        Ok(())
    }

    /// Move an incident to a new status and append the audit entry.
    ///
    /// The incident row is locked so concurrent changes record the right
    /// previous status.
    pub async fn change_status(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: ChangeStatusDto,
    ) -> Result<IncidentDetailResponseDto> {
        authorize(actor, Action::ChangeIncidentStatus)?;

        let mut tx = self.pool.begin().await?;

        let current: IncidentStatus =
            sqlx::query_scalar("SELECT status FROM incidents WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to lock incident {}: {:?}", id, e);
                    AppError::Database(e)
                })?
                .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

        let transition = lifecycle::plan(
            current,
            dto.status,
            dto.comment.as_deref(),
            self.clock.now(),
        );

        sqlx::query(
            r#"
            UPDATE incidents
            SET status = $2, resolved_at = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(transition.next)
        .bind(transition.resolved_at)
        .bind(transition.at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update status of incident {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        insert_status_change(&mut tx, id, actor.account_id, &transition).await?;
        tx.commit().await?;

        tracing::info!(
            "Incident {} status changed {} -> {} by '{}'",
            id,
            current,
            transition.next,
            actor.username
        );

        self.get(actor, id).await
    }

    /// Append an administrator comment
    pub async fn add_comment(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: AddCommentDto,
    ) -> Result<AdminCommentResponseDto> {
        authorize(actor, Action::CommentIncident)?;
        self.find(id).await?;

        let comment = AdminComment {
            id: Uuid::now_v7(),
            message: dto.message.trim().to_string(),
            actor_id: actor.account_id,
            actor_name: actor.full_name.clone(),
            is_visible: dto.is_visible,
            created_at: self.clock.now(),
        };

        sqlx::query(
            r#"
            INSERT INTO incident_admin_comments (id, incident_id, message, actor_id, is_visible, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(comment.id)
        .bind(id)
        .bind(&comment.message)
        .bind(comment.actor_id)
        .bind(comment.is_visible)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add comment to incident {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        tracing::info!("Comment added to incident {} by '{}'", id, actor.username);
        Ok(comment.into())
    }

    /// Point the incident at a new image; returns the key it replaces
    pub async fn set_image_key(&self, id: Uuid, key: &str) -> Result<Option<String>> {
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r#"
            WITH prev AS (
                SELECT image_key FROM incidents WHERE id = $1 FOR UPDATE
            )
            UPDATE incidents
            SET image_key = $2, updated_at = $3
            WHERE id = $1
            RETURNING (SELECT image_key FROM prev)
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set image of incident {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        previous.ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }
}

async fn insert_status_change(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    incident_id: Uuid,
    actor_id: Uuid,
    transition: &Transition,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO incident_status_changes (id, incident_id, previous_status, new_status, comment, actor_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(incident_id)
    .bind(transition.previous)
    .bind(transition.next)
    .bind(&transition.comment)
    .bind(actor_id)
    .bind(transition.at)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record status change for {}: {:?}", incident_id, e);
        AppError::Database(e)
    })?;

    Ok(())
}
