use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::Action;
use crate::features::incidents::dtos::IncidentDetailResponseDto;
use crate::features::incidents::services::IncidentService;
use crate::modules::storage::MinIOClient;
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_SIZE};

/// Storage details for an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormat {
    pub extension: &'static str,
    pub content_type: &'static str,
}

fn format_for(content_type: &str) -> Option<ImageFormat> {
    let (extension, content_type) = match content_type {
        "image/jpeg" => ("jpg", "image/jpeg"),
        "image/png" => ("png", "image/png"),
        "image/webp" => ("webp", "image/webp"),
        "image/gif" => ("gif", "image/gif"),
        _ => return None,
    };
    Some(ImageFormat {
        extension,
        content_type,
    })
}

/// Check type and size of an upload. The returned content type is lowercase
/// without surrounding whitespace.
pub fn validate_image(content_type: &str, size: usize) -> Result<ImageFormat> {
    if size == 0 {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }
    if size > MAX_IMAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "Image too large. Maximum size is {} MB",
            MAX_IMAGE_SIZE / 1024 / 1024
        )));
    }
    let normalized = content_type.trim().to_ascii_lowercase();
    format_for(&normalized).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Image type '{}' is not allowed. Allowed types: {}",
            content_type,
            ALLOWED_IMAGE_TYPES.join(", ")
        ))
    })
}

/// Service for the optional image attached to an incident
pub struct ImageService {
    incidents: Arc<IncidentService>,
    storage: Arc<MinIOClient>,
}

impl ImageService {
    pub fn new(incidents: Arc<IncidentService>, storage: Arc<MinIOClient>) -> Self {
        Self { incidents, storage }
    }

    /// Store `data` as the incident's image, replacing any previous one
    pub async fn attach(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<IncidentDetailResponseDto> {
        self.incidents
            .load_authorized(actor, id, |creator_id| Action::AttachImage { creator_id })
            .await?;

        let format = validate_image(content_type, data.len())?;
        let key = self.storage.image_key(id, format.extension);
        self.storage
            .upload(&key, &data, format.content_type)
            .await?;

        let previous = match self.incidents.set_image_key(id, &key).await {
            Ok(previous) => previous,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&key).await {
                    tracing::warn!("Orphaned image '{}': {}", key, cleanup);
                }
                return Err(e);
            }
        };

        if let Some(old_key) = previous.filter(|old| old != &key) {
            if let Err(e) = self.storage.delete(&old_key).await {
                tracing::warn!("Replaced image '{}' could not be deleted: {}", old_key, e);
            }
        }

        tracing::info!(
            "Image attached to incident {} by '{}' ({} bytes)",
            id,
            actor.username,
            data.len()
        );

        self.incidents.get(actor, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_types_map_to_extensions() {
        assert_eq!(validate_image("image/jpeg", 10).unwrap().extension, "jpg");
        assert_eq!(validate_image("image/png", 10).unwrap().extension, "png");
        assert_eq!(validate_image("image/webp", 10).unwrap().extension, "webp");
        assert_eq!(validate_image("image/gif", 10).unwrap().extension, "gif");
    }

    #[test]
    fn test_content_type_is_normalized_for_storage() {
        assert_eq!(
            validate_image(" IMAGE/PNG ", 10).unwrap(),
            ImageFormat {
                extension: "png",
                content_type: "image/png",
            }
        );
        assert_eq!(
            validate_image("Image/Jpeg", 10).unwrap().content_type,
            "image/jpeg"
        );
    }

    #[test]
    fn test_rejects_other_types() {
        for content_type in ["application/pdf", "image/svg+xml", "text/plain", ""] {
            assert!(matches!(
                validate_image(content_type, 10),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_size_limits() {
        assert!(validate_image("image/png", MAX_IMAGE_SIZE).is_ok());
        assert!(validate_image("image/png", MAX_IMAGE_SIZE + 1).is_err());
        assert!(validate_image("image/png", 0).is_err());
    }
}
