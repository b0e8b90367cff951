//! MinIO/S3-compatible storage client
//!
//! Stores incident images under a configurable key prefix and builds the
//! public URLs clients use to display them.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    public_endpoint: String,
    prefix: String,
}

impl MinIOClient {
    /// Build the client without touching the network
    pub fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs (http://endpoint/bucket) for MinIO
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            prefix: config.prefix.trim_matches('/').to_string(),
        })
    }

    /// Create the bucket if it is missing.
    ///
    /// Failures are logged and tolerated; uploads will surface a real error.
    pub async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    /// Object key for a new image of `incident_id`
    pub fn image_key(&self, incident_id: Uuid, extension: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            self.prefix,
            incident_id,
            Uuid::now_v7(),
            extension
        )
    }

    pub async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError> {
        self.bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete file '{}': {}", key, e)))?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    /// Direct URL of an object through the public endpoint
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::test_minio_config;

    #[test]
    fn test_image_key_layout() {
        let client = MinIOClient::new(test_minio_config()).unwrap();
        let incident_id = Uuid::now_v7();
        let key = client.image_key(incident_id, "png");

        let prefix = format!("incidents/{}/", incident_id);
        assert!(key.starts_with(&prefix), "{}", key);
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_public_url_joins_endpoint_bucket_and_key() {
        let client = MinIOClient::new(test_minio_config()).unwrap();
        assert_eq!(
            client.public_url("incidents/a/b.jpg"),
            "https://files.example.org/incident-desk/incidents/a/b.jpg"
        );
    }
}
