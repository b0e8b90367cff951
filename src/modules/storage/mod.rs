//! Object storage for incident images
//!
//! MinIO/S3-compatible client used for uploads, deletes and public URLs.

mod minio_client;

pub use minio_client::MinIOClient;
