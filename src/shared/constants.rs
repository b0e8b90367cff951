/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Minimum password length accepted at account creation
pub const MIN_PASSWORD_LENGTH: u64 = 6;

/// Maximum length of an administrator comment
pub const MAX_COMMENT_LENGTH: u64 = 1000;

/// Maximum accepted incident image size (5 MiB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Image MIME types accepted for incident attachments
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Query filter values meaning "do not filter"
pub const FILTER_WILDCARDS: &[&str] = &["todos", "todas", "all", "any"];
