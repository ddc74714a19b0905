//! Error types for donut
//!
//! One public taxonomy shared by every layer. Lower layers attach the
//! structured context (bucket, key, range) at the boundary where the
//! error is raised; the driver surfaces these kinds unchanged.

use crate::types::{BucketNameError, ObjectKeyError};
use thiserror::Error;

/// Common result type for donut operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for donut
#[derive(Debug, Error)]
pub enum Error {
    // Validation errors
    #[error("invalid bucket name {bucket:?}: {source}")]
    BucketNameInvalid {
        bucket: String,
        source: BucketNameError,
    },

    #[error("invalid object name {object:?}: {source}")]
    ObjectNameInvalid {
        object: String,
        source: ObjectKeyError,
    },

    #[error("invalid bucket ACL: {acl:?}")]
    InvalidAcl { acl: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid range: start {start}, length {length}")]
    InvalidRange { start: i64, length: i64 },

    #[error("content md5 mismatch: expected {expected}, calculated {calculated}")]
    BadDigest { expected: String, calculated: String },

    // Not found
    #[error("bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("object not found: {bucket}/{object}")]
    ObjectNotFound { bucket: String, object: String },

    // Conflict
    #[error("bucket already exists: {bucket}")]
    BucketExists { bucket: String },

    // Integrity
    #[error("object corrupted beyond repair: {bucket}/{object}")]
    ObjectCorrupted { bucket: String, object: String },

    #[error("insufficient shards for reconstruction: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    // Environment
    #[error("unsupported filesystem type: {fs_type}")]
    UnsupportedFilesystem { fs_type: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("disk I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Serialization(String),

    // Facade
    #[error("internal error: {0}")]
    Internal(String),

    #[error("API not implemented: {api}")]
    ApiNotImplemented { api: String },
}

impl Error {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not-implemented error for a named API
    pub fn not_implemented(api: impl Into<String>) -> Self {
        Self::ApiNotImplemented { api: api.into() }
    }

    /// Check if this is a not found error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BucketNotFound { .. } | Self::ObjectNotFound { .. }
        )
    }

    /// Check if this is a validation error (caller input was rejected
    /// before any I/O took place)
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BucketNameInvalid { .. }
                | Self::ObjectNameInvalid { .. }
                | Self::InvalidAcl { .. }
                | Self::InvalidArgument(_)
                | Self::InvalidRange { .. }
                | Self::BadDigest { .. }
        )
    }
}
