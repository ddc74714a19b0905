//! Core type definitions for donut
//!
//! Validated bucket name and object key newtypes plus the bucket ACL
//! enumeration. Construction is the validity predicate: a value of one
//! of these types has already passed validation, so the storage layers
//! never re-check names.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum object key length in bytes (UTF-8)
pub const MAX_OBJECT_KEY_LEN: usize = 1024;

/// A validated bucket name
///
/// Bucket names are 3-63 characters of lowercase letters, digits and
/// hyphens, beginning and ending with a letter or digit. Dots are
/// rejected outright so bucket names never collide with
/// virtual-host-style TLS wildcards.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct BucketName(String);

impl BucketName {
    /// Create a new bucket name, validating S3 naming rules
    pub fn new(name: impl Into<String>) -> Result<Self, BucketNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the bucket name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), BucketNameError> {
        if name.len() < 3 {
            return Err(BucketNameError::TooShort);
        }
        if name.len() > 63 {
            return Err(BucketNameError::TooLong);
        }

        let first = name.chars().next().unwrap();
        if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
            return Err(BucketNameError::InvalidStartChar);
        }
        let last = name.chars().last().unwrap();
        if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
            return Err(BucketNameError::InvalidEndChar);
        }

        for c in name.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(BucketNameError::InvalidChar(c));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketName({:?})", self.0)
    }
}

/// Errors that can occur when creating a bucket name
#[derive(Debug, Clone, thiserror::Error)]
pub enum BucketNameError {
    #[error("bucket name must be at least 3 characters")]
    TooShort,
    #[error("bucket name must be at most 63 characters")]
    TooLong,
    #[error("bucket name must start with a lowercase letter or digit")]
    InvalidStartChar,
    #[error("bucket name must end with a lowercase letter or digit")]
    InvalidEndChar,
    #[error("bucket name contains invalid character: {0:?}")]
    InvalidChar(char),
}

/// A validated object key (path within a bucket)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new object key
    pub fn new(key: impl Into<String>) -> Result<Self, ObjectKeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ObjectKeyError::Empty);
        }
        if key.len() > MAX_OBJECT_KEY_LEN {
            return Err(ObjectKeyError::TooLong);
        }
        Ok(Self(key))
    }

    /// Get the object key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:?})", self.0)
    }
}

/// Errors that can occur when creating an object key
#[derive(Debug, Clone, thiserror::Error)]
pub enum ObjectKeyError {
    #[error("object key cannot be empty or whitespace")]
    Empty,
    #[error("object key cannot exceed {MAX_OBJECT_KEY_LEN} bytes")]
    TooLong,
}

/// Validate a listing prefix. Unlike a full object key, a prefix may be
/// empty; only the length cap applies.
#[must_use]
pub fn is_valid_prefix(prefix: &str) -> bool {
    prefix.len() <= MAX_OBJECT_KEY_LEN
}

/// Canned bucket access control lists
///
/// Exactly the four S3 canned ACLs the engine understands. The empty
/// string parses to `Private`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketAcl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
}

impl BucketAcl {
    /// The canonical string form ("private", "public-read", ...)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl fmt::Display for BucketAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown ACL string
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown bucket ACL: {0:?}")]
pub struct BucketAclError(pub String);

impl FromStr for BucketAcl {
    type Err = BucketAclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            other => Err(BucketAclError(other.to_string())),
        }
    }
}
