//! The driver operation table

use crate::resources::{BucketResources, ObjectResources};
use chrono::{DateTime, Utc};
use donut_common::{BucketAcl, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Bucket metadata as surfaced to the HTTP layer
#[derive(Clone, Debug)]
pub struct BucketMetadata {
    /// Bucket name
    pub name: String,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Canned access control list
    pub acl: BucketAcl,
}

/// Object metadata as surfaced to the HTTP layer
#[derive(Clone, Debug)]
pub struct ObjectMetadata {
    /// Owning bucket
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Content type
    pub content_type: String,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// MD5 of the payload, lowercase hex
    pub md5: String,
    /// Payload size in bytes
    pub size: u64,
}

/// Operations a storage driver provides to the HTTP/S3 surface
///
/// Streaming is push-based: reads write into the caller's sink, writes
/// pull from the caller's reader, so a slow peer backpressures the
/// pipeline naturally.
pub trait Driver: Send + Sync {
    /// List all buckets, ascending by name
    fn list_buckets(&self) -> Result<Vec<BucketMetadata>>;

    /// Create a bucket with a canned ACL (blank means private)
    fn create_bucket(&self, bucket: &str, acl: &str) -> Result<()>;

    /// Fetch bucket metadata
    fn get_bucket_metadata(&self, bucket: &str) -> Result<BucketMetadata>;

    /// Replace the bucket ACL
    fn set_bucket_metadata(&self, bucket: &str, acl: &str) -> Result<()>;

    /// Stream a whole object into `sink`; returns bytes written
    fn get_object(&self, sink: &mut dyn Write, bucket: &str, object: &str) -> Result<u64>;

    /// Stream `length` bytes starting at `start` into `sink`
    fn get_partial_object(
        &self,
        sink: &mut dyn Write,
        bucket: &str,
        object: &str,
        start: i64,
        length: i64,
    ) -> Result<u64>;

    /// Fetch object metadata
    fn get_object_metadata(&self, bucket: &str, object: &str) -> Result<ObjectMetadata>;

    /// List objects with prefix/marker/delimiter semantics
    ///
    /// Returns the matching objects plus the caller's resources record
    /// with `common_prefixes`, `is_truncated` and `next_marker` filled
    /// in.
    fn list_objects(
        &self,
        bucket: &str,
        resources: BucketResources,
    ) -> Result<(Vec<ObjectMetadata>, BucketResources)>;

    /// Store an object from a byte stream; returns the calculated MD5
    /// as lowercase hex
    ///
    /// `expected_md5` is the base64 `Content-MD5` form; blank disables
    /// the check.
    #[allow(clippy::too_many_arguments)]
    fn create_object(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        expected_md5: &str,
        size: i64,
        reader: &mut dyn Read,
    ) -> Result<String>;

    // Multipart upload family. The surface exists so an HTTP layer can
    // route the requests; the engine does not implement them.

    /// List in-progress multipart uploads (not implemented)
    fn list_multipart_uploads(
        &self,
        bucket: &str,
        resources: ObjectResources,
    ) -> Result<ObjectResources>;

    /// Begin a multipart upload (not implemented)
    fn new_multipart_upload(&self, bucket: &str, object: &str, content_type: &str)
        -> Result<String>;

    /// Upload one part (not implemented)
    #[allow(clippy::too_many_arguments)]
    fn create_object_part(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
        part_id: i32,
        content_type: &str,
        expected_md5: &str,
        size: i64,
        reader: &mut dyn Read,
    ) -> Result<String>;

    /// Assemble uploaded parts into an object (not implemented)
    fn complete_multipart_upload(
        &self,
        bucket: &str,
        object: &str,
        upload_id: &str,
        parts: BTreeMap<i32, String>,
    ) -> Result<String>;

    /// List the parts of an upload (not implemented)
    fn list_object_parts(
        &self,
        bucket: &str,
        object: &str,
        resources: ObjectResources,
    ) -> Result<ObjectResources>;

    /// Abort an upload and drop its parts (not implemented)
    fn abort_multipart_upload(&self, bucket: &str, object: &str, upload_id: &str) -> Result<()>;
}
