//! The donut-backed driver
//!
//! Wraps a [`Donut`] engine behind the [`Driver`] contract. All name
//! and ACL validation happens here, before any lock is taken or any
//! I/O path is entered. A single read/write lock serializes mutators
//! (CreateBucket, SetBucketMetadata, CreateObject) against readers;
//! within a held write lock the engine still fans shard writes out to
//! distinct disks in parallel.

use crate::driver::{BucketMetadata, Driver, ObjectMetadata};
use crate::resources::{BucketResources, ObjectResources};
use donut_common::checksum::expected_md5_to_hex;
use donut_common::config::DonutConfig;
use donut_common::{is_valid_prefix, BucketAcl, BucketName, Error, ObjectKey, Result};
use donut_engine::Donut;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(unix)]
use std::os::unix::fs::DirBuilderExt;

/// Disk count of the synthetic layout built under a single root path
const SYNTHETIC_DISK_COUNT: usize = 16;

/// A [`Driver`] over a donut engine
pub struct DonutDriver {
    donut: RwLock<Donut>,
}

/// Start a driver over the given disk root paths with defaults
///
/// One path creates a synthetic [`SYNTHETIC_DISK_COUNT`]-disk layout
/// beneath it; several paths contribute one disk each.
pub fn start(paths: &[PathBuf]) -> Result<DonutDriver> {
    start_with_config(paths, &DonutConfig::default())
}

/// Start a driver with an explicit configuration
pub fn start_with_config(paths: &[PathBuf], config: &DonutConfig) -> Result<DonutDriver> {
    if paths.is_empty() {
        return Err(Error::invalid_argument("no disk paths supplied"));
    }

    let disks = if paths.len() == 1 {
        synthetic_disk_paths(&paths[0])?
    } else {
        disk_paths_from_slice(paths)?
    };
    let node_disk_map = vec![(config.node_name.clone(), disks)];

    let donut = Donut::new("default", node_disk_map, config)?;
    info!(paths = paths.len(), "donut driver started");
    Ok(DonutDriver {
        donut: RwLock::new(donut),
    })
}

impl DonutDriver {
    /// Start a driver from the disk roots named in the configuration
    pub fn from_config(config: &DonutConfig) -> Result<Self> {
        start_with_config(&config.disks, config)
    }

    /// Tear the driver down
    ///
    /// Every write is already durable when its operation returns, so
    /// this only releases the engine.
    pub fn shutdown(self) -> Result<()> {
        info!("donut driver shut down");
        Ok(())
    }
}

/// Subdirectories `0..count` under one root, one per disk
fn synthetic_disk_paths(root: &Path) -> Result<Vec<PathBuf>> {
    (0..SYNTHETIC_DISK_COUNT)
        .map(|i| {
            let disk_path = root.join(i.to_string());
            make_disk_dir(&disk_path)?;
            Ok(disk_path)
        })
        .collect()
}

/// One disk per supplied path, each under an index-named subdirectory
fn disk_paths_from_slice(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let disk_path = path.join(i.to_string());
            make_disk_dir(&disk_path)?;
            Ok(disk_path)
        })
        .collect()
}

fn make_disk_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path)?;
    Ok(())
}

fn validate_bucket(bucket: &str) -> Result<BucketName> {
    BucketName::new(bucket).map_err(|source| Error::BucketNameInvalid {
        bucket: bucket.to_string(),
        source,
    })
}

fn validate_object(object: &str) -> Result<ObjectKey> {
    ObjectKey::new(object).map_err(|source| Error::ObjectNameInvalid {
        object: object.to_string(),
        source,
    })
}

fn parse_acl(acl: &str) -> Result<BucketAcl> {
    acl.parse().map_err(|_| Error::InvalidAcl {
        acl: acl.to_string(),
    })
}

impl Driver for DonutDriver {
    fn list_buckets(&self) -> Result<Vec<BucketMetadata>> {
        let donut = self.donut.read();
        let buckets = donut.list_buckets()?;
        Ok(buckets
            .into_iter()
            .map(|doc| BucketMetadata {
                name: doc.name,
                created: doc.created,
                acl: doc.acl,
            })
            .collect())
    }

    fn create_bucket(&self, bucket: &str, acl: &str) -> Result<()> {
        let acl = parse_acl(acl)?;
        let bucket = validate_bucket(bucket)?;
        let donut = self.donut.write();
        donut.make_bucket(&bucket, acl)
    }

    fn get_bucket_metadata(&self, bucket: &str) -> Result<BucketMetadata> {
        let bucket = validate_bucket(bucket)?;
        let donut = self.donut.read();
        let doc = donut.get_bucket_metadata(&bucket)?;
        Ok(BucketMetadata {
            name: doc.name,
            created: doc.created,
            acl: doc.acl,
        })
    }

    fn set_bucket_metadata(&self, bucket: &str, acl: &str) -> Result<()> {
        let acl = parse_acl(acl)?;
        let bucket = validate_bucket(bucket)?;
        let donut = self.donut.write();
        donut.set_bucket_metadata(&bucket, acl)
    }

    fn get_object(&self, sink: &mut dyn Write, bucket: &str, object: &str) -> Result<u64> {
        let bucket = validate_bucket(bucket)?;
        let object = validate_object(object)?;
        let donut = self.donut.read();
        donut.get_object(&bucket, &object, sink)
    }

    fn get_partial_object(
        &self,
        sink: &mut dyn Write,
        bucket: &str,
        object: &str,
        start: i64,
        length: i64,
    ) -> Result<u64> {
        let bucket = validate_bucket(bucket)?;
        let object = validate_object(object)?;
        if start < 0 {
            return Err(Error::InvalidRange { start, length });
        }
        let donut = self.donut.read();
        donut.get_partial_object(&bucket, &object, start, length, sink)
    }

    fn get_object_metadata(&self, bucket: &str, object: &str) -> Result<ObjectMetadata> {
        let bucket_name = validate_bucket(bucket)?;
        let object_key = validate_object(object)?;
        let donut = self.donut.read();
        let doc = donut.get_object_metadata(&bucket_name, &object_key)?;
        Ok(ObjectMetadata {
            bucket: doc.bucket,
            key: doc.key,
            content_type: doc.content_type,
            created: doc.created,
            md5: doc.md5,
            size: doc.size,
        })
    }

    fn list_objects(
        &self,
        bucket: &str,
        mut resources: BucketResources,
    ) -> Result<(Vec<ObjectMetadata>, BucketResources)> {
        let bucket_name = validate_bucket(bucket)?;
        if !is_valid_prefix(&resources.prefix) {
            return Err(Error::ObjectNameInvalid {
                object: resources.prefix.clone(),
                source: donut_common::ObjectKeyError::TooLong,
            });
        }

        let donut = self.donut.read();
        let listing = donut.list_objects(
            &bucket_name,
            &resources.prefix,
            &resources.marker,
            &resources.delimiter,
            resources.max_keys,
        )?;

        resources.common_prefixes = listing.common_prefixes;
        resources.is_truncated = listing.is_truncated;
        if resources.is_truncated && resources.is_delimiter_set() {
            resources.next_marker = listing.next_marker.unwrap_or_default();
        }

        let mut results = Vec::with_capacity(listing.objects.len());
        for key in listing.objects {
            let object_key = ObjectKey::new(key.as_str()).map_err(|e| {
                Error::internal(format!("stored key {key:?} fails validation: {e}"))
            })?;
            let doc = donut.get_object_metadata(&bucket_name, &object_key)?;
            results.push(ObjectMetadata {
                bucket: bucket.to_string(),
                key,
                content_type: doc.content_type,
                created: doc.created,
                md5: doc.md5,
                size: doc.size,
            });
        }
        Ok((results, resources))
    }

    fn create_object(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        expected_md5: &str,
        size: i64,
        reader: &mut dyn Read,
    ) -> Result<String> {
        let bucket = validate_bucket(bucket)?;
        let object = validate_object(object)?;

        let content_type = content_type.trim();
        let content_type = if content_type.is_empty() {
            "application/octet-stream"
        } else {
            content_type
        };
        let expected_md5_hex = expected_md5_to_hex(expected_md5)?;

        let donut = self.donut.write();
        donut.put_object(
            &bucket,
            &object,
            content_type,
            expected_md5_hex.as_deref(),
            size,
            reader,
            HashMap::new(),
        )
    }

    fn list_multipart_uploads(
        &self,
        _bucket: &str,
        _resources: ObjectResources,
    ) -> Result<ObjectResources> {
        Err(Error::not_implemented("ListMultipartUploads"))
    }

    fn new_multipart_upload(
        &self,
        _bucket: &str,
        _object: &str,
        _content_type: &str,
    ) -> Result<String> {
        Err(Error::not_implemented("NewMultipartUpload"))
    }

    fn create_object_part(
        &self,
        _bucket: &str,
        _object: &str,
        _upload_id: &str,
        _part_id: i32,
        _content_type: &str,
        _expected_md5: &str,
        _size: i64,
        _reader: &mut dyn Read,
    ) -> Result<String> {
        Err(Error::not_implemented("CreateObjectPart"))
    }

    fn complete_multipart_upload(
        &self,
        _bucket: &str,
        _object: &str,
        _upload_id: &str,
        _parts: BTreeMap<i32, String>,
    ) -> Result<String> {
        Err(Error::not_implemented("CompleteMultipartUpload"))
    }

    fn list_object_parts(
        &self,
        _bucket: &str,
        _object: &str,
        _resources: ObjectResources,
    ) -> Result<ObjectResources> {
        Err(Error::not_implemented("ListObjectParts"))
    }

    fn abort_multipart_upload(&self, _bucket: &str, _object: &str, _upload_id: &str) -> Result<()> {
        Err(Error::not_implemented("AbortMultipartUpload"))
    }
}
