//! Replicated metadata documents
//!
//! Bucket and object metadata are small JSON documents written
//! identically to every disk. Reads take the first replica that parses;
//! writes must land on at least `k` disks or the operation fails, so a
//! readable replica always exists wherever enough shards survive.

use crate::layout;
use chrono::{DateTime, Utc};
use donut_common::{BucketAcl, BucketName, Error, ObjectKey, Result};
use donut_storage::Disk;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use tracing::warn;

/// Document format version
pub const FORMAT_VERSION: &str = "1.0";

/// Bucket metadata, replicated on every disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BucketDocument {
    /// Document format version
    pub version: String,
    /// Bucket name
    pub name: String,
    /// Canned access control list
    pub acl: BucketAcl,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Data shard count (k), fixed at bucket creation
    pub data_shards: usize,
    /// Parity shard count (m), fixed at bucket creation
    pub parity_shards: usize,
    /// Payload block size in bytes, fixed at bucket creation
    pub block_size: usize,
}

/// Object metadata, replicated on every disk
///
/// Writing this document is the commit point of an object write; shard
/// files without a metadata document are orphans.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectDocument {
    /// Document format version
    pub version: String,
    /// Owning bucket
    pub bucket: String,
    /// Object key (unescaped)
    pub key: String,
    /// Payload size in bytes
    pub size: u64,
    /// MD5 of the full payload, lowercase hex
    pub md5: String,
    /// Content type
    pub content_type: String,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Block size the payload was cut with
    pub block_size: usize,
    /// Number of payload blocks
    pub block_count: u64,
    /// Length of the final block before padding
    pub last_block_len: usize,
    /// Data shard count (k)
    pub data_shards: usize,
    /// Parity shard count (m)
    pub parity_shards: usize,
    /// crc32c per shard, indexed `[block][shard]`
    pub shard_checksums: Vec<Vec<u32>>,
    /// Arbitrary string-keyed user metadata
    pub metadata: HashMap<String, String>,
}

/// Write a document to every disk; at least `required` replicas must
/// succeed.
pub(crate) fn write_replicated<T: Serialize>(
    disks: &[&Disk],
    rel: &Path,
    document: &T,
    required: usize,
) -> Result<()> {
    let bytes =
        serde_json::to_vec(document).map_err(|e| Error::Serialization(e.to_string()))?;

    let mut written = 0usize;
    for disk in disks {
        match write_one(disk, rel, &bytes) {
            Ok(()) => written += 1,
            Err(e) => {
                warn!(disk = %disk.path().display(), path = %rel.display(), error = %e,
                      "metadata replica write failed");
            }
        }
    }

    if written < required {
        return Err(Error::Io(std::io::Error::other(format!(
            "metadata write quorum not met: {written} of {required} replicas for {}",
            rel.display()
        ))));
    }
    Ok(())
}

fn write_one(disk: &Disk, rel: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = disk.create_file(rel)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Read a document from the first disk holding a parseable replica
pub(crate) fn read_first<T: DeserializeOwned>(disks: &[&Disk], rel: &Path) -> Option<T> {
    for disk in disks {
        let Ok(mut file) = disk.open_file(rel) else {
            continue;
        };
        let mut bytes = Vec::new();
        if file.read_to_end(&mut bytes).is_err() {
            continue;
        }
        match serde_json::from_slice(&bytes) {
            Ok(doc) => return Some(doc),
            Err(e) => {
                warn!(disk = %disk.path().display(), path = %rel.display(), error = %e,
                      "unparseable metadata replica skipped");
            }
        }
    }
    None
}

/// Load the bucket document, or fail with `BucketNotFound`
pub(crate) fn read_bucket_document(
    disks: &[&Disk],
    bucket: &BucketName,
) -> Result<BucketDocument> {
    read_first(disks, &layout::bucket_metadata_path(bucket)).ok_or_else(|| {
        Error::BucketNotFound {
            bucket: bucket.to_string(),
        }
    })
}

/// Load an object document, or fail with `ObjectNotFound`
pub(crate) fn read_object_document(
    disks: &[&Disk],
    bucket: &BucketName,
    key: &ObjectKey,
) -> Result<ObjectDocument> {
    read_first(disks, &layout::object_metadata_path(bucket, key)).ok_or_else(|| {
        Error::ObjectNotFound {
            bucket: bucket.to_string(),
            object: key.to_string(),
        }
    })
}

#[cfg(test)]
#[cfg(target_os = "linux")]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_disks(dir: &Path, count: usize) -> Vec<Disk> {
        (0..count)
            .map(|i| {
                let p = dir.join(i.to_string());
                std::fs::create_dir_all(&p).unwrap();
                Disk::open(p).unwrap()
            })
            .collect()
    }

    fn sample_bucket_doc() -> BucketDocument {
        BucketDocument {
            version: FORMAT_VERSION.to_string(),
            name: "photos".to_string(),
            acl: BucketAcl::PublicRead,
            created: Utc::now(),
            data_shards: 2,
            parity_shards: 2,
            block_size: 1024,
        }
    }

    #[test]
    fn test_replicated_write_and_first_read() {
        let dir = tempdir().unwrap();
        let disks = make_disks(dir.path(), 4);
        let refs: Vec<&Disk> = disks.iter().collect();
        let bucket = BucketName::new("photos").unwrap();

        for disk in &refs {
            disk.make_dir("photos").unwrap();
        }
        write_replicated(&refs, &layout::bucket_metadata_path(&bucket), &sample_bucket_doc(), 2)
            .unwrap();

        let doc = read_bucket_document(&refs, &bucket).unwrap();
        assert_eq!(doc.name, "photos");
        assert_eq!(doc.acl, BucketAcl::PublicRead);

        // Every disk holds an identical replica
        for disk in &disks {
            let replica: Option<BucketDocument> =
                read_first(&[disk], &layout::bucket_metadata_path(&bucket));
            assert!(replica.is_some());
        }
    }

    #[test]
    fn test_read_skips_corrupt_replicas() {
        let dir = tempdir().unwrap();
        let disks = make_disks(dir.path(), 3);
        let refs: Vec<&Disk> = disks.iter().collect();
        let bucket = BucketName::new("photos").unwrap();

        for disk in &refs {
            disk.make_dir("photos").unwrap();
        }
        write_replicated(&refs, &layout::bucket_metadata_path(&bucket), &sample_bucket_doc(), 2)
            .unwrap();

        // Corrupt the first replica; the read falls through to the next
        std::fs::write(dir.path().join("0/photos/metadata"), b"not json").unwrap();
        assert!(read_bucket_document(&refs, &bucket).is_ok());
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let dir = tempdir().unwrap();
        let disks = make_disks(dir.path(), 2);
        let refs: Vec<&Disk> = disks.iter().collect();
        let bucket = BucketName::new("absent").unwrap();

        match read_bucket_document(&refs, &bucket) {
            Err(Error::BucketNotFound { bucket }) => assert_eq!(bucket, "absent"),
            other => panic!("expected BucketNotFound, got {other:?}"),
        }
    }
}
