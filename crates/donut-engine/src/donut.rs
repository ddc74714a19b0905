//! The Donut facade
//!
//! A [`Donut`] is a named collection of disks (grouped into nodes)
//! exposing bucket and object CRUD. Inputs arrive pre-validated as
//! [`BucketName`] / [`ObjectKey`] values; the driver layer owns string
//! validation, locking and error translation.

use crate::layout;
use crate::metadata::{self, BucketDocument, ObjectDocument, FORMAT_VERSION};
use crate::objects;
use chrono::Utc;
use donut_common::config::{DonutConfig, ErasureParams};
use donut_common::{BucketAcl, BucketName, Error, ObjectKey, Result};
use donut_storage::{Disk, Node};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Default number of keys returned by a listing when the caller does
/// not bound it
const DEFAULT_MAX_KEYS: i64 = 1000;

/// Result of a bucket listing walk
#[derive(Clone, Debug, Default)]
pub struct ListObjectsResult {
    /// Matching object keys, ascending
    pub objects: Vec<String>,
    /// Delimiter groupings, ascending
    pub common_prefixes: Vec<String>,
    /// Whether the listing was cut off at max-keys
    pub is_truncated: bool,
    /// Resume point: the last entry emitted, set only when truncated
    pub next_marker: Option<String>,
}

/// One entry of the merged listing sequence
enum ListEntry {
    Object(String),
    Prefix(String),
}

impl ListEntry {
    fn marker(&self) -> &str {
        match self {
            Self::Object(key) => key,
            Self::Prefix(prefix) => prefix,
        }
    }
}

/// A named collection of disks forming a single logical store
pub struct Donut {
    name: String,
    nodes: Vec<Node>,
    erasure: ErasureParams,
    block_size: usize,
}

impl Donut {
    /// Assemble a donut from a node/disk-paths map
    ///
    /// Disk ordering is the node order given here, then each node's
    /// disk order; shard index `i` maps to the `i`-th disk of that
    /// flattened sequence. The erasure scheme must cover the disks
    /// exactly: k + m equals the total disk count.
    pub fn new(
        name: impl Into<String>,
        node_disk_map: Vec<(String, Vec<PathBuf>)>,
        config: &DonutConfig,
    ) -> Result<Self> {
        let name = name.into();
        if node_disk_map.is_empty() {
            return Err(Error::invalid_argument("donut has no nodes"));
        }
        if config.block_size == 0 {
            return Err(Error::invalid_argument("block size must be > 0"));
        }

        let mut nodes = Vec::with_capacity(node_disk_map.len());
        for (node_name, disk_paths) in node_disk_map {
            nodes.push(Node::new(node_name, &disk_paths)?);
        }

        let disk_count: usize = nodes.iter().map(Node::disk_count).sum();
        if disk_count < 2 {
            return Err(Error::invalid_argument(
                "donut needs at least 2 disks for erasure coding",
            ));
        }

        let erasure = config
            .erasure
            .unwrap_or_else(|| ErasureParams::for_disk_count(disk_count));
        if erasure.data_shards == 0 || erasure.parity_shards == 0 {
            return Err(Error::invalid_argument(
                "erasure scheme needs both data and parity shards",
            ));
        }
        if erasure.total_shards() != disk_count {
            return Err(Error::invalid_argument(format!(
                "erasure scheme {}+{} does not cover {} disks",
                erasure.data_shards, erasure.parity_shards, disk_count
            )));
        }

        info!(donut = %name, disks = disk_count,
              k = erasure.data_shards, m = erasure.parity_shards,
              block_size = config.block_size, "donut assembled");

        Ok(Self {
            name,
            nodes,
            erasure,
            block_size: config.block_size,
        })
    }

    /// The donut name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The erasure scheme applied to newly created buckets
    #[must_use]
    pub fn erasure(&self) -> ErasureParams {
        self.erasure
    }

    /// All disks across all nodes, in shard order
    fn disks(&self) -> Vec<&Disk> {
        self.nodes.iter().flat_map(Node::disks).collect()
    }

    /// Create a bucket on every disk
    pub fn make_bucket(&self, bucket: &BucketName, acl: BucketAcl) -> Result<()> {
        let disks = self.disks();
        for disk in &disks {
            if disk.dir_exists(bucket.as_str())? {
                return Err(Error::BucketExists {
                    bucket: bucket.to_string(),
                });
            }
        }
        for disk in &disks {
            disk.make_dir(bucket.as_str())?;
        }

        let document = BucketDocument {
            version: FORMAT_VERSION.to_string(),
            name: bucket.to_string(),
            acl,
            created: Utc::now(),
            data_shards: self.erasure.data_shards,
            parity_shards: self.erasure.parity_shards,
            block_size: self.block_size,
        };
        metadata::write_replicated(
            &disks,
            &layout::bucket_metadata_path(bucket),
            &document,
            self.erasure.data_shards,
        )?;
        info!(bucket = %bucket, acl = %acl, "bucket created");
        Ok(())
    }

    /// List every bucket, ascending by name
    pub fn list_buckets(&self) -> Result<Vec<BucketDocument>> {
        let disks = self.disks();
        let mut buckets: BTreeMap<String, BucketDocument> = BTreeMap::new();

        for disk in &disks {
            for name in disk.list_dirs("")? {
                if buckets.contains_key(&name) {
                    continue;
                }
                let Ok(bucket) = BucketName::new(&name) else {
                    continue;
                };
                // Directories without a readable document are ignored;
                // they are either foreign or an interrupted create.
                if let Some(doc) =
                    metadata::read_first(&disks, &layout::bucket_metadata_path(&bucket))
                {
                    buckets.insert(name, doc);
                }
            }
        }

        Ok(buckets.into_values().collect())
    }

    /// Fetch the bucket document
    pub fn get_bucket_metadata(&self, bucket: &BucketName) -> Result<BucketDocument> {
        metadata::read_bucket_document(&self.disks(), bucket)
    }

    /// Update the bucket ACL on every replica
    pub fn set_bucket_metadata(&self, bucket: &BucketName, acl: BucketAcl) -> Result<()> {
        let disks = self.disks();
        let mut document = metadata::read_bucket_document(&disks, bucket)?;
        document.acl = acl;
        metadata::write_replicated(
            &disks,
            &layout::bucket_metadata_path(bucket),
            &document,
            document.data_shards,
        )?;
        debug!(bucket = %bucket, acl = %acl, "bucket metadata updated");
        Ok(())
    }

    /// Store an object from a byte stream, returning the calculated MD5
    /// as lowercase hex
    ///
    /// `expected_md5_hex`, when present, must match the calculated
    /// digest or the write is rolled back with `BadDigest`.
    #[allow(clippy::too_many_arguments)]
    pub fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content_type: &str,
        expected_md5_hex: Option<&str>,
        declared_size: i64,
        reader: &mut dyn Read,
        user_metadata: HashMap<String, String>,
    ) -> Result<String> {
        let disks = self.disks();
        let bucket_doc = metadata::read_bucket_document(&disks, bucket)?;
        let document = objects::write_object(
            &disks,
            &bucket_doc,
            bucket,
            key,
            content_type,
            expected_md5_hex,
            declared_size,
            reader,
            user_metadata,
        )?;
        info!(bucket = %bucket, key = %key, size = document.size, md5 = %document.md5,
              "object stored");
        Ok(document.md5)
    }

    /// Stream a whole object into `sink`, returning the bytes written
    pub fn get_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        sink: &mut dyn Write,
    ) -> Result<u64> {
        let disks = self.disks();
        let document = metadata::read_object_document(&disks, bucket, key)?;
        objects::read_object_range(&disks, &document, bucket, key, 0, document.size, sink)
    }

    /// Stream `length` bytes of an object starting at `start`
    pub fn get_partial_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        start: i64,
        length: i64,
        sink: &mut dyn Write,
    ) -> Result<u64> {
        if start < 0 || length < 0 {
            return Err(Error::InvalidRange { start, length });
        }
        let disks = self.disks();
        let document = metadata::read_object_document(&disks, bucket, key)?;
        let size = document.size as i64;
        if start > size {
            return Err(Error::InvalidRange { start, length });
        }
        if length > 0 {
            let last = start
                .checked_add(length)
                .and_then(|end| end.checked_sub(1))
                .ok_or(Error::InvalidRange { start, length })?;
            if last >= size {
                return Err(Error::InvalidRange { start, length });
            }
        }
        objects::read_object_range(
            &disks,
            &document,
            bucket,
            key,
            start as u64,
            length as u64,
            sink,
        )
    }

    /// Fetch an object's document
    pub fn get_object_metadata(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> Result<ObjectDocument> {
        metadata::read_object_document(&self.disks(), bucket, key)
    }

    /// Walk the bucket key-space with prefix/marker/delimiter semantics
    ///
    /// Keys are read from the first disk that lists successfully, since
    /// object directories are replicated on every disk. Results are
    /// ascending; objects and common prefixes share one max-keys budget.
    pub fn list_objects(
        &self,
        bucket: &BucketName,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: i64,
    ) -> Result<ListObjectsResult> {
        let disks = self.disks();
        metadata::read_bucket_document(&disks, bucket)?;

        let names = disks
            .iter()
            .find_map(|disk| disk.list_dirs(bucket.as_str()).ok())
            .ok_or_else(|| {
                Error::internal(format!("bucket directory unreadable: {bucket}"))
            })?;

        let mut keys: Vec<String> = names
            .iter()
            .filter_map(|name| layout::unescape_key(name))
            .filter(|key| key.starts_with(prefix) && key.as_str() > marker)
            .collect();
        keys.sort();

        let mut entries: Vec<ListEntry> = if delimiter.is_empty() {
            keys.into_iter().map(ListEntry::Object).collect()
        } else {
            let mut prefixes = BTreeSet::new();
            let mut objects = Vec::new();
            for key in keys {
                let suffix = &key[prefix.len()..];
                if let Some(at) = suffix.find(delimiter) {
                    prefixes.insert(format!("{prefix}{}", &suffix[..at + delimiter.len()]));
                } else {
                    objects.push(key);
                }
            }
            objects
                .into_iter()
                .map(ListEntry::Object)
                .chain(prefixes.into_iter().map(ListEntry::Prefix))
                .collect()
        };
        entries.sort_by(|a, b| a.marker().cmp(b.marker()));

        let limit = if max_keys <= 0 {
            DEFAULT_MAX_KEYS as usize
        } else {
            max_keys as usize
        };
        let is_truncated = entries.len() > limit;
        entries.truncate(limit);
        let next_marker = if is_truncated {
            entries.last().map(|e| e.marker().to_string())
        } else {
            None
        };

        let mut result = ListObjectsResult {
            is_truncated,
            next_marker,
            ..Default::default()
        };
        for entry in entries {
            match entry {
                ListEntry::Object(key) => result.objects.push(key),
                ListEntry::Prefix(prefix) => result.common_prefixes.push(prefix),
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
#[cfg(target_os = "linux")]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn test_donut(dir: &Path, disk_count: usize, block_size: usize) -> Donut {
        let paths: Vec<PathBuf> = (0..disk_count)
            .map(|i| {
                let p = dir.join(i.to_string());
                fs::create_dir_all(&p).unwrap();
                p
            })
            .collect();
        let config = DonutConfig {
            block_size,
            ..DonutConfig::default()
        };
        Donut::new("test", vec![("localhost".to_string(), paths)], &config).unwrap()
    }

    fn pseudorandom(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        data
    }

    fn bucket(name: &str) -> BucketName {
        BucketName::new(name).unwrap()
    }

    fn key(name: &str) -> ObjectKey {
        ObjectKey::new(name).unwrap()
    }

    fn put(donut: &Donut, b: &BucketName, k: &ObjectKey, data: &[u8]) -> String {
        donut
            .put_object(
                b,
                k,
                "application/octet-stream",
                None,
                data.len() as i64,
                &mut &data[..],
                HashMap::new(),
            )
            .unwrap()
    }

    fn get(donut: &Donut, b: &BucketName, k: &ObjectKey) -> Result<Vec<u8>> {
        let mut sink = Vec::new();
        donut.get_object(b, k, &mut sink)?;
        Ok(sink)
    }

    #[test]
    fn test_bucket_lifecycle() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let photos = bucket("photos");

        donut.make_bucket(&photos, BucketAcl::PublicRead).unwrap();

        let buckets = donut.list_buckets().unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name, "photos");
        assert_eq!(buckets[0].acl, BucketAcl::PublicRead);

        match donut.make_bucket(&photos, BucketAcl::Private) {
            Err(Error::BucketExists { bucket }) => assert_eq!(bucket, "photos"),
            other => panic!("expected BucketExists, got {other:?}"),
        }
    }

    #[test]
    fn test_list_buckets_sorted() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        for name in ["zebra", "alpha", "middle"] {
            donut.make_bucket(&bucket(name), BucketAcl::Private).unwrap();
        }
        let names: Vec<String> = donut
            .list_buckets()
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["alpha", "middle", "zebra"]);
    }

    #[test]
    fn test_set_bucket_metadata() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        donut.set_bucket_metadata(&b, BucketAcl::PublicReadWrite).unwrap();
        let doc = donut.get_bucket_metadata(&b).unwrap();
        assert_eq!(doc.acl, BucketAcl::PublicReadWrite);

        match donut.set_bucket_metadata(&bucket("absent"), BucketAcl::Private) {
            Err(Error::BucketNotFound { .. }) => {}
            other => panic!("expected BucketNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_multi_block() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("cat.jpg");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        // ~10 blocks with a short tail
        let data = pseudorandom(10_000, 1);
        let md5 = put(&donut, &b, &k, &data);

        assert_eq!(get(&donut, &b, &k).unwrap(), data);

        let doc = donut.get_object_metadata(&b, &k).unwrap();
        assert_eq!(doc.size, 10_000);
        assert_eq!(doc.md5, md5);
        assert_eq!(doc.block_count, 10);
        assert_eq!(doc.last_block_len, 10_000 - 9 * 1024);
        assert_eq!(doc.content_type, "application/octet-stream");
    }

    #[test]
    fn test_round_trip_exact_block_multiple() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("exact");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let data = pseudorandom(4 * 1024, 2);
        put(&donut, &b, &k, &data);
        assert_eq!(get(&donut, &b, &k).unwrap(), data);

        let doc = donut.get_object_metadata(&b, &k).unwrap();
        assert_eq!(doc.block_count, 4);
        assert_eq!(doc.last_block_len, 1024);
    }

    #[test]
    fn test_zero_byte_object() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("empty");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let md5 = put(&donut, &b, &k, b"");
        assert_eq!(md5, "d41d8cd98f00b204e9800998ecf8427e");

        assert_eq!(get(&donut, &b, &k).unwrap(), b"");
        let doc = donut.get_object_metadata(&b, &k).unwrap();
        assert_eq!(doc.size, 0);
        assert_eq!(doc.block_count, 0);
    }

    #[test]
    fn test_expected_md5_match_and_mismatch() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let data = pseudorandom(3000, 3);
        let correct = donut_common::checksum::hex_encode(&md5::compute(&data).0);

        let k = key("good");
        let calculated = donut
            .put_object(
                &b,
                &k,
                "image/jpeg",
                Some(correct.as_str()),
                data.len() as i64,
                &mut &data[..],
                HashMap::new(),
            )
            .unwrap();
        assert_eq!(calculated, correct);

        let k2 = key("bad");
        let wrong = "0".repeat(32);
        match donut.put_object(
            &b,
            &k2,
            "image/jpeg",
            Some(wrong.as_str()),
            data.len() as i64,
            &mut &data[..],
            HashMap::new(),
        ) {
            Err(Error::BadDigest { expected, .. }) => assert_eq!(expected, wrong),
            other => panic!("expected BadDigest, got {other:?}"),
        }

        // The failed write left nothing behind
        match get(&donut, &b, &k2) {
            Err(Error::ObjectNotFound { .. }) => {}
            other => panic!("expected ObjectNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_read_survives_m_missing_shards() {
        let dir = tempdir().unwrap();
        // 6 disks: k = 3, m = 3
        let donut = test_donut(dir.path(), 6, 1024);
        let b = bucket("photos");
        let k = key("resilient");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let data = pseudorandom(5000, 4);
        put(&donut, &b, &k, &data);
        let doc = donut.get_object_metadata(&b, &k).unwrap();

        // Delete every shard on 3 of the 6 disks
        for disk_index in [0usize, 2, 5] {
            for block in 0..doc.block_count {
                let rel = layout::shard_file_path(&b, &k, block, disk_index);
                fs::remove_file(dir.path().join(disk_index.to_string()).join(rel)).unwrap();
            }
        }

        assert_eq!(get(&donut, &b, &k).unwrap(), data);
    }

    #[test]
    fn test_read_survives_corrupted_shard_per_block() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("scarred");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let data = pseudorandom(4000, 5);
        put(&donut, &b, &k, &data);
        let doc = donut.get_object_metadata(&b, &k).unwrap();

        // Flip bytes in one shard file of every block
        for block in 0..doc.block_count {
            let shard_index = (block as usize) % 4;
            let rel = layout::shard_file_path(&b, &k, block, shard_index);
            let path = dir.path().join(shard_index.to_string()).join(rel);
            let mut bytes = fs::read(&path).unwrap();
            bytes[0] ^= 0xff;
            fs::write(&path, bytes).unwrap();
        }

        assert_eq!(get(&donut, &b, &k).unwrap(), data);
    }

    #[test]
    fn test_read_fails_beyond_parity() {
        let dir = tempdir().unwrap();
        // 4 disks: k = 2, m = 2; corrupt m + 1 shards of block 0
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("doomed");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let data = pseudorandom(3000, 6);
        put(&donut, &b, &k, &data);

        for shard_index in 0..3usize {
            let rel = layout::shard_file_path(&b, &k, 0, shard_index);
            let path = dir.path().join(shard_index.to_string()).join(rel);
            let mut bytes = fs::read(&path).unwrap();
            for byte in &mut bytes {
                *byte ^= 0x55;
            }
            fs::write(&path, bytes).unwrap();
        }

        match get(&donut, &b, &k) {
            Err(Error::ObjectCorrupted { object, .. }) => assert_eq!(object, "doomed"),
            other => panic!("expected ObjectCorrupted, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_reads() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("ranged");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        let data = pseudorandom(10_000, 7);
        put(&donut, &b, &k, &data);

        let range = |start: i64, length: i64| -> Result<Vec<u8>> {
            let mut sink = Vec::new();
            donut.get_partial_object(&b, &k, start, length, &mut sink)?;
            Ok(sink)
        };

        // Within one block
        assert_eq!(range(10, 100).unwrap(), &data[10..110]);
        // Spanning a block boundary
        assert_eq!(range(1000, 100).unwrap(), &data[1000..1100]);
        // Whole object
        assert_eq!(range(0, 10_000).unwrap(), data);
        // The single last byte
        assert_eq!(range(9_999, 1).unwrap(), &data[9_999..]);
        // Zero-length at the very end
        assert_eq!(range(10_000, 0).unwrap(), b"");

        for (start, length) in [(-1, 10), (10, -1), (10_001, 0), (10_000, 1), (9_999, 2)] {
            match range(start, length) {
                Err(Error::InvalidRange { .. }) => {}
                other => panic!("expected InvalidRange for ({start}, {length}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_overwrite_replaces_payload() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let b = bucket("photos");
        let k = key("mutable-key");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        put(&donut, &b, &k, &pseudorandom(8000, 8));
        let second = pseudorandom(500, 9);
        put(&donut, &b, &k, &second);

        assert_eq!(get(&donut, &b, &k).unwrap(), second);
        let doc = donut.get_object_metadata(&b, &k).unwrap();
        assert_eq!(doc.size, 500);
        assert_eq!(doc.block_count, 1);
    }

    #[test]
    fn test_put_into_missing_bucket() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 1024);
        let data = [1u8, 2, 3];
        match donut.put_object(
            &bucket("absent"),
            &key("k"),
            "",
            None,
            3,
            &mut &data[..],
            HashMap::new(),
        ) {
            Err(Error::BucketNotFound { .. }) => {}
            other => panic!("expected BucketNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_listing_plain() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 256);
        let b = bucket("listing");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        for name in ["b", "a", "c/nested", "aa"] {
            put(&donut, &b, &key(name), b"x");
        }

        let result = donut.list_objects(&b, "", "", "", 0).unwrap();
        assert_eq!(result.objects, vec!["a", "aa", "b", "c/nested"]);
        assert!(result.common_prefixes.is_empty());
        assert!(!result.is_truncated);
        assert!(result.next_marker.is_none());
    }

    #[test]
    fn test_listing_prefix_and_marker() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 256);
        let b = bucket("listing");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        for i in 1..=6 {
            put(&donut, &b, &key(&format!("a/{i:03}")), b"x");
        }
        put(&donut, &b, &key("b/001"), b"x");

        let result = donut.list_objects(&b, "a/", "a/003", "", 0).unwrap();
        assert_eq!(result.objects, vec!["a/004", "a/005", "a/006"]);
    }

    #[test]
    fn test_listing_delimiter_groups() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 256);
        let b = bucket("listing");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        for i in 1..=3 {
            put(&donut, &b, &key(&format!("a/{i:03}")), b"x");
            put(&donut, &b, &key(&format!("b/{i:03}")), b"x");
        }
        put(&donut, &b, &key("top-level"), b"x");

        let result = donut.list_objects(&b, "", "", "/", 1000).unwrap();
        assert_eq!(result.objects, vec!["top-level"]);
        assert_eq!(result.common_prefixes, vec!["a/", "b/"]);
        assert!(!result.is_truncated);
    }

    #[test]
    fn test_listing_truncation() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 256);
        let b = bucket("listing");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        for i in 0..10 {
            put(&donut, &b, &key(&format!("k{i}")), b"x");
        }

        let result = donut.list_objects(&b, "", "", "", 4).unwrap();
        assert_eq!(result.objects.len(), 4);
        assert!(result.is_truncated);
        assert_eq!(result.next_marker.as_deref(), Some("k3"));

        // Resume from the marker
        let rest = donut.list_objects(&b, "", "k3", "", 1000).unwrap();
        assert_eq!(rest.objects.len(), 6);
        assert!(!rest.is_truncated);
    }

    #[test]
    fn test_listing_strictly_ascending() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 4, 256);
        let b = bucket("listing");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();

        for name in ["zz", "m/x", "aa", "m/y", "b"] {
            put(&donut, &b, &key(name), b"x");
        }

        let result = donut.list_objects(&b, "", "", "", 0).unwrap();
        let mut sorted = result.objects.clone();
        sorted.sort();
        assert_eq!(result.objects, sorted);
    }

    #[test]
    fn test_sixteen_disk_default_layout() {
        let dir = tempdir().unwrap();
        let donut = test_donut(dir.path(), 16, 1024);
        assert_eq!(donut.erasure(), ErasureParams::new(8, 8));

        let b = bucket("wide");
        let k = key("obj");
        donut.make_bucket(&b, BucketAcl::Private).unwrap();
        let data = pseudorandom(3000, 10);
        put(&donut, &b, &k, &data);
        assert_eq!(get(&donut, &b, &k).unwrap(), data);
    }
}
