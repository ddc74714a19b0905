//! Deterministic on-disk bucket layout
//!
//! Every disk carries the same directory shape:
//!
//! ```text
//! <disk-root>/<bucket>/metadata                      bucket document replica
//! <disk-root>/<bucket>/<escaped-key>/metadata        object document replica
//! <disk-root>/<bucket>/<escaped-key>/block-<j>.shard-<i>
//! ```
//!
//! Object keys are escaped into a single path component. The escaping
//! is injective and reversible, so a directory listing recovers the
//! exact key without consulting any metadata.

use donut_common::{BucketName, ObjectKey};
use std::path::PathBuf;

/// Reserved file name for metadata documents
pub const METADATA_FILE: &str = "metadata";

/// Escape an object key into a single safe path component
///
/// Escaped bytes are `/`, `%`, `\`, ASCII control characters and a
/// leading dot; everything else passes through unchanged. A key whose
/// escaped form would equal the reserved name `metadata` gets its first
/// character escaped as well, keeping object directories disjoint from
/// the bucket metadata file.
#[must_use]
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        let escape = match c {
            '/' | '%' | '\\' => true,
            c if (c as u32) < 0x20 || c as u32 == 0x7f => true,
            '.' if i == 0 => true,
            _ => false,
        };
        if escape {
            out.push('%');
            out.push_str(&format!("{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    if out == METADATA_FILE {
        // "metadata" itself: escape the leading 'm'
        out.replace_range(0..1, "%6D");
    }
    out
}

/// Reverse [`escape_key`]. Returns `None` for strings that are not a
/// valid escaping (listing walks skip such entries).
#[must_use]
pub fn unescape_key(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let hi = chars.next()?.to_digit(16)?;
            let lo = chars.next()?.to_digit(16)?;
            out.push(char::from_u32(hi * 16 + lo)?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Relative path of a bucket directory
#[must_use]
pub fn bucket_dir(bucket: &BucketName) -> PathBuf {
    PathBuf::from(bucket.as_str())
}

/// Relative path of the bucket metadata replica
#[must_use]
pub fn bucket_metadata_path(bucket: &BucketName) -> PathBuf {
    bucket_dir(bucket).join(METADATA_FILE)
}

/// Relative path of an object's shard directory
#[must_use]
pub fn object_dir(bucket: &BucketName, key: &ObjectKey) -> PathBuf {
    bucket_dir(bucket).join(escape_key(key.as_str()))
}

/// Relative path of the object metadata replica
#[must_use]
pub fn object_metadata_path(bucket: &BucketName, key: &ObjectKey) -> PathBuf {
    object_dir(bucket, key).join(METADATA_FILE)
}

/// Relative path of shard `shard` of block `block` for an object.
/// The shard index doubles as the disk position the file lives on.
#[must_use]
pub fn shard_file_path(bucket: &BucketName, key: &ObjectKey, block: u64, shard: usize) -> PathBuf {
    object_dir(bucket, key).join(format!("block-{block}.shard-{shard}"))
}
