//! Object write and read pipeline
//!
//! Write: cut the stream into blocks, encode each block into k+m
//! shards, fan the shards out to the disks in parallel, then commit by
//! writing the replicated object document. Shard files are fsynced
//! before the document is written, so a document always describes fully
//! durable shards; a crash beforehand leaves orphan shard files.
//!
//! Read: for each block in range, collect every shard file that exists
//! and passes its crc32c, decode from any k of them, strip padding and
//! stream into the caller's sink.

use crate::layout;
use crate::metadata::{self, BucketDocument, ObjectDocument, FORMAT_VERSION};
use chrono::Utc;
use donut_common::checksum::{verify_crc32c, Md5Digest};
use donut_common::{BucketName, Error, ObjectKey, Result};
use donut_erasure::{ErasureCodec, ErasureError};
use donut_storage::Disk;
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Write one object from a byte stream
///
/// Returns the committed object document. On any failure every shard
/// and metadata file already written for the object is removed.
#[allow(clippy::too_many_arguments)]
pub(crate) fn write_object(
    disks: &[&Disk],
    bucket_doc: &BucketDocument,
    bucket: &BucketName,
    key: &ObjectKey,
    content_type: &str,
    expected_md5_hex: Option<&str>,
    declared_size: i64,
    reader: &mut dyn Read,
    mut user_metadata: HashMap<String, String>,
) -> Result<ObjectDocument> {
    let codec = ErasureCodec::new(bucket_doc.data_shards, bucket_doc.parity_shards)
        .map_err(Error::from)?;
    debug_assert_eq!(codec.total_shards(), disks.len());

    // Objects are immutable but keys are not reserved: a re-put replaces
    // the previous generation wholesale.
    cleanup_object(disks, bucket, key);

    match write_blocks(
        disks,
        bucket_doc,
        bucket,
        key,
        &codec,
        expected_md5_hex,
        reader,
    ) {
        Ok((size, block_count, last_block_len, shard_checksums, md5)) => {
            user_metadata.insert("contentLength".to_string(), declared_size.to_string());
            let document = ObjectDocument {
                version: FORMAT_VERSION.to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                size,
                md5,
                content_type: content_type.to_string(),
                created: Utc::now(),
                block_size: bucket_doc.block_size,
                block_count,
                last_block_len,
                data_shards: bucket_doc.data_shards,
                parity_shards: bucket_doc.parity_shards,
                shard_checksums,
                metadata: user_metadata,
            };
            if let Err(e) = metadata::write_replicated(
                disks,
                &layout::object_metadata_path(bucket, key),
                &document,
                bucket_doc.data_shards,
            ) {
                cleanup_object(disks, bucket, key);
                return Err(e);
            }
            Ok(document)
        }
        Err(e) => {
            cleanup_object(disks, bucket, key);
            Err(e)
        }
    }
}

type BlockOutcome = (u64, u64, usize, Vec<Vec<u32>>, String);

fn write_blocks(
    disks: &[&Disk],
    bucket_doc: &BucketDocument,
    bucket: &BucketName,
    key: &ObjectKey,
    codec: &ErasureCodec,
    expected_md5_hex: Option<&str>,
    reader: &mut dyn Read,
) -> Result<BlockOutcome> {
    let block_size = bucket_doc.block_size;
    let mut buf = vec![0u8; block_size];
    let mut digest = Md5Digest::new();
    let mut shard_checksums: Vec<Vec<u32>> = Vec::new();
    let mut size: u64 = 0;
    let mut last_block_len = 0usize;

    loop {
        let n = read_block(reader, &mut buf)?;
        if n == 0 {
            break;
        }
        let block = &buf[..n];
        digest.update(block);
        size += n as u64;
        last_block_len = n;

        let block_index = shard_checksums.len() as u64;
        let shards = codec.encode(block).map_err(Error::from)?;
        shard_checksums.push(shards.iter().map(|s| s.checksum).collect());

        std::thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(shards.len());
            for (shard, disk) in shards.iter().zip(disks.iter()) {
                let rel = layout::shard_file_path(bucket, key, block_index, shard.index);
                handles.push(scope.spawn(move || -> Result<()> {
                    let mut file = disk.create_file(&rel)?;
                    file.write_all(&shard.data)?;
                    file.sync_all()?;
                    Ok(())
                }));
            }
            for handle in handles {
                handle
                    .join()
                    .map_err(|_| Error::internal("shard writer thread panicked"))??;
            }
            Ok(())
        })?;

        if n < block_size {
            break;
        }
    }

    let calculated = digest.finalize_hex();
    if let Some(expected) = expected_md5_hex {
        if expected != calculated {
            return Err(Error::BadDigest {
                expected: expected.to_string(),
                calculated,
            });
        }
    }

    let block_count = shard_checksums.len() as u64;
    debug!(bucket = %bucket, key = %key, size, blocks = block_count, "object blocks written");
    Ok((size, block_count, last_block_len, shard_checksums, calculated))
}

/// Stream `length` bytes starting at `start` into `sink`
///
/// Only the blocks overlapping the range are read and decoded. The
/// range is assumed to be validated against the document already.
pub(crate) fn read_object_range(
    disks: &[&Disk],
    document: &ObjectDocument,
    bucket: &BucketName,
    key: &ObjectKey,
    start: u64,
    length: u64,
    sink: &mut dyn Write,
) -> Result<u64> {
    if length == 0 {
        return Ok(0);
    }

    let codec = ErasureCodec::new(document.data_shards, document.parity_shards)
        .map_err(Error::from)?;
    let block_size = document.block_size as u64;
    let end = start + length;
    let first_block = start / block_size;
    let last_block = (end - 1) / block_size;

    let mut written: u64 = 0;
    for block_index in first_block..=last_block {
        let block_len = if block_index == document.block_count - 1 {
            document.last_block_len
        } else {
            document.block_size
        };

        let block = assemble_block(disks, document, bucket, key, &codec, block_index, block_len)?;

        let block_start = block_index * block_size;
        let from = start.saturating_sub(block_start) as usize;
        let to = (end - block_start).min(block_len as u64) as usize;
        sink.write_all(&block[from..to])?;
        written += (to - from) as u64;
    }

    Ok(written)
}

/// Gather, verify and decode the shards of one block
fn assemble_block(
    disks: &[&Disk],
    document: &ObjectDocument,
    bucket: &BucketName,
    key: &ObjectKey,
    codec: &ErasureCodec,
    block_index: u64,
    block_len: usize,
) -> Result<Vec<u8>> {
    let checksums = &document.shard_checksums[block_index as usize];
    let mut slots: Vec<Option<Vec<u8>>> = Vec::with_capacity(disks.len());

    for (shard_index, disk) in disks.iter().enumerate() {
        let rel = layout::shard_file_path(bucket, key, block_index, shard_index);
        let slot = match disk.open_file(&rel) {
            Ok(mut file) => {
                let mut data = Vec::new();
                match file.read_to_end(&mut data) {
                    Ok(_) if verify_crc32c(&data, checksums[shard_index]) => Some(data),
                    Ok(_) => {
                        warn!(bucket = %bucket, key = %key, block = block_index,
                              shard = shard_index, "shard checksum mismatch, excluding");
                        None
                    }
                    Err(e) => {
                        warn!(bucket = %bucket, key = %key, block = block_index,
                              shard = shard_index, error = %e, "shard unreadable, excluding");
                        None
                    }
                }
            }
            Err(_) => None,
        };
        slots.push(slot);
    }

    codec.decode(&slots, block_len).map_err(|e| match e {
        ErasureError::InsufficientShards {
            available,
            required,
        } => {
            warn!(bucket = %bucket, key = %key, block = block_index,
                  available, required, "block unrecoverable");
            Error::ObjectCorrupted {
                bucket: bucket.to_string(),
                object: key.to_string(),
            }
        }
        other => Error::internal(other.to_string()),
    })
}

/// Remove every trace of an object from every disk, best effort
pub(crate) fn cleanup_object(disks: &[&Disk], bucket: &BucketName, key: &ObjectKey) {
    let rel = layout::object_dir(bucket, key);
    for disk in disks {
        if let Err(e) = disk.remove_dir_all(&rel) {
            warn!(disk = %disk.path().display(), bucket = %bucket, key = %key,
                  error = %e, "object cleanup failed");
        }
    }
}

/// Read until the buffer is full or the stream ends
fn read_block(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
