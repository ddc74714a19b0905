//! Reed-Solomon encoder/decoder
//!
//! Built on `reed-solomon-simd`, which picks SIMD instructions at
//! runtime where available (SSE, AVX, NEON). Shard lengths are rounded
//! up to a multiple of 64 bytes to satisfy the backend's alignment
//! requirements; the caller strips padding using the recorded block
//! length.

use crate::shard::Shard;
use donut_common::checksum::compute_crc32c;
use donut_common::Error as CommonError;
use reed_solomon_simd::{ReedSolomonDecoder, ReedSolomonEncoder};
use thiserror::Error;

/// Shard lengths are rounded up to this granularity
const SHARD_ALIGN: usize = 64;

/// Errors specific to erasure coding operations
#[derive(Debug, Error)]
pub enum ErasureError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("decoding failed: {0}")]
    DecodingFailed(String),

    #[error("insufficient shards: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    #[error("shard size mismatch")]
    ShardSizeMismatch,
}

impl From<ErasureError> for CommonError {
    fn from(e: ErasureError) -> Self {
        match e {
            ErasureError::InsufficientShards {
                available,
                required,
            } => CommonError::InsufficientShards {
                available,
                required,
            },
            other => CommonError::Internal(other.to_string()),
        }
    }
}

/// Reed-Solomon codec for a fixed (k, m) scheme
///
/// Any k of the k+m shards produced by [`encode`](Self::encode)
/// reconstruct the original block.
pub struct ErasureCodec {
    data_shards: usize,
    parity_shards: usize,
}

impl ErasureCodec {
    /// Create a new codec with k data shards and m parity shards
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self, ErasureError> {
        if data_shards == 0 {
            return Err(ErasureError::InvalidConfig(
                "data shard count must be > 0".into(),
            ));
        }
        if parity_shards == 0 {
            return Err(ErasureError::InvalidConfig(
                "parity shard count must be > 0".into(),
            ));
        }
        if data_shards + parity_shards > 255 {
            return Err(ErasureError::InvalidConfig(
                "total shard count must be <= 255".into(),
            ));
        }
        Ok(Self {
            data_shards,
            parity_shards,
        })
    }

    /// Number of data shards (k)
    #[must_use]
    pub const fn data_shards(&self) -> usize {
        self.data_shards
    }

    /// Number of parity shards (m)
    #[must_use]
    pub const fn parity_shards(&self) -> usize {
        self.parity_shards
    }

    /// Total number of shards (k + m)
    #[must_use]
    pub const fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    /// Length of each shard produced for a block of `block_len` bytes
    #[must_use]
    pub fn shard_len(&self, block_len: usize) -> usize {
        let per_shard = block_len.div_ceil(self.data_shards).max(1);
        per_shard.div_ceil(SHARD_ALIGN) * SHARD_ALIGN
    }

    /// Encode a block into k data shards followed by m parity shards
    ///
    /// The block is zero-padded to k equal shards; all returned shards
    /// have the same length and carry a crc32c checksum.
    pub fn encode(&self, block: &[u8]) -> Result<Vec<Shard>, ErasureError> {
        if block.is_empty() {
            return Err(ErasureError::EncodingFailed("empty block".into()));
        }

        let k = self.data_shards;
        let shard_len = self.shard_len(block.len());

        let mut padded = vec![0u8; shard_len * k];
        padded[..block.len()].copy_from_slice(block);

        let mut encoder = ReedSolomonEncoder::new(k, self.parity_shards, shard_len)
            .map_err(|e| ErasureError::InvalidConfig(e.to_string()))?;

        for chunk in padded.chunks_exact(shard_len) {
            encoder
                .add_original_shard(chunk)
                .map_err(|e| ErasureError::EncodingFailed(e.to_string()))?;
        }

        let result = encoder
            .encode()
            .map_err(|e| ErasureError::EncodingFailed(e.to_string()))?;

        let mut shards = Vec::with_capacity(self.total_shards());
        for (index, chunk) in padded.chunks_exact(shard_len).enumerate() {
            shards.push(Shard::data(index, chunk.to_vec()));
        }
        for (offset, parity) in result.recovery_iter().enumerate() {
            shards.push(Shard::parity(k + offset, parity.to_vec()));
        }

        Ok(shards)
    }

    /// Decode a block from its surviving shards
    ///
    /// `shards` holds one slot per shard position; `None` marks a shard
    /// that is missing or failed verification. At least k slots must be
    /// populated. The result is truncated to `block_len`, stripping the
    /// encoding padding.
    pub fn decode(
        &self,
        shards: &[Option<Vec<u8>>],
        block_len: usize,
    ) -> Result<Vec<u8>, ErasureError> {
        let k = self.data_shards;

        if shards.len() != self.total_shards() {
            return Err(ErasureError::ShardSizeMismatch);
        }

        let available = shards.iter().filter(|s| s.is_some()).count();
        if available < k {
            return Err(ErasureError::InsufficientShards {
                available,
                required: k,
            });
        }

        let shard_len = shards
            .iter()
            .find_map(|s| s.as_ref().map(Vec::len))
            .expect("at least k shards are present");
        if shards
            .iter()
            .flatten()
            .any(|s| s.len() != shard_len)
        {
            return Err(ErasureError::ShardSizeMismatch);
        }

        // Fast path: all data shards survived, no decoding required.
        if shards[..k].iter().all(Option::is_some) {
            let mut block = Vec::with_capacity(k * shard_len);
            for shard in shards.iter().take(k).flatten() {
                block.extend_from_slice(shard);
            }
            block.truncate(block_len);
            return Ok(block);
        }

        let mut decoder = ReedSolomonDecoder::new(k, self.parity_shards, shard_len)
            .map_err(|e| ErasureError::InvalidConfig(e.to_string()))?;

        for (index, shard) in shards.iter().take(k).enumerate() {
            if let Some(data) = shard {
                decoder
                    .add_original_shard(index, data)
                    .map_err(|e| ErasureError::DecodingFailed(e.to_string()))?;
            }
        }
        for (index, shard) in shards.iter().skip(k).enumerate() {
            if let Some(data) = shard {
                decoder
                    .add_recovery_shard(index, data)
                    .map_err(|e| ErasureError::DecodingFailed(e.to_string()))?;
            }
        }

        let result = decoder
            .decode()
            .map_err(|e| ErasureError::DecodingFailed(e.to_string()))?;

        let mut restored: Vec<Option<&[u8]>> = vec![None; k];
        for (index, data) in result.restored_original_iter() {
            restored[index] = Some(data);
        }

        let mut block = Vec::with_capacity(k * shard_len);
        for (index, shard) in shards.iter().take(k).enumerate() {
            match shard {
                Some(data) => block.extend_from_slice(data),
                None => {
                    let data = restored[index].ok_or_else(|| {
                        ErasureError::DecodingFailed(format!("shard {index} not restored"))
                    })?;
                    block.extend_from_slice(data);
                }
            }
        }

        block.truncate(block_len);
        Ok(block)
    }

    /// Verify a shard's payload against a recorded checksum
    #[must_use]
    pub fn verify(&self, shard: &[u8], checksum: u32) -> bool {
        compute_crc32c(shard) == checksum
    }
}
