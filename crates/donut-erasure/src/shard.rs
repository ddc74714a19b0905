//! Shard type for erasure coded blocks

use bytes::Bytes;
use donut_common::checksum::{compute_crc32c, verify_crc32c};

/// A single shard of an erasure coded block
///
/// Shard `index` of every block of an object lands on the disk at the
/// same position, so the index doubles as the disk position.
#[derive(Clone, Debug)]
pub struct Shard {
    /// Position within the block (0..k for data, k..k+m for parity)
    pub index: usize,
    /// Whether this is a parity shard
    pub is_parity: bool,
    /// The shard payload
    pub data: Bytes,
    /// crc32c over the payload
    pub checksum: u32,
}

impl Shard {
    fn new(index: usize, data: Vec<u8>, is_parity: bool) -> Self {
        let checksum = compute_crc32c(&data);
        Self {
            index,
            is_parity,
            data: Bytes::from(data),
            checksum,
        }
    }

    /// Create a data shard
    #[must_use]
    pub fn data(index: usize, data: Vec<u8>) -> Self {
        Self::new(index, data, false)
    }

    /// Create a parity shard
    #[must_use]
    pub fn parity(index: usize, data: Vec<u8>) -> Self {
        Self::new(index, data, true)
    }

    /// Verify the shard payload against its checksum
    #[must_use]
    pub fn verify(&self) -> bool {
        verify_crc32c(&self.data, self.checksum)
    }

    /// Payload length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
