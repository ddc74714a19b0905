//! Configuration types for donut
//!
//! The configuration covers the node identity, the disk roots and the
//! erasure coding scheme applied to newly created buckets. Buckets pin
//! their (k, m, block size) at creation time, so changing this
//! configuration never rewrites existing data.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default block size for newly created buckets (4 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Root configuration for a donut node
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DonutConfig {
    /// Node name (human-readable identifier)
    pub node_name: String,
    /// Disk root paths, in shard order
    pub disks: Vec<PathBuf>,
    /// Erasure scheme override. When absent the scheme is derived from
    /// the disk count: half data shards, half parity.
    pub erasure: Option<ErasureParams>,
    /// Payload block size for newly created buckets
    pub block_size: usize,
}

impl Default for DonutConfig {
    fn default() -> Self {
        Self {
            node_name: "localhost".to_string(),
            disks: Vec::new(),
            erasure: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Erasure coding parameters: k data shards, m parity shards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErasureParams {
    /// Number of data shards (k)
    pub data_shards: usize,
    /// Number of parity shards (m)
    pub parity_shards: usize,
}

impl ErasureParams {
    /// Create a new parameter pair
    #[must_use]
    pub const fn new(data_shards: usize, parity_shards: usize) -> Self {
        Self {
            data_shards,
            parity_shards,
        }
    }

    /// Derive the default scheme for a disk count: m = n/2 parity
    /// shards, the remainder data shards.
    #[must_use]
    pub const fn for_disk_count(disks: usize) -> Self {
        let parity = disks / 2;
        Self {
            data_shards: disks - parity,
            parity_shards: parity,
        }
    }

    /// Total number of shards (k + m)
    #[must_use]
    pub const fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }
}
