//! Donut Erasure Coding
//!
//! Reed-Solomon coding over a (k data, m parity) scheme. A payload
//! block of at most the bucket's block size is cut into k equal shards
//! (zero-padded), m parity shards are computed, and any k intact shards
//! reconstruct the block.
//!
//! # Example
//!
//! ```
//! use donut_erasure::ErasureCodec;
//!
//! let codec = ErasureCodec::new(4, 2).unwrap();
//! let shards = codec.encode(b"Hello, World!").unwrap();
//! assert_eq!(shards.len(), 6);
//! ```

pub mod codec;
pub mod shard;

pub use codec::{ErasureCodec, ErasureError};
pub use shard::Shard;
