//! Donut Storage - Disk and node layers
//!
//! A [`Disk`] is one mounted filesystem path offering root-confined
//! directory and file primitives; a [`Node`] is a named host holding an
//! ordered list of disks. Shard index `i` of every object block maps to
//! the disk at position `i`, so disk ordering is significant and stable.

pub mod disk;
pub mod fstype;
pub mod node;

pub use disk::{Disk, FsInfo};
pub use node::Node;
