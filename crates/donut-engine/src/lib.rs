//! Donut Engine - the erasure-coded object store core
//!
//! This crate implements the storage engine behind the driver surface:
//! - the deterministic on-disk bucket layout and key escaping
//! - replicated bucket and object metadata documents
//! - the object write/read pipeline (split, encode, fan out, verify,
//!   decode, stream)
//! - the [`Donut`] facade exposing bucket and object CRUD
//!
//! The facade performs no locking itself; the driver layer serializes
//! mutators with a single read/write lock.

pub mod donut;
pub mod layout;
pub mod metadata;
mod objects;

pub use donut::{Donut, ListObjectsResult};
pub use metadata::{BucketDocument, ObjectDocument};
