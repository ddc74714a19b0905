//! Donut Driver - the contract an HTTP/S3 surface consumes
//!
//! The [`Driver`] trait is the public operation table: bucket CRUD,
//! object put/get/list, and the multipart family (stubbed as not
//! implemented). [`DonutDriver`] implements it over a [`donut_engine::Donut`],
//! adding name/ACL validation before any I/O and a single read/write
//! lock that serializes mutators against readers.
//!
//! [`start`] wires a driver from disk root paths: one path becomes a
//! synthetic 16-disk layout beneath it, several paths become one disk
//! each.

pub mod donut;
pub mod driver;
pub mod resources;

pub use donut::{start, start_with_config, DonutDriver};
pub use driver::{BucketMetadata, Driver, ObjectMetadata};
pub use resources::{is_bucket_acl_request, BucketResources, ObjectResources};
