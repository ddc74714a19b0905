//! Donut Common - Shared types and utilities
//!
//! This crate provides the validated name types, the public error
//! taxonomy, checksum/digest helpers and configuration used across all
//! donut components.

pub mod checksum;
pub mod config;
pub mod error;
pub mod types;

pub use checksum::Md5Digest;
pub use config::DonutConfig;
pub use error::{Error, Result};
pub use types::*;
