//! Node: a named host holding an ordered list of disks

use crate::disk::Disk;
use donut_common::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

/// A named host contributing an ordered list of disks
///
/// Disk ordering is significant: shard index `i` always maps to the
/// disk at position `i`, and positions never change for the lifetime of
/// the node.
#[derive(Debug)]
pub struct Node {
    name: String,
    disks: Vec<Disk>,
}

impl Node {
    /// Create a node by opening every disk path, in order
    pub fn new(name: impl Into<String>, disk_paths: &[PathBuf]) -> Result<Self> {
        let name = name.into();
        if disk_paths.is_empty() {
            return Err(Error::invalid_argument(format!(
                "node {name:?} has no disks"
            )));
        }
        let mut disks = Vec::with_capacity(disk_paths.len());
        for path in disk_paths {
            disks.push(Disk::open(path)?);
        }
        debug!(node = %name, disks = disks.len(), "opened node disks");
        Ok(Self { name, disks })
    }

    /// The node name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node's disks, in shard order
    #[must_use]
    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    /// Number of disks on this node
    #[must_use]
    pub fn disk_count(&self) -> usize {
        self.disks.len()
    }
}

#[cfg(test)]
#[cfg(target_os = "linux")]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_node_opens_disks_in_order() {
        let dir = tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..4)
            .map(|i| {
                let p = dir.path().join(i.to_string());
                std::fs::create_dir_all(&p).unwrap();
                p
            })
            .collect();

        let node = Node::new("localhost", &paths).unwrap();
        assert_eq!(node.name(), "localhost");
        assert_eq!(node.disk_count(), 4);
        for (i, disk) in node.disks().iter().enumerate() {
            assert!(disk.path().ends_with(i.to_string()));
        }
    }

    #[test]
    fn test_node_requires_disks() {
        assert!(Node::new("localhost", &[]).is_err());
    }

    #[test]
    fn test_node_fails_on_missing_disk() {
        let dir = tempdir().unwrap();
        let paths = vec![dir.path().join("nope")];
        assert!(Node::new("localhost", &paths).is_err());
    }
}
