//! Root-confined disk access
//!
//! A [`Disk`] wraps one mounted directory. Every path a caller supplies
//! is joined under the disk root; absolute paths and parent-directory
//! components are rejected, so no higher layer can escape the mount.

use crate::fstype::{fs_type_string, stat_fs};
use donut_common::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

/// Filesystem usage information for a disk
#[derive(Debug, Clone)]
pub struct FsInfo {
    /// Filesystem type tag (e.g. "EXT4", "XFS")
    pub fs_type: String,
    /// Total bytes on the filesystem
    pub total_bytes: u64,
    /// Free bytes on the filesystem
    pub free_bytes: u64,
    /// Human-readable total (e.g. "2.00 GB")
    pub total: String,
    /// Human-readable free space
    pub free: String,
}

/// One mounted filesystem path holding shard files
#[derive(Debug, Clone)]
pub struct Disk {
    root: PathBuf,
    fs_type: &'static str,
}

impl Disk {
    /// Open a disk rooted at `path`
    ///
    /// The path must exist, be a directory and reside on a recognized
    /// filesystem.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if root.as_os_str().is_empty() {
            return Err(Error::invalid_argument("disk path is empty"));
        }

        let meta = fs::metadata(&root)?;
        if !meta.is_dir() {
            return Err(Error::NotADirectory {
                path: root.display().to_string(),
            });
        }

        let stat = stat_fs(&root)?;
        let fs_type = fs_type_string(stat.fs_magic);
        if fs_type == "UNKNOWN" {
            return Err(Error::UnsupportedFilesystem {
                fs_type: format!("{:#x}", stat.fs_magic),
            });
        }

        Ok(Self { root, fs_type })
    }

    /// The disk root path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The filesystem type tag captured at open time
    #[must_use]
    pub fn fs_type(&self) -> &str {
        self.fs_type
    }

    /// Report filesystem usage
    ///
    /// Recomputed on every call; free space changes underneath us.
    pub fn stat_fs(&self) -> Result<FsInfo> {
        let stat = stat_fs(&self.root)?;
        Ok(FsInfo {
            fs_type: self.fs_type.to_string(),
            total_bytes: stat.total_bytes,
            free_bytes: stat.free_bytes,
            total: format_bytes(stat.total_bytes),
            free: format_bytes(stat.free_bytes),
        })
    }

    /// Create a directory (and parents) under the disk root, mode 0700.
    /// Idempotent.
    pub fn make_dir(&self, rel: impl AsRef<Path>) -> Result<()> {
        let path = self.resolve(rel.as_ref())?;
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&path)?;
        Ok(())
    }

    /// List only the directory entries under a relative path
    ///
    /// Entry names are returned; non-directories are silently skipped.
    pub fn list_dirs(&self, rel: impl AsRef<Path>) -> Result<Vec<String>> {
        self.list_entries(rel.as_ref(), true)
    }

    /// List only the regular-file entries under a relative path
    pub fn list_files(&self, rel: impl AsRef<Path>) -> Result<Vec<String>> {
        self.list_entries(rel.as_ref(), false)
    }

    /// Create a file under the disk root, creating parent directories as
    /// needed. The file is opened write-only with mode 0600.
    pub fn create_file(&self, rel: impl AsRef<Path>) -> Result<File> {
        let rel = rel.as_ref();
        if rel.as_os_str().is_empty() {
            return Err(Error::invalid_argument("file path is empty"));
        }
        let path = self.resolve(rel)?;

        if let Some(parent) = path.parent() {
            let mut builder = fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            builder.mode(0o700);
            builder.create(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        Ok(options.open(&path)?)
    }

    /// Open a file under the disk root read-only
    pub fn open_file(&self, rel: impl AsRef<Path>) -> Result<File> {
        let rel = rel.as_ref();
        if rel.as_os_str().is_empty() {
            return Err(Error::invalid_argument("file path is empty"));
        }
        let path = self.resolve(rel)?;
        Ok(File::open(&path)?)
    }

    /// Remove a directory tree under the disk root, if present
    pub fn remove_dir_all(&self, rel: impl AsRef<Path>) -> Result<()> {
        let rel = rel.as_ref();
        if rel.as_os_str().is_empty() {
            return Err(Error::invalid_argument("directory path is empty"));
        }
        let path = self.resolve(rel)?;
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a directory exists under the disk root
    pub fn dir_exists(&self, rel: impl AsRef<Path>) -> Result<bool> {
        let path = self.resolve(rel.as_ref())?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_entries(&self, rel: &Path, dirs: bool) -> Result<Vec<String>> {
        let path = self.resolve(rel)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let keep = if dirs {
                file_type.is_dir()
            } else {
                file_type.is_file()
            };
            if keep {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// Join a caller-supplied path under the disk root. Absolute paths
    /// and parent-directory components never resolve.
    fn resolve(&self, rel: &Path) -> Result<PathBuf> {
        if rel.is_absolute() {
            return Err(Error::invalid_argument(format!(
                "absolute path not allowed: {}",
                rel.display()
            )));
        }
        for component in rel.components() {
            if matches!(component, Component::ParentDir | Component::Prefix(_)) {
                return Err(Error::invalid_argument(format!(
                    "path escapes disk root: {}",
                    rel.display()
                )));
            }
        }
        Ok(self.root.join(rel))
    }
}

/// Render a byte count the way humans read it ("2.00 GB", "52 B")
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;
    match bytes {
        b if b > TB => format!("{:.2} TB", b as f64 / TB as f64),
        b if b > GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b > MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b > KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

#[cfg(test)]
#[cfg(target_os = "linux")]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    #[test]
    fn test_open_rejects_empty_path() {
        match Disk::open("") {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_open_rejects_file_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plain-file");
        fs::write(&file_path, b"x").unwrap();
        match Disk::open(&file_path) {
            Err(Error::NotADirectory { .. }) => {}
            other => panic!("expected NotADirectory, got {other:?}"),
        }
    }

    #[test]
    fn test_open_missing_path_is_io() {
        let dir = tempdir().unwrap();
        assert!(Disk::open(dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_stat_fs() {
        let dir = tempdir().unwrap();
        let disk = Disk::open(dir.path()).unwrap();
        let info = disk.stat_fs().unwrap();
        assert!(!info.fs_type.is_empty());
        assert!(info.total_bytes > 0);
        assert!(!info.total.is_empty());
    }

    #[test]
    fn test_make_dir_and_listers() {
        let dir = tempdir().unwrap();
        let disk = Disk::open(dir.path()).unwrap();

        disk.make_dir("a/b").unwrap();
        disk.make_dir("a/b").unwrap(); // idempotent
        let mut f = disk.create_file("a/file.bin").unwrap();
        f.write_all(b"payload").unwrap();
        drop(f);

        let dirs = disk.list_dirs("a").unwrap();
        assert_eq!(dirs, vec!["b".to_string()]);
        let files = disk.list_files("a").unwrap();
        assert_eq!(files, vec!["file.bin".to_string()]);

        // Root listing works with an empty relative path
        let root_dirs = disk.list_dirs("").unwrap();
        assert_eq!(root_dirs, vec!["a".to_string()]);
    }

    #[test]
    fn test_create_and_open_file_round_trip() {
        let dir = tempdir().unwrap();
        let disk = Disk::open(dir.path()).unwrap();

        let mut f = disk.create_file("x/y/z.dat").unwrap();
        f.write_all(b"shard bytes").unwrap();
        f.sync_all().unwrap();
        drop(f);

        let mut buf = Vec::new();
        disk.open_file("x/y/z.dat").unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"shard bytes");
    }

    #[test]
    fn test_empty_file_paths_rejected() {
        let dir = tempdir().unwrap();
        let disk = Disk::open(dir.path()).unwrap();
        assert!(disk.create_file("").is_err());
        assert!(disk.open_file("").is_err());
    }

    #[test]
    fn test_root_confinement() {
        let dir = tempdir().unwrap();
        let disk = Disk::open(dir.path()).unwrap();
        assert!(disk.open_file("/etc/passwd").is_err());
        assert!(disk.create_file("../escape").is_err());
        assert!(disk.make_dir("a/../../escape").is_err());
    }

    #[test]
    fn test_open_file_absent() {
        let dir = tempdir().unwrap();
        let disk = Disk::open(dir.path()).unwrap();
        assert!(disk.open_file("missing").is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(52), "52 B");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.00 GB");
        assert_eq!(format_bytes(1536 * 1024), "1.50 MB");
    }
}
