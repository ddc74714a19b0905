//! Filesystem type detection
//!
//! The disk layer only accepts paths backed by a recognized filesystem.
//! On Linux the type is read from `statfs(2)` and matched against the
//! magic-number table below; other platforms report the syscall as
//! unsupported and disks cannot be opened there.

use std::io;
use std::path::Path;

/// Raw filesystem statistics as reported by the kernel
#[derive(Debug, Clone, Copy)]
pub struct RawFsStat {
    /// Filesystem type magic
    pub fs_magic: i64,
    /// Total bytes on the filesystem
    pub total_bytes: u64,
    /// Free bytes on the filesystem
    pub free_bytes: u64,
}

/// Map a statfs magic number to a filesystem type tag
///
/// Unrecognized magics map to `"UNKNOWN"`, which the disk layer refuses.
#[must_use]
pub fn fs_type_string(fs_magic: i64) -> &'static str {
    match fs_magic {
        0x0137d => "EXT",
        0x0ef51 => "EXT2OLD",
        0x0ef53 => "EXT4",
        0x58465342 => "XFS",
        0x9123683e => "BTRFS",
        0x2fc12fc1 => "ZFS",
        0xf2f52010 => "F2FS",
        0x52654973 => "REISERFS",
        0x01021994 => "TMPFS",
        0x858458f6 => "RAMFS",
        0x794c7630 => "OVERLAYFS",
        0x61756673 => "AUFS",
        0x6969 => "NFS",
        0x01021997 => "V9FS",
        0xff534d42 => "CIFS",
        0xf15f => "ECRYPTFS",
        0x5346544e => "NTFS",
        0x4d44 => "MSDOS",
        0x4244 => "HFS",
        _ => "UNKNOWN",
    }
}

/// Query filesystem statistics for a path
#[cfg(target_os = "linux")]
pub fn stat_fs(path: &Path) -> io::Result<RawFsStat> {
    use std::os::unix::ffi::OsStrExt;

    let path_cstr = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: statfs is a plain C struct of integers, valid when zeroed.
    let mut stat: libc::statfs = unsafe { std::mem::zeroed() };
    // SAFETY: path_cstr is a valid NUL-terminated string and stat is a
    // valid mutable reference for the syscall to fill in.
    let rc = unsafe { libc::statfs(path_cstr.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let bsize = stat.f_bsize as u64;
    Ok(RawFsStat {
        // Magics fit in u32; go through it so 32-bit targets do not
        // sign-extend the high-bit ones (e.g. BTRFS).
        fs_magic: stat.f_type as u32 as i64,
        total_bytes: bsize * stat.f_blocks as u64,
        free_bytes: bsize * stat.f_bfree as u64,
    })
}

#[cfg(not(target_os = "linux"))]
pub fn stat_fs(_path: &Path) -> io::Result<RawFsStat> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "filesystem statistics are only supported on Linux",
    ))
}
