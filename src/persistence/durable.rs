//! Durable file writes.
//!
//! Ledger appends fsync the file. Whole-file outputs (roster documents,
//! standings reports) go through [`write_atomic`] so a reader sees either the
//! previous contents or the new ones, never a torn file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that entries created or renamed in it survive a power loss.
///
/// Only meaningful for directories, although `sync_all` accepts any handle.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces `path` with `bytes` atomically.
///
/// 1. Write to `<path>.tmp`
/// 2. fsync the temp file
/// 3. Rename over `<path>`
/// 4. fsync the parent directory
///
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);
    if let Some(parent) = &parent {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(bytes)?;
        fsync_file(&file)?;
    }

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = &parent {
        fsync_dir(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fsync_dir_works() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("race_log.csv")).unwrap();
        fsync_dir(dir.path()).unwrap();
    }

    #[test]
    fn fsync_dir_fails_on_nonexistent() {
        let result = fsync_dir(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_err());
    }

    #[test]
    fn write_atomic_replaces_contents_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("roster.json.tmp").exists());
    }

    #[test]
    fn write_atomic_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("standings.txt");

        write_atomic(&path, b"Rank").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Rank");
    }
}
