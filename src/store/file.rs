//! Atomic file operations for the snapshot.
//!
//! This module provides safe file operations that prevent half-written
//! documents from ever being visible:
//! - Atomic writes: write to a temp file in the same directory, sync to
//!   disk, then rename over the target
//! - Reads that report "not there yet" as `None` instead of an error

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temp file path next to `path`.
///
/// Same directory so the final rename never crosses a filesystem; hidden
/// and uniquely suffixed so a crashed run never leaves something that looks
/// like a real document.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "snapshot".into(), |n| n.to_string_lossy());
    let temp_name = format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple());
    path.with_file_name(temp_name)
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file beside the target
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched and the
/// temp file is removed.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    let result = write_and_rename(&temp, path, content);
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_and_rename(temp: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    {
        let file = File::create(temp)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(temp, path)
}

/// Read a file, returning `None` if it does not exist.
///
/// # Errors
///
/// Returns an error for anything other than "not found".
pub fn read_if_exists(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("item");

        atomic_write(&path, b"{\"id\": 1}").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"id\": 1}");
    }

    #[test]
    fn test_atomic_write_creates_parents_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues").join("7").join("item");

        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("label");

        atomic_write(&path, b"x").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("label")]);
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let path = Path::new("/snap/o/r/releases/1/tool.tar.gz");
        let temp = temp_path(path);
        assert_eq!(temp.parent(), path.parent());
        let name = temp.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".tool.tar.gz."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_read_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing");
        assert!(read_if_exists(&path).unwrap().is_none());

        fs::write(&path, b"here").unwrap();
        assert_eq!(read_if_exists(&path).unwrap().unwrap(), b"here");
    }
}
