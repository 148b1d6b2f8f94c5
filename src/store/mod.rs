//! The on-disk snapshot.
//!
//! This module maps logical entities to files and writes them idempotently:
//!
//! - **Layout**: deterministic, collision-free paths ([`RepoLayout`])
//! - **Files**: write-to-temp-then-rename so readers never see half a document
//! - **Idempotence**: a file already holding the same bytes is not rewritten
//!
//! Documents are stored verbatim as received from the API, pretty-printed
//! with four-space indentation.

mod file;
mod layout;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, warn};

use crate::error::Result;
use crate::validate::{validate_owner, validate_repo_name};

pub use file::{atomic_write, read_if_exists, temp_path};
pub use layout::{ITEM_FILE, META_SUFFIX, RepoLayout};

/// What [`SnapshotStore::write_document`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No file existed.
    Created,
    /// The file existed with different content.
    Updated,
    /// The file already held exactly these bytes; nothing was written.
    Unchanged,
}

impl WriteOutcome {
    /// Whether bytes on disk changed.
    #[must_use]
    pub fn is_written(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Snapshot root and the document read/write primitives.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `root` (the `--dl-dir`).
    ///
    /// Nothing is created on disk until the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The snapshot root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Layout for one repository.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// either name could escape the snapshot root.
    pub fn repo(&self, owner: &str, repo: &str) -> Result<RepoLayout> {
        validate_owner(owner)?;
        validate_repo_name(repo)?;
        Ok(RepoLayout::new(&self.root, owner, repo))
    }

    /// Create `path` and its parents. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "Ensuring directory");
        fs::create_dir_all(path)?;
        Ok(())
    }

    /// Serialize `doc` and store it at `path`, replacing prior content.
    ///
    /// The write is atomic; if the file already holds identical bytes it is
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails.
    pub fn write_document<T: Serialize + ?Sized>(&self, path: &Path, doc: &T) -> Result<WriteOutcome> {
        let bytes = to_pretty_json(doc)?;
        let existing = read_if_exists(path)?;

        let outcome = match existing {
            None => WriteOutcome::Created,
            Some(ref old) if *old == bytes => WriteOutcome::Unchanged,
            Some(_) => WriteOutcome::Updated,
        };

        if outcome.is_written() {
            atomic_write(path, &bytes)?;
        }

        debug!(path = %path.display(), ?outcome, "Stored document");
        Ok(outcome)
    }

    /// Read a previously stored document.
    ///
    /// Returns `Ok(None)` when nothing is stored yet. A file that is not
    /// valid JSON is also reported as absent (with a warning) so the caller
    /// falls back to a full sync, which rewrites it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read.
    pub fn read_document(&self, path: &Path) -> Result<Option<Value>> {
        let Some(bytes) = read_if_exists(path)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Stored document is not valid JSON, treating as absent");
                Ok(None)
            }
        }
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(doc: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    doc.serialize(&mut serializer)?;
    Ok(bytes)
}
