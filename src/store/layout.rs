//! Deterministic snapshot paths.
//!
//! ```text
//! <dl-dir>/<owner>/<repo>/
//! ├── info                      repository document
//! ├── repo/                     git mirror of the source
//! ├── wiki/                     git mirror of the wiki
//! ├── issues/<number>/{item, <commentId>...}
//! ├── prs/<number>/{item, <commentId>...}
//! ├── labels/<id>
//! ├── milestones/<id>
//! └── releases/<id>/{item, <assetName>, <assetName>.meta}
//! ```
//!
//! Every path is a pure function of owner, repository, resource and ids, so
//! re-running a sync always lands on the same files.

use std::path::{Path, PathBuf};

use crate::sync::types::ResourceKind;
use crate::validate::sanitize_file_name;

/// File name of a parent item's own document.
pub const ITEM_FILE: &str = "item";

/// Suffix of an asset's metadata sidecar.
pub const META_SUFFIX: &str = ".meta";

/// Paths for one repository inside the snapshot root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    /// Layout rooted at `<dl_dir>/<owner>/<repo>`.
    ///
    /// Callers validate `owner` and `repo` first; see
    /// [`SnapshotStore::repo`](super::SnapshotStore::repo).
    #[must_use]
    pub fn new(dl_dir: &Path, owner: &str, repo: &str) -> Self {
        Self {
            root: dl_dir.join(owner).join(repo),
        }
    }

    /// `<dl-dir>/<owner>/<repo>`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The repository document.
    #[must_use]
    pub fn info_path(&self) -> PathBuf {
        self.root.join("info")
    }

    /// Bare mirror of the source repository.
    #[must_use]
    pub fn source_mirror_dir(&self) -> PathBuf {
        self.root.join("repo")
    }

    /// Bare mirror of the wiki.
    #[must_use]
    pub fn wiki_mirror_dir(&self) -> PathBuf {
        self.root.join("wiki")
    }

    /// Directory holding every document of a resource.
    #[must_use]
    pub fn resource_dir(&self, kind: ResourceKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// A flat resource document: `<resource>/<id>`.
    #[must_use]
    pub fn flat_path(&self, kind: ResourceKind, id: &str) -> PathBuf {
        self.resource_dir(kind).join(id)
    }

    /// Directory of a parent item: `<resource>/<parentId>`.
    #[must_use]
    pub fn item_dir(&self, kind: ResourceKind, parent_id: &str) -> PathBuf {
        self.resource_dir(kind).join(parent_id)
    }

    /// A parent item's own document: `<resource>/<parentId>/item`.
    #[must_use]
    pub fn item_path(&self, kind: ResourceKind, parent_id: &str) -> PathBuf {
        self.item_dir(kind, parent_id).join(ITEM_FILE)
    }

    /// A comment of a parent item: `<resource>/<parentId>/<commentId>`.
    #[must_use]
    pub fn comment_path(&self, kind: ResourceKind, parent_id: &str, comment_id: &str) -> PathBuf {
        self.item_dir(kind, parent_id).join(comment_id)
    }

    /// A release asset's binary payload: `releases/<releaseId>/<assetName>`.
    #[must_use]
    pub fn asset_path(&self, release_id: &str, asset_name: &str) -> PathBuf {
        self.item_dir(ResourceKind::Releases, release_id)
            .join(sanitize_file_name(asset_name))
    }

    /// A release asset's metadata: `releases/<releaseId>/<assetName>.meta`.
    #[must_use]
    pub fn asset_meta_path(&self, release_id: &str, asset_name: &str) -> PathBuf {
        let name = format!("{}{META_SUFFIX}", sanitize_file_name(asset_name));
        self.item_dir(ResourceKind::Releases, release_id).join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RepoLayout {
        RepoLayout::new(Path::new("/snap"), "octocat", "hello")
    }

    #[test]
    fn test_repository_level_paths() {
        let l = layout();
        assert_eq!(l.root(), Path::new("/snap/octocat/hello"));
        assert_eq!(l.info_path(), Path::new("/snap/octocat/hello/info"));
        assert_eq!(l.source_mirror_dir(), Path::new("/snap/octocat/hello/repo"));
        assert_eq!(l.wiki_mirror_dir(), Path::new("/snap/octocat/hello/wiki"));
    }

    #[test]
    fn test_flat_and_parent_paths() {
        let l = layout();
        assert_eq!(
            l.flat_path(ResourceKind::Labels, "208045946"),
            Path::new("/snap/octocat/hello/labels/208045946")
        );
        assert_eq!(
            l.item_path(ResourceKind::Pulls, "1347"),
            Path::new("/snap/octocat/hello/prs/1347/item")
        );
        assert_eq!(
            l.comment_path(ResourceKind::Issues, "12", "1"),
            Path::new("/snap/octocat/hello/issues/12/1")
        );
    }

    #[test]
    fn test_asset_paths() {
        let l = layout();
        assert_eq!(
            l.asset_path("5", "tool.zip"),
            Path::new("/snap/octocat/hello/releases/5/tool.zip")
        );
        assert_eq!(
            l.asset_meta_path("5", "tool.zip"),
            Path::new("/snap/octocat/hello/releases/5/tool.zip.meta")
        );
    }

    #[test]
    fn test_asset_named_item_does_not_collide() {
        let l = layout();
        assert_ne!(l.asset_path("5", "item"), l.item_path(ResourceKind::Releases, "5"));
    }

    #[test]
    fn test_asset_named_like_sidecar_does_not_collide() {
        let l = layout();
        assert_ne!(l.asset_path("5", "tool.zip.meta"), l.asset_meta_path("5", "tool.zip"));
        assert_ne!(l.asset_path("5", "_item"), l.asset_path("5", "item"));
    }
}
