//! One repository's sync, start to finish.
//!
//! [`RepoSync`] holds everything a single repository needs (client, store,
//! mirror, names and paths) and walks the fixed sequence:
//!
//! ```text
//! info → source mirror → issues → pulls → labels → milestones → releases → wiki mirror
//! ```
//!
//! Requests are strictly sequential. A parent item's document is written
//! only after all of its children, so a stored item always describes a
//! completely synced version and a crash mid-item just repeats that item on
//! the next run.

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::planner::{SyncDecision, document_id, plan};
use super::types::{MirrorStatus, ParentKind, RepoStats, ResourceKind, ResourceStats};
use crate::error::{Error, Result};
use crate::github::{GitHubClient, Paginator, document_url, endpoint};
use crate::mirror::{GitMirror, MirrorAction};
use crate::store::{RepoLayout, SnapshotStore};

/// Collections synced with children and incremental planning, in order.
const PARENT_ORDER: [ParentKind; 2] = [ParentKind::Issue, ParentKind::PullRequest];

/// Flat collections, always refetched, in order.
const FLAT_ORDER: [ResourceKind; 2] = [ResourceKind::Labels, ResourceKind::Milestones];

/// Which mirror a step maintains.
#[derive(Debug, Clone, Copy)]
enum MirrorTarget {
    Source,
    Wiki,
}

/// Context for syncing one repository.
pub struct RepoSync<'a> {
    client: &'a GitHubClient,
    store: &'a SnapshotStore,
    mirror: Option<&'a GitMirror>,
    api_url: &'a str,
    owner: &'a str,
    repo: &'a str,
    layout: RepoLayout,
}

impl<'a> RepoSync<'a> {
    /// Prepare a sync of `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the names could escape the
    /// snapshot root.
    pub fn new(
        client: &'a GitHubClient,
        store: &'a SnapshotStore,
        mirror: Option<&'a GitMirror>,
        api_url: &'a str,
        owner: &'a str,
        repo: &'a str,
    ) -> Result<Self> {
        let layout = store.repo(owner, repo)?;
        Ok(Self {
            client,
            store,
            mirror,
            api_url,
            owner,
            repo,
            layout,
        })
    }

    /// Run the full sequence.
    ///
    /// # Errors
    ///
    /// HTTP, document and filesystem errors abort this repository. Mirror
    /// failures do not; they are reported in the returned stats.
    #[instrument(name = "repo", skip(self), fields(owner = %self.owner, repo = %self.repo))]
    pub async fn run(&self) -> Result<RepoStats> {
        info!("Syncing repository");
        let mut stats = RepoStats::default();

        let repo_info = self.sync_info().await?;
        let has_issues = flag(&repo_info, "has_issues");
        let has_wiki = flag(&repo_info, "has_wiki");

        stats.source = self.sync_mirror(MirrorTarget::Source).await?;

        for kind in PARENT_ORDER {
            if kind == ParentKind::Issue && !has_issues {
                debug!("Issues disabled, skipping");
                continue;
            }
            self.sync_parents(kind, stats.resource_mut(kind.resource())).await?;
        }

        for kind in FLAT_ORDER {
            self.sync_flat(kind, stats.resource_mut(kind)).await?;
        }

        self.sync_parents(ParentKind::Release, &mut stats.releases).await?;

        stats.wiki = if has_wiki {
            self.sync_mirror(MirrorTarget::Wiki).await?
        } else {
            debug!("Wiki disabled, skipping");
            MirrorStatus::Skipped
        };

        info!(
            written = stats.total_written(),
            skipped = stats.total_skipped(),
            "Repository synced"
        );
        Ok(stats)
    }

    /// Fetch and store the repository document. Always refetched.
    async fn sync_info(&self) -> Result<Value> {
        let url = endpoint(self.api_url, &["repos", self.owner, self.repo])?;
        let repo_info = self.client.get_json(&url).await?;
        if !repo_info.is_object() {
            return Err(Error::malformed(url.as_str(), "repository info is not an object"));
        }

        self.store.write_document(&self.layout.info_path(), &repo_info)?;
        Ok(repo_info)
    }

    async fn sync_mirror(&self, target: MirrorTarget) -> Result<MirrorStatus> {
        let Some(mirror) = self.mirror else {
            return Ok(MirrorStatus::Skipped);
        };

        let result = match target {
            MirrorTarget::Source => {
                mirror
                    .sync_source(self.owner, self.repo, &self.layout.source_mirror_dir())
                    .await
            }
            MirrorTarget::Wiki => {
                mirror
                    .sync_wiki(self.owner, self.repo, &self.layout.wiki_mirror_dir())
                    .await
            }
        };

        match result {
            Ok(MirrorAction::Cloned) => Ok(MirrorStatus::Cloned),
            Ok(MirrorAction::Updated) => Ok(MirrorStatus::Updated),
            Err(e @ Error::Io(_)) => Err(e),
            Err(e) => {
                warn!(mirror = ?target, error = %e, "Mirror sync failed, continuing");
                Ok(MirrorStatus::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    /// Issues, pull requests or releases: plan each item, sync its
    /// children, then store it.
    async fn sync_parents(&self, kind: ParentKind, stats: &mut ResourceStats) -> Result<()> {
        let resource = kind.resource();
        info!(resource = %resource, "Syncing");

        let mut items = Paginator::new(self.client, self.collection_url(resource)?);
        while let Some(item) = items.next_item().await? {
            if !kind.accepts(&item) {
                continue;
            }
            stats.fetched += 1;

            let context = format!("{}/{}/{resource}", self.owner, self.repo);
            let id = document_id(&item, resource.id_field(), &context)?;
            let item_path = self.layout.item_path(resource, &id);

            let stored = self.store.read_document(&item_path)?;
            let decision = plan(kind, &item, stored.as_ref());
            debug!(resource = %resource, id = %id, decision = decision.as_str(), "Planned");

            let since = match &decision {
                SyncDecision::Skip => {
                    stats.skipped += 1;
                    continue;
                }
                SyncDecision::Full => {
                    stats.full += 1;
                    None
                }
                SyncDecision::Delta { since } => {
                    stats.delta += 1;
                    Some(since.as_str())
                }
            };

            stats.children += match kind {
                ParentKind::Issue | ParentKind::PullRequest => {
                    self.sync_comments(kind, &id, &item, since).await?
                }
                ParentKind::Release => self.sync_assets(&id, &item).await?,
            };

            if self.store.write_document(&item_path, &item)?.is_written() {
                stats.written += 1;
            }
        }

        info!(
            resource = %resource,
            fetched = stats.fetched,
            skipped = stats.skipped,
            full = stats.full,
            delta = stats.delta,
            "Synced"
        );
        Ok(())
    }

    /// Labels and milestones: store every document by id.
    async fn sync_flat(&self, kind: ResourceKind, stats: &mut ResourceStats) -> Result<()> {
        info!(resource = %kind, "Syncing");
        let context = format!("{}/{}/{kind}", self.owner, self.repo);

        let mut items = Paginator::new(self.client, self.collection_url(kind)?);
        while let Some(item) = items.next_item().await? {
            stats.fetched += 1;
            let id = document_id(&item, kind.id_field(), &context)?;
            if self
                .store
                .write_document(&self.layout.flat_path(kind, &id), &item)?
                .is_written()
            {
                stats.written += 1;
            }
        }

        info!(resource = %kind, fetched = stats.fetched, written = stats.written, "Synced");
        Ok(())
    }

    /// Store the comments of one issue or pull request, optionally only
    /// those changed since `since`. Returns how many files changed.
    async fn sync_comments(
        &self,
        kind: ParentKind,
        parent_id: &str,
        item: &Value,
        since: Option<&str>,
    ) -> Result<usize> {
        let resource = kind.resource();
        let context = format!("{}/{}/{resource}/{parent_id}", self.owner, self.repo);
        let mut written = 0;

        for field in kind.comment_url_fields() {
            let Some(raw) = item.get(*field).and_then(Value::as_str) else {
                continue;
            };
            let mut url = document_url(&context, raw)?;
            if let Some(since) = since {
                url.query_pairs_mut().append_pair("since", since);
            }

            let mut comments = Paginator::new(self.client, url);
            while let Some(comment) = comments.next_item().await? {
                let comment_id = document_id(&comment, "id", &context)?;
                let path = self.layout.comment_path(resource, parent_id, &comment_id);
                if self.store.write_document(&path, &comment)?.is_written() {
                    written += 1;
                }
            }
        }

        debug!(resource = %resource, id = %parent_id, written, "Comments stored");
        Ok(written)
    }

    /// Download every asset of a release with its metadata sidecar.
    /// Returns how many assets were stored.
    async fn sync_assets(&self, release_id: &str, release: &Value) -> Result<usize> {
        let context = format!("{}/{}/releases/{release_id}", self.owner, self.repo);
        let Some(assets) = release.get("assets").and_then(Value::as_array) else {
            return Ok(0);
        };

        for asset in assets {
            let name = asset
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::malformed(&context, "asset without `name`"))?;
            let raw = asset
                .get("browser_download_url")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::malformed(&context, format!("asset {name} without `browser_download_url`")))?;
            let url = document_url(&context, raw)?;

            let bytes = self
                .client
                .get_to_file(&url, &self.layout.asset_path(release_id, name))
                .await?;
            self.store
                .write_document(&self.layout.asset_meta_path(release_id, name), asset)?;
            info!(release = %release_id, asset = %name, bytes, "Asset stored");
        }

        Ok(assets.len())
    }

    /// `/repos/<owner>/<repo>/<resource>?state=all`.
    fn collection_url(&self, kind: ResourceKind) -> Result<Url> {
        let mut url = endpoint(self.api_url, &["repos", self.owner, self.repo, kind.endpoint()])?;
        url.query_pairs_mut().append_pair("state", "all");
        Ok(url)
    }
}

/// A boolean repository flag; absent or non-boolean means disabled.
fn flag(repo_info: &Value, name: &str) -> bool {
    repo_info.get(name).and_then(Value::as_bool).unwrap_or(false)
}
