//! Sync types: resource kinds and run statistics.
//!
//! Every synchronized collection is a [`ResourceKind`]; the three that own
//! children (issues, pull requests, releases) are also a [`ParentKind`],
//! which carries the fields the planner keys on.

use std::fmt;

use serde::Serialize;

/// A collection endpoint of a repository and its directory in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `/issues`, with pull requests filtered out.
    Issues,
    /// `/pulls`.
    Pulls,
    /// `/labels`.
    Labels,
    /// `/milestones`.
    Milestones,
    /// `/releases`.
    Releases,
}

impl ResourceKind {
    /// Path segment of the collection endpoint under `/repos/<owner>/<repo>/`.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Pulls => "pulls",
            Self::Labels => "labels",
            Self::Milestones => "milestones",
            Self::Releases => "releases",
        }
    }

    /// Directory name under `<dl-dir>/<owner>/<repo>/`.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Pulls => "prs",
            Self::Labels => "labels",
            Self::Milestones => "milestones",
            Self::Releases => "releases",
        }
    }

    /// Field holding the stable key of each document.
    #[must_use]
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Issues | Self::Pulls => "number",
            Self::Labels | Self::Milestones | Self::Releases => "id",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// A resource whose items own children and are synced incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    /// Issues own issue comments.
    Issue,
    /// Pull requests own issue comments and review comments.
    PullRequest,
    /// Releases own binary assets.
    Release,
}

impl ParentKind {
    /// The collection this parent is listed from.
    #[must_use]
    pub const fn resource(self) -> ResourceKind {
        match self {
            Self::Issue => ResourceKind::Issues,
            Self::PullRequest => ResourceKind::Pulls,
            Self::Release => ResourceKind::Releases,
        }
    }

    /// Timestamp fields compared between runs, first present wins.
    ///
    /// Draft releases have a null `published_at`, so releases fall back to
    /// `created_at`.
    #[must_use]
    pub const fn timestamp_fields(self) -> &'static [&'static str] {
        match self {
            Self::Issue | Self::PullRequest => &["updated_at"],
            Self::Release => &["published_at", "created_at"],
        }
    }

    /// Whether children can be fetched with a `since` filter.
    ///
    /// Comment listings support it; release assets do not.
    #[must_use]
    pub const fn supports_delta(self) -> bool {
        matches!(self, Self::Issue | Self::PullRequest)
    }

    /// Item fields holding comment collection URLs.
    #[must_use]
    pub const fn comment_url_fields(self) -> &'static [&'static str] {
        match self {
            Self::Issue | Self::PullRequest => &["comments_url", "review_comments_url"],
            Self::Release => &[],
        }
    }

    /// Whether a listed document belongs to this kind.
    ///
    /// The issues endpoint also returns pull requests, marked by a
    /// `pull_request` field; those are left to the pulls pass.
    #[must_use]
    pub fn accepts(self, document: &serde_json::Value) -> bool {
        match self {
            Self::Issue => document.get("pull_request").is_none(),
            Self::PullRequest | Self::Release => true,
        }
    }
}

/// Per-resource statistics for one repository.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStats {
    /// Documents listed by the API (after filtering).
    pub fetched: usize,
    /// Parent items already up to date; no further requests made.
    pub skipped: usize,
    /// Parent items synced with all children.
    pub full: usize,
    /// Parent items synced with children changed since the last run.
    pub delta: usize,
    /// Documents whose bytes on disk changed.
    pub written: usize,
    /// Comments or assets written.
    pub children: usize,
}

impl ResourceStats {
    /// Whether anything on disk changed for this resource.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.written > 0 || self.children > 0
    }
}

/// Outcome of maintaining one git mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MirrorStatus {
    /// Not attempted: disabled by configuration or by repository metadata.
    Skipped,
    /// Freshly cloned, then fetched.
    Cloned,
    /// Existing mirror fetched.
    Updated,
    /// Clone or fetch failed; the rest of the repository still synced.
    Failed {
        /// Redacted error message.
        error: String,
    },
}

impl MirrorStatus {
    /// Whether this mirror attempt failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Statistics for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoStats {
    /// Issues; `None` when the repository has issues disabled.
    pub issues: Option<ResourceStats>,
    /// Pull requests.
    pub pulls: ResourceStats,
    /// Labels.
    pub labels: ResourceStats,
    /// Milestones.
    pub milestones: ResourceStats,
    /// Releases.
    pub releases: ResourceStats,
    /// Source mirror outcome.
    pub source: MirrorStatus,
    /// Wiki mirror outcome.
    pub wiki: MirrorStatus,
}

impl Default for RepoStats {
    fn default() -> Self {
        Self {
            issues: None,
            pulls: ResourceStats::default(),
            labels: ResourceStats::default(),
            milestones: ResourceStats::default(),
            releases: ResourceStats::default(),
            source: MirrorStatus::Skipped,
            wiki: MirrorStatus::Skipped,
        }
    }
}

impl RepoStats {
    /// Mutable stats slot for a resource. Issues are enabled on first use.
    pub fn resource_mut(&mut self, kind: ResourceKind) -> &mut ResourceStats {
        match kind {
            ResourceKind::Issues => self.issues.get_or_insert_with(ResourceStats::default),
            ResourceKind::Pulls => &mut self.pulls,
            ResourceKind::Labels => &mut self.labels,
            ResourceKind::Milestones => &mut self.milestones,
            ResourceKind::Releases => &mut self.releases,
        }
    }

    /// Total parent items skipped as up to date.
    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.issues.as_ref().map_or(0, |s| s.skipped) + self.pulls.skipped + self.releases.skipped
    }

    /// Total documents and children written.
    #[must_use]
    pub fn total_written(&self) -> usize {
        [
            self.issues.as_ref(),
            Some(&self.pulls),
            Some(&self.labels),
            Some(&self.milestones),
            Some(&self.releases),
        ]
        .into_iter()
        .flatten()
        .map(|s| s.written + s.children)
        .sum()
    }
}

/// One repository that synced.
#[derive(Debug, Clone, Serialize)]
pub struct RepoReport {
    /// Owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// What happened.
    #[serde(flatten)]
    pub stats: RepoStats,
}

/// One repository that failed during an owner-wide run.
#[derive(Debug, Clone, Serialize)]
pub struct RepoFailure {
    /// Owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Machine-readable error code.
    pub code: String,
    /// Error message.
    pub error: String,
}

/// Result of a whole run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    /// Repositories that synced.
    pub repositories: Vec<RepoReport>,
    /// Repositories that failed and were skipped.
    pub failures: Vec<RepoFailure>,
}

impl RunReport {
    /// Number of repositories attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.repositories.len() + self.failures.len()
    }

    /// Whether every attempted repository synced.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_dirs() {
        assert_eq!(ResourceKind::Pulls.endpoint(), "pulls");
        assert_eq!(ResourceKind::Pulls.dir_name(), "prs");
        assert_eq!(ResourceKind::Issues.id_field(), "number");
        assert_eq!(ResourceKind::Releases.id_field(), "id");
    }

    #[test]
    fn test_issue_kind_filters_pull_requests() {
        let issue = json!({"number": 1});
        let pr = json!({"number": 2, "pull_request": {"url": "x"}});
        assert!(ParentKind::Issue.accepts(&issue));
        assert!(!ParentKind::Issue.accepts(&pr));
        assert!(ParentKind::PullRequest.accepts(&pr));
    }

    #[test]
    fn test_release_is_not_delta_capable() {
        assert!(ParentKind::Issue.supports_delta());
        assert!(!ParentKind::Release.supports_delta());
        assert_eq!(
            ParentKind::Release.timestamp_fields(),
            &["published_at", "created_at"]
        );
    }

    #[test]
    fn test_repo_stats_resource_mut_enables_issues() {
        let mut stats = RepoStats::default();
        assert!(stats.issues.is_none());
        stats.resource_mut(ResourceKind::Issues).skipped = 2;
        stats.resource_mut(ResourceKind::Pulls).skipped = 1;
        stats.resource_mut(ResourceKind::Labels).written = 4;
        assert_eq!(stats.total_skipped(), 3);
        assert_eq!(stats.total_written(), 4);
    }

    #[test]
    fn test_mirror_status_serializes_tagged() {
        let failed = MirrorStatus::Failed {
            error: "boom".to_string(),
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value, json!({"status": "failed", "error": "boom"}));
        assert!(failed.is_failed());
        assert!(!MirrorStatus::Cloned.is_failed());
    }

    #[test]
    fn test_run_report() {
        let mut report = RunReport::default();
        assert!(report.is_success());
        report.failures.push(RepoFailure {
            owner: "o".into(),
            repo: "r".into(),
            code: "NOT_FOUND".into(),
            error: "Not found".into(),
        });
        assert_eq!(report.total(), 1);
        assert!(!report.is_success());
    }
}
