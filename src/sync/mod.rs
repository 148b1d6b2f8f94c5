//! Repository synchronization.
//!
//! This module turns remote GitHub state into the local snapshot:
//!
//! - **Planning**: per parent item, skip / full / delta ([`planner`])
//! - **Repository sync**: the fixed per-repository sequence ([`RepoSync`])
//! - **Archiver**: one repository, or every repository of an owner
//!
//! # Failure model
//!
//! A single-repository run returns the first error. An owner-wide run
//! records each failed repository and moves on, unless the error is fatal
//! ([`Error::is_fatal`]): local filesystem failures and rejected
//! credentials (401) stop the run immediately. A 403 on one repository is
//! recorded like any other failure.
//!
//! # Example
//!
//! ```ignore
//! use ghdl::config::{ArchiveConfig, Credentials};
//! use ghdl::sync::Archiver;
//!
//! let config = ArchiveConfig::new(Credentials::new("me", token), "octocat")
//!     .with_dl_dir("/srv/archive");
//! let report = Archiver::new(config)?.run().await?;
//! println!("{} repositories synced", report.repositories.len());
//! ```

pub mod planner;
mod repository;
pub mod types;

use tracing::{error, info};

use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use crate::github::{GitHubClient, Paginator, endpoint};
use crate::mirror::GitMirror;
use crate::store::SnapshotStore;

pub use planner::{SyncDecision, plan};
pub use repository::RepoSync;
pub use types::{
    MirrorStatus, ParentKind, RepoFailure, RepoReport, RepoStats, ResourceKind, ResourceStats,
    RunReport,
};

/// Drives whole archive runs for one configuration.
#[derive(Debug)]
pub struct Archiver {
    config: ArchiveConfig,
    client: GitHubClient,
    store: SnapshotStore,
    mirror: Option<GitMirror>,
}

impl Archiver {
    /// Validate `config` and build a client for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] or [`Error::Config`] for a bad
    /// configuration, or [`Error::Request`] if the HTTP client cannot be
    /// built.
    pub fn new(config: ArchiveConfig) -> Result<Self> {
        let client = GitHubClient::new(&config.credentials)?;
        Self::with_client(config, client)
    }

    /// Validate `config` and use an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] or [`Error::Config`] for a bad
    /// configuration.
    pub fn with_client(config: ArchiveConfig, client: GitHubClient) -> Result<Self> {
        config.validate()?;

        let store = SnapshotStore::new(config.dl_dir.clone());
        let mirror = config
            .mirror_git
            .then(|| GitMirror::new(config.git_url.clone(), config.credentials.clone()));

        Ok(Self {
            config,
            client,
            store,
            mirror,
        })
    }

    /// Sync the configured repository, or every repository of the owner.
    ///
    /// # Errors
    ///
    /// See [`Archiver::sync_repository`] and [`Archiver::sync_owner`].
    pub async fn run(&self) -> Result<RunReport> {
        let owner = self.config.owner.as_str();
        match self.config.repo.as_deref() {
            Some(repo) => {
                let report = self.sync_repository(owner, repo).await?;
                Ok(RunReport {
                    repositories: vec![report],
                    failures: Vec::new(),
                })
            }
            None => self.sync_owner(owner).await,
        }
    }

    /// Sync one repository.
    ///
    /// # Errors
    ///
    /// Returns the first HTTP, document or filesystem error. Mirror
    /// failures are reported in the stats instead.
    pub async fn sync_repository(&self, owner: &str, repo: &str) -> Result<RepoReport> {
        let sync = RepoSync::new(
            &self.client,
            &self.store,
            self.mirror.as_ref(),
            &self.config.api_url,
            owner,
            repo,
        )?;
        let stats = sync.run().await?;

        Ok(RepoReport {
            owner: owner.to_string(),
            repo: repo.to_string(),
            stats,
        })
    }

    /// Sync every repository listed under `/users/<owner>/repos`.
    ///
    /// Repositories are listed lazily and synced one at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing itself fails or a repository fails
    /// fatally. Other per-repository failures are collected in the report.
    pub async fn sync_owner(&self, owner: &str) -> Result<RunReport> {
        let url = endpoint(&self.config.api_url, &["users", owner, "repos"])?;
        let mut listing = Paginator::new(&self.client, url);
        let mut report = RunReport::default();

        while let Some(repo_doc) = listing.next_item().await? {
            let repo = repo_doc
                .get("name")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| Error::malformed(format!("users/{owner}/repos"), "repository without `name`"))?;

            match self.sync_repository(owner, repo).await {
                Ok(repo_report) => report.repositories.push(repo_report),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(owner, repo, error = %e, "Repository sync failed, continuing");
                    report.failures.push(RepoFailure {
                        owner: owner.to_string(),
                        repo: repo.to_string(),
                        code: e.error_code().as_str().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            owner,
            synced = report.repositories.len(),
            failed = report.failures.len(),
            "Owner sync finished"
        );
        Ok(report)
    }
}
