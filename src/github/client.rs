//! Rate-limited GitHub REST client.
//!
//! Every request carries the token and the v3 accept header. When a response
//! says the quota is exhausted, the client sleeps until the advertised reset
//! and tries exactly once more; callers never see that wait.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use super::rate_limit::{Sleeper, TokioSleeper, exhausted_rate_limit};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::store::temp_path;

/// Accept header for JSON documents.
pub const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Accept header for binary release assets.
pub const ACCEPT_BINARY: &str = "application/octet-stream";

/// Buffer size for streaming asset downloads.
const DOWNLOAD_BUFFER: usize = 8192;

/// A buffered response: status, headers and the full body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body is not valid JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// HTTP client that waits out exhausted rate-limit windows.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient").field("token", &"***").finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client authenticating with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the TLS backend cannot be initialised.
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("github-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            token: credentials.token().to_string(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace how the client waits for a rate-limit reset.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// GET `url` and buffer the body.
    ///
    /// Non-success statuses other than an exhausted rate limit are returned
    /// as-is for the caller to classify.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] if the quota is still exhausted after
    /// waiting once, or [`Error::Request`] on transport failure.
    pub async fn get(&self, url: &Url) -> Result<ApiResponse> {
        let response = self.send(url, ACCEPT_JSON).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// GET `url` and decode a JSON document, turning failures into typed
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`], [`Error::NotFound`], [`Error::Server`] or
    /// [`Error::Http`] for non-success statuses, and [`Error::Json`] if a
    /// success body is not JSON.
    pub async fn get_json(&self, url: &Url) -> Result<Value> {
        let response = self.get(url).await?;
        if !response.status.is_success() {
            return Err(Error::from_response(response.status, url.as_str(), &response.body));
        }
        response.json()
    }

    /// Stream `url` to `path`, returning the number of bytes written.
    ///
    /// The body goes to a temp file beside `path` in fixed-size chunks and is
    /// renamed into place only once complete.
    ///
    /// # Errors
    ///
    /// Returns a typed HTTP error for non-success statuses, or
    /// [`Error::Io`] / [`Error::Request`] if the transfer fails; no partial
    /// file is left behind.
    pub async fn get_to_file(&self, url: &Url, path: &Path) -> Result<u64> {
        let response = self.send(url, ACCEPT_BINARY).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(Error::from_response(status, url.as_str(), &body));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = temp_path(path);
        match download(response, &temp, path).await {
            Ok(written) => {
                debug!(path = %path.display(), bytes = written, "Downloaded");
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp).await;
                Err(e)
            }
        }
    }

    /// Send one GET, waiting out at most one exhausted rate-limit window.
    async fn send(&self, url: &Url, accept: &str) -> Result<reqwest::Response> {
        let mut waited = false;

        loop {
            debug!(%url, "GET");
            let response = self
                .http
                .get(url.clone())
                .header(AUTHORIZATION, format!("Bearer {}", self.token))
                .header(ACCEPT, accept)
                .send()
                .await?;

            let Some(limit) = exhausted_rate_limit(response.status(), response.headers()) else {
                return Ok(response);
            };

            if waited {
                return Err(Error::RateLimited {
                    url: url.to_string(),
                    reset_at: Some(limit.reset),
                });
            }

            let wait = limit.wait_duration(Utc::now());
            info!(
                seconds = wait.as_secs(),
                reset_at = ?limit.reset_at(),
                "Rate limit exhausted, waiting for reset"
            );
            self.sleeper.sleep(wait).await;
            waited = true;
        }
    }
}

async fn download(mut response: reqwest::Response, temp: &Path, path: &Path) -> Result<u64> {
    let file = tokio::fs::File::create(temp).await?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_BUFFER, file);
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    writer.get_ref().sync_all().await?;
    drop(writer);

    tokio::fs::rename(temp, path).await?;
    Ok(written)
}
