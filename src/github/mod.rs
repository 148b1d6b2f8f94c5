//! GitHub REST API access.
//!
//! - [`GitHubClient`]: authenticated GET with transparent rate-limit waits
//! - [`Paginator`]: lazy walk over `page`/`per_page` collections
//! - [`rate_limit`]: quota header parsing and the injectable [`Sleeper`]

pub mod client;
pub mod pagination;
pub mod rate_limit;

use reqwest::Url;

use crate::error::{Error, Result};

pub use client::{ACCEPT_BINARY, ACCEPT_JSON, ApiResponse, GitHubClient};
pub use pagination::{PAGE_SIZE, Paginator};
pub use rate_limit::{RateLimitInfo, Sleeper, TokioSleeper};

/// Build `<base>/<segments...>`, percent-encoding each segment.
///
/// # Errors
///
/// Returns [`Error::Config`] if `base` is not a URL that can carry a path.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::Config(format!("Invalid API URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| Error::Config(format!("API URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Parse a URL the API handed us inside a document.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`] if `raw` is not a valid URL.
pub fn document_url(context: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::malformed(context, format!("invalid URL {raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let url = endpoint("https://api.github.com", &["repos", "octocat", "hello", "issues"]).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/octocat/hello/issues");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = endpoint("https://ghe.example.com/api/v3", &["users", "octocat", "repos"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/users/octocat/repos");
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(endpoint("not a url", &["x"]).is_err());
    }

    #[test]
    fn test_document_url() {
        assert!(document_url("issue 1", "https://api.github.com/x").is_ok());
        assert!(matches!(
            document_url("issue 1", "::"),
            Err(Error::MalformedDocument { .. })
        ));
    }
}
