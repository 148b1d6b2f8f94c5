//! Page-number pagination over collection endpoints.
//!
//! GitHub collections are walked with `page=1,2,3,…` and a fixed
//! `per_page`. A page shorter than the page size is the last one, so a
//! collection of exactly `n * PAGE_SIZE` items costs one extra, empty
//! request.

use std::collections::VecDeque;

use reqwest::Url;
use serde_json::Value;
use tracing::info;

use super::client::GitHubClient;
use crate::error::{Error, Result};

/// Items requested per page.
pub const PAGE_SIZE: usize = 100;

/// Lazy, finite sequence of the items of one collection.
///
/// Pages are fetched on demand; the sequence cannot be restarted.
pub struct Paginator<'a> {
    client: &'a GitHubClient,
    url: Url,
    next_page: u32,
    buffer: VecDeque<Value>,
    done: bool,
}

impl<'a> Paginator<'a> {
    /// Walk the collection at `url`, keeping its other query parameters.
    #[must_use]
    pub fn new(client: &'a GitHubClient, url: Url) -> Self {
        Self {
            client,
            url,
            next_page: 1,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// The next item, fetching another page when the buffer runs dry.
    ///
    /// # Errors
    ///
    /// Returns the client's typed error for a failed page, or
    /// [`Error::MalformedDocument`] if a page is not a JSON array.
    pub async fn next_item(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if self.done {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Drain the remaining items.
    ///
    /// # Errors
    ///
    /// See [`Paginator::next_item`].
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await? {
            items.push(item);
        }
        Ok(items)
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let url = page_url(&self.url, self.next_page);
        info!(page = self.next_page, url = %self.url, "Fetching page");

        let page = match self.client.get_json(&url).await? {
            Value::Array(items) => items,
            other => {
                return Err(Error::malformed(
                    url.as_str(),
                    format!("expected a JSON array page, got {}", json_kind(&other)),
                ));
            }
        };

        if page.len() < PAGE_SIZE {
            self.done = true;
        }
        self.next_page += 1;
        self.buffer.extend(page);
        Ok(())
    }
}

/// `url` with `per_page` and `page` set, replacing any existing values.
#[must_use]
pub fn page_url(url: &Url, page: u32) -> Url {
    let mut paged = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page" && k != "per_page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    paged
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("per_page", &PAGE_SIZE.to_string())
        .append_pair("page", &page.to_string());
    paged
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
