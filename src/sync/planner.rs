//! Incremental sync decisions.
//!
//! For each parent item the planner compares the freshly listed document
//! with the one stored by the last successful sync and picks the cheapest
//! correct action. The skip check runs before any child request is made.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::types::ParentKind;
use crate::error::{Error, Result};

/// What to do with one parent item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// Nothing stored yet, or the stored copy cannot be compared: fetch
    /// every child, then write the item.
    Full,
    /// Stored copy is at least as new: no further requests.
    Skip,
    /// Stored copy is older: fetch children changed since `since`, then
    /// write the item.
    Delta {
        /// The stored item's timestamp, passed verbatim as the `since` filter.
        since: String,
    },
}

impl SyncDecision {
    /// Short label for logs and statistics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Skip => "skip",
            Self::Delta { .. } => "delta",
        }
    }
}

/// Decide how to sync `incoming` given the previously stored copy.
///
/// Timestamps that are missing or unparseable on either side force a full
/// sync; a stored timestamp is never trusted over one we cannot compare.
#[must_use]
pub fn plan(kind: ParentKind, incoming: &Value, stored: Option<&Value>) -> SyncDecision {
    let Some(stored) = stored else {
        return SyncDecision::Full;
    };

    let Some((stored_raw, stored_at)) = last_modified(kind, stored) else {
        return SyncDecision::Full;
    };
    let Some((_, incoming_at)) = last_modified(kind, incoming) else {
        return SyncDecision::Full;
    };

    if incoming_at <= stored_at {
        SyncDecision::Skip
    } else if kind.supports_delta() {
        SyncDecision::Delta {
            since: stored_raw.to_string(),
        }
    } else {
        SyncDecision::Full
    }
}

/// The first present, parseable timestamp field of `doc` for `kind`, raw
/// and parsed.
#[must_use]
pub fn last_modified(kind: ParentKind, doc: &Value) -> Option<(&str, DateTime<FixedOffset>)> {
    kind.timestamp_fields().iter().find_map(|field| {
        let raw = doc.get(*field)?.as_str()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|at| (raw, at))
    })
}

/// The numeric key of `doc` under `field`, as a path component.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`] if the field is missing or not a
/// non-negative integer.
pub fn document_id(doc: &Value, field: &str, context: &str) -> Result<String> {
    doc.get(field)
        .and_then(Value::as_u64)
        .map(|id| id.to_string())
        .ok_or_else(|| Error::malformed(context, format!("missing numeric `{field}`")))
}
