//! Value types observed from the remote issue store.
//!
//! The janitor never persists any of these. Every run derives its decisions
//! fresh from what the store returns and the wall-clock time.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IssueNumber, RepositoryName};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Number of whole 24-hour periods between `self` and `now`.
    ///
    /// Partial days are truncated toward zero. A timestamp in the future of
    /// `now` yields a non-positive count.
    pub fn days_since(self, now: Timestamp) -> i64 {
        now.0.signed_duration_since(self.0).num_days()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Issue state
// ---------------------------------------------------------------------------

/// Current state of a single issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// The wire value used by the store (`"open"` / `"closed"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State filter applied when listing issues for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    Open,
    Closed,
    All,
}

impl StateFilter {
    /// The wire value used by the store (`"open"`, `"closed"`, `"all"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }

    /// Returns `true` if an issue in `state` passes this filter.
    pub fn matches(self, state: IssueState) -> bool {
        match self {
            Self::All => true,
            Self::Open => state == IssueState::Open,
            Self::Closed => state == IssueState::Closed,
        }
    }
}

impl std::fmt::Display for StateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Issues and repositories
// ---------------------------------------------------------------------------

/// An issue snapshot as returned by the store for one selection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: IssueNumber,
    pub state: IssueState,
    pub locked: bool,
    /// `None` for issues that have never been closed.
    pub closed_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    /// Label names currently applied to the issue.
    pub labels: BTreeSet<String>,
    pub title: String,
}

impl Issue {
    /// Returns `true` if a label with exactly this name is applied.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }
}

/// A repository to process, either listed in config or found by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: RepositoryName,
    /// `"owner/name"` form, used to name the repository in progress output.
    pub full_name: String,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of results from a paginated store operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page number to request next; `None` once the final page has been returned.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// A page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}
