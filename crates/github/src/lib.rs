//! GitHub infrastructure adapter for the issue janitor.
//!
//! Implements [`janitor::IssueStore`] against the GitHub REST API with
//! [`reqwest`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! Authentication, API versioning headers, `Link`-header pagination, and the
//! mapping of HTTP failures onto [`janitor::StoreError`] live here; the
//! [`janitor`] crate never sees them.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list repositories | `GET /users/{owner}/repos` |
//! | list issues | `GET /repos/{owner}/{repo}/issues?state=` |
//! | search issues | `GET /search/issues?q=&sort=created&order=asc` |
//! | add label | `POST /repos/{owner}/{repo}/issues/{n}/labels` |
//! | set state | `PATCH /repos/{owner}/{repo}/issues/{n}` |
//! | comment | `POST /repos/{owner}/{repo}/issues/{n}/comments` |
//! | lock | `PUT /repos/{owner}/{repo}/issues/{n}/lock` |
//!
//! All listing requests ask for `per_page=100`.

mod client;
mod pagination;
mod wire;

pub use client::{GithubClient, GithubClientError, DEFAULT_API_URL};
pub use pagination::next_page;
