//! Candidate issue selection.
//!
//! A directive with a `query` runs a repository-scoped search; any other
//! directive lists the repository's issues, filtered by `state` when set.
//! Every page is fetched before evaluation starts. Read failures are not
//! retried.

use std::future::Future;

use tracing::{debug, warn};

use crate::{
    Directive, Issue, IssueStore, JanitorError, OwnerName, Page, RepositoryName, StoreError,
};

/// Returns every candidate issue for `directive` in `owner/repo`, in the
/// order the store returned them.
pub async fn select(
    store: &dyn IssueStore,
    owner: &OwnerName,
    repo: &RepositoryName,
    directive: &Directive,
) -> Result<Vec<Issue>, JanitorError> {
    match directive.query() {
        Some(fragment) => {
            let query = search_query(fragment, owner, repo);
            let query = query.as_str();
            debug!(%owner, %repo, query, "Searching issues");
            collect_pages(&format!("searching issues in {owner}/{repo}"), move |page| {
                store.search_issues(query, page)
            })
            .await
        }
        None => {
            let state = directive.state;
            debug!(%owner, %repo, state = ?state, "Listing issues");
            collect_pages(&format!("listing issues in {owner}/{repo}"), move |page| {
                store.list_issues(owner, repo, state, page)
            })
            .await
        }
    }
}

/// Scopes a directive's search fragment to a single repository.
pub fn search_query(fragment: &str, owner: &OwnerName, repo: &RepositoryName) -> String {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        format!("repo:{owner}/{repo}")
    } else {
        format!("{fragment} repo:{owner}/{repo}")
    }
}

async fn collect_pages<T, F, Fut>(operation: &str, mut fetch: F) -> Result<Vec<T>, JanitorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, StoreError>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let Page {
            items: chunk,
            next_page,
        } = fetch(page)
            .await
            .map_err(|e| JanitorError::transport(operation, e))?;
        items.extend(chunk);
        match next_page {
            Some(next) if next > page => page = next,
            Some(next) => {
                warn!(operation, page, next, "Store pointed back to an earlier page; stopping");
                return Ok(items);
            }
            None => return Ok(items),
        }
    }
}
