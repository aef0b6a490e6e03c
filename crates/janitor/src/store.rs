//! The remote issue store port.
//!
//! Everything the janitor knows about the issue tracker goes through
//! [`IssueStore`]. Implementations own authentication, pagination wire details,
//! and rate-limit handling; the domain sees only pages and errors.

use async_trait::async_trait;

use crate::{
    Issue, IssueNumber, IssueState, OwnerName, Page, Repository, RepositoryName, StateFilter,
    StoreError,
};

/// Page size requested from every paginated operation.
pub const PAGE_SIZE: u32 = 100;

/// Paginated reads and single-issue mutations against a code-hosting platform.
///
/// Page numbers start at 1. A returned [`Page::next_page`] of `None` ends
/// pagination.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Lists repositories owned by `owner`.
    async fn list_repositories(
        &self,
        owner: &OwnerName,
        page: u32,
    ) -> Result<Page<Repository>, StoreError>;

    /// Lists issues in a repository. `None` sends no filter and leaves the
    /// choice to the store; GitHub then returns open issues.
    async fn list_issues(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        state: Option<StateFilter>,
        page: u32,
    ) -> Result<Page<Issue>, StoreError>;

    /// Runs an issue search, ordered by creation time ascending.
    async fn search_issues(&self, query: &str, page: u32) -> Result<Page<Issue>, StoreError>;

    async fn add_label(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), StoreError>;

    async fn set_state(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        state: IssueState,
    ) -> Result<(), StoreError>;

    async fn create_comment(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        body: &str,
    ) -> Result<(), StoreError>;

    async fn lock(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
    ) -> Result<(), StoreError>;
}
