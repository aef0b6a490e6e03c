//! The GitHub REST client.

use std::time::Duration;

use async_trait::async_trait;
use janitor::{
    Issue, IssueNumber, IssueState, IssueStore, OwnerName, Page, Repository, RepositoryName,
    StateFilter, StoreError, PAGE_SIZE,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::pagination::next_page;
use crate::wire::{
    AddLabelsRequest, CommentRequest, EditStateRequest, GithubErrorBody, GithubIssue,
    GithubRepository, SearchResponse,
};

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Failure to construct a [`GithubClient`].
#[derive(Debug, Error)]
pub enum GithubClientError {
    #[error("GitHub token is empty")]
    MissingToken,

    #[error("GitHub token contains characters not allowed in a header")]
    InvalidToken,

    #[error("Failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// An authenticated GitHub REST client.
///
/// The token and base URL are fixed at construction; the client is shared
/// read-only for the whole run.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    /// Creates a client for `api_base` (e.g. [`DEFAULT_API_URL`] or a GitHub
    /// Enterprise `https://host/api/v3`).
    pub fn new(token: &str, api_base: &str) -> Result<Self, GithubClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GithubClientError::MissingToken);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GithubClientError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static("issue-janitor/0.1"));
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn issue_url(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        suffix: &str,
    ) -> String {
        self.url(&format!("/repos/{owner}/{repo}/issues/{number}{suffix}"))
    }

    /// Sends a request and maps transport failures and non-success statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await.map_err(|e| StoreError::Http {
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GithubErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetches one page and decodes its body, returning the next page number.
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<(T, Option<u32>), StoreError> {
        let request = self
            .http
            .get(self.url(path))
            .query(query)
            .query(&[("per_page", PAGE_SIZE), ("page", page)]);

        let response = self.send(request).await?;
        let next = next_page(response.headers());
        let body = response.json::<T>().await.map_err(|e| StoreError::Decode {
            message: e.to_string(),
        })?;
        debug!(path, page, next_page = ?next, "Fetched page");
        Ok((body, next))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        body: &B,
    ) -> Result<(), StoreError> {
        self.send(self.http.request(method, url).json(body))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl IssueStore for GithubClient {
    async fn list_repositories(
        &self,
        owner: &OwnerName,
        page: u32,
    ) -> Result<Page<Repository>, StoreError> {
        let (repos, next_page) = self
            .get_page::<Vec<GithubRepository>>(&format!("/users/{owner}/repos"), &[], page)
            .await?;
        let items = repos
            .into_iter()
            .map(Repository::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, next_page })
    }

    async fn list_issues(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        state: Option<StateFilter>,
        page: u32,
    ) -> Result<Page<Issue>, StoreError> {
        let query: Vec<(&str, String)> = state
            .map(|s| ("state", s.as_str().to_string()))
            .into_iter()
            .collect();
        let (issues, next_page) = self
            .get_page::<Vec<GithubIssue>>(&format!("/repos/{owner}/{repo}/issues"), &query, page)
            .await?;
        Ok(Page {
            items: issues.into_iter().map(Issue::from).collect(),
            next_page,
        })
    }

    async fn search_issues(&self, query: &str, page: u32) -> Result<Page<Issue>, StoreError> {
        let params = [
            ("q", query.to_string()),
            ("sort", "created".to_string()),
            ("order", "asc".to_string()),
        ];
        let (results, next_page) = self
            .get_page::<SearchResponse>("/search/issues", &params, page)
            .await?;
        Ok(Page {
            items: results.items.into_iter().map(Issue::from).collect(),
            next_page,
        })
    }

    async fn add_label(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), StoreError> {
        let url = self.issue_url(owner, repo, number, "/labels");
        self.send_json(Method::POST, url, &AddLabelsRequest { labels: [label] })
            .await
    }

    async fn set_state(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        state: IssueState,
    ) -> Result<(), StoreError> {
        let url = self.issue_url(owner, repo, number, "");
        let body = EditStateRequest {
            state: state.as_str(),
        };
        self.send_json(Method::PATCH, url, &body).await
    }

    async fn create_comment(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        body: &str,
    ) -> Result<(), StoreError> {
        let url = self.issue_url(owner, repo, number, "/comments");
        self.send_json(Method::POST, url, &CommentRequest { body })
            .await
    }

    async fn lock(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
    ) -> Result<(), StoreError> {
        // No lock reason is sent; GitHub still requires an explicit empty body.
        let request = self
            .http
            .put(self.issue_url(owner, repo, number, "/lock"))
            .header(CONTENT_LENGTH, 0);
        self.send(request).await.map(|_| ())
    }
}
