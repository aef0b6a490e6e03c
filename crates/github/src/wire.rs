//! GitHub REST payloads and their conversion into janitor domain types.

use chrono::{DateTime, Utc};
use janitor::{Issue, IssueNumber, IssueState, Repository, RepositoryName, StoreError, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct GithubLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubIssue {
    pub number: u64,
    pub state: String,
    #[serde(default)]
    pub locked: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    #[serde(default)]
    pub title: String,
}

impl From<GithubIssue> for Issue {
    fn from(issue: GithubIssue) -> Self {
        Issue {
            number: IssueNumber::new(issue.number),
            state: if issue.state.eq_ignore_ascii_case("closed") {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            locked: issue.locked,
            closed_at: issue.closed_at.map(Timestamp::from_utc),
            updated_at: issue.updated_at.map(Timestamp::from_utc),
            labels: issue.labels.into_iter().map(|label| label.name).collect(),
            title: issue.title,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubRepository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
}

impl TryFrom<GithubRepository> for Repository {
    type Error = StoreError;

    fn try_from(repo: GithubRepository) -> Result<Self, Self::Error> {
        let name = RepositoryName::new(repo.name).ok_or_else(|| StoreError::Decode {
            message: "repository with an empty name".to_string(),
        })?;
        Ok(Repository {
            full_name: repo.full_name,
            name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<GithubIssue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubErrorBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddLabelsRequest<'a> {
    pub labels: [&'a str; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct EditStateRequest {
    pub state: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_issue_payload() {
        let raw = serde_json::json!({
            "number": 12,
            "state": "closed",
            "locked": false,
            "title": "Crash on start",
            "closed_at": "2023-01-02T03:04:05Z",
            "updated_at": "2023-01-03T00:00:00Z",
            "labels": [{"name": "bug"}, {"name": "stale"}],
            "user": {"login": "someone"}
        });
        let issue: Issue = serde_json::from_value::<GithubIssue>(raw).unwrap().into();

        assert_eq!(issue.number, IssueNumber::new(12));
        assert_eq!(issue.state, IssueState::Closed);
        assert!(issue.has_label("stale"));
        assert_eq!(issue.closed_at.unwrap().to_string(), "2023-01-02T03:04:05+00:00");
    }

    #[test]
    fn open_issue_without_timestamps() {
        let raw = serde_json::json!({
            "number": 1,
            "state": "open",
            "closed_at": null,
            "updated_at": null
        });
        let issue: Issue = serde_json::from_value::<GithubIssue>(raw).unwrap().into();

        assert_eq!(issue.state, IssueState::Open);
        assert!(!issue.locked);
        assert!(issue.closed_at.is_none());
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn repository_requires_a_name() {
        let repo = GithubRepository {
            name: String::new(),
            full_name: "acme/".to_string(),
        };
        assert!(Repository::try_from(repo).is_err());
    }
}
