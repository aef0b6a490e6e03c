//! `GithubClient` against a mock GitHub API.

use github::GithubClient;
use janitor::{
    IssueNumber, IssueState, IssueStore, OwnerName, RepositoryName, StateFilter, StoreError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ids() -> (OwnerName, RepositoryName) {
    (
        OwnerName::new("acme").unwrap(),
        RepositoryName::new("x").unwrap(),
    )
}

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new("test-token", &server.uri()).expect("client")
}

fn issue_json(number: u64, state: &str) -> serde_json::Value {
    json!({
        "number": number,
        "state": state,
        "locked": false,
        "title": format!("Issue {number}"),
        "closed_at": if state == "closed" { json!("2023-01-01T00:00:00Z") } else { json!(null) },
        "updated_at": "2023-06-01T00:00:00Z",
        "labels": []
    })
}

#[tokio::test]
async fn list_issues_sends_auth_state_and_page_size() {
    let server = MockServer::start().await;
    let (owner, repo) = ids();
    Mock::given(method("GET"))
        .and(path("/repos/acme/x/issues"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/vnd.github+json"))
        .and(query_param("state", "closed"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([issue_json(4, "closed")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .list_issues(&owner, &repo, Some(StateFilter::Closed), 1)
        .await
        .expect("page");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].number, IssueNumber::new(4));
    assert_eq!(page.items[0].state, IssueState::Closed);
    assert_eq!(page.next_page, None);
}

#[tokio::test]
async fn list_issues_without_state_uses_store_default() {
    let server = MockServer::start().await;
    let (owner, repo) = ids();
    Mock::given(method("GET"))
        .and(path("/repos/acme/x/issues"))
        .and(query_param_is_missing("state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .list_issues(&owner, &repo, None, 1)
        .await
        .expect("page");

    assert!(page.items.is_empty());
}

#[tokio::test]
async fn link_header_drives_next_page() {
    let server = MockServer::start().await;
    let (owner, _) = ids();
    let link = format!(
        r#"<{uri}/users/acme/repos?per_page=100&page=2>; rel="next", <{uri}/users/acme/repos?per_page=100&page=2>; rel="last""#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/users/acme/repos"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", link.as_str())
                .set_body_json(json!([{"name": "x", "full_name": "acme/x"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/acme/repos"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "y", "full_name": "acme/y"}])),
        )
        .mount(&server)
        .await;

    let github = client(&server);
    let first = github.list_repositories(&owner, 1).await.expect("page 1");
    assert_eq!(first.items[0].name.as_str(), "x");
    assert_eq!(first.next_page, Some(2));

    let second = github.list_repositories(&owner, 2).await.expect("page 2");
    assert_eq!(second.items[0].full_name, "acme/y");
    assert_eq!(second.next_page, None);
}

#[tokio::test]
async fn search_orders_by_creation_ascending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("q", "label:wontfix repo:acme/x"))
        .and(query_param("sort", "created"))
        .and(query_param("order", "asc"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "incomplete_results": false,
            "items": [issue_json(1, "open"), issue_json(2, "open")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .search_issues("label:wontfix repo:acme/x", 1)
        .await
        .expect("search");

    let numbers: Vec<u64> = page.items.iter().map(|i| i.number.as_u64()).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn search_follows_next_link() {
    let server = MockServer::start().await;
    let link = format!(
        r#"<{uri}/search/issues?q=is%3Aopen&page=2>; rel="next", <{uri}/search/issues?q=is%3Aopen&page=2>; rel="last""#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", link.as_str())
                .set_body_json(json!({"total_count": 2, "items": [issue_json(1, "open")]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"total_count": 2, "items": [issue_json(2, "open")]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let github = client(&server);
    let first = github.search_issues("is:open", 1).await.expect("page 1");
    assert_eq!(first.items[0].number, IssueNumber::new(1));
    assert_eq!(first.next_page, Some(2));

    let second = github.search_issues("is:open", 2).await.expect("page 2");
    assert_eq!(second.items[0].number, IssueNumber::new(2));
    assert_eq!(second.next_page, None);
}

#[tokio::test]
async fn mutations_hit_the_issue_endpoints() {
    let server = MockServer::start().await;
    let (owner, repo) = ids();
    let number = IssueNumber::new(7);

    Mock::given(method("POST"))
        .and(path("/repos/acme/x/issues/7/labels"))
        .and(body_json(json!({"labels": ["stale"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "stale"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/x/issues/7/comments"))
        .and(body_json(json!({"body": "Closing."})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/acme/x/issues/7"))
        .and(body_json(json!({"state": "closed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue_json(7, "closed")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/x/issues/7/lock"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let github = client(&server);
    github.add_label(&owner, &repo, number, "stale").await.expect("label");
    github
        .create_comment(&owner, &repo, number, "Closing.")
        .await
        .expect("comment");
    github
        .set_state(&owner, &repo, number, IssueState::Closed)
        .await
        .expect("close");
    github.lock(&owner, &repo, number).await.expect("lock");
}

#[tokio::test]
async fn error_status_carries_github_message() {
    let server = MockServer::start().await;
    let (owner, repo) = ids();
    Mock::given(method("PUT"))
        .and(path("/repos/acme/x/issues/3/lock"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Resource not accessible by integration",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .lock(&owner, &repo, IssueNumber::new(3))
        .await
        .expect_err("forbidden");

    assert_eq!(
        err,
        StoreError::Api {
            status: 403,
            message: "Resource not accessible by integration".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_listing_is_a_decode_error() {
    let server = MockServer::start().await;
    let (owner, repo) = ids();
    Mock::given(method("GET"))
        .and(path("/repos/acme/x/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_issues(&owner, &repo, None, 1)
        .await
        .expect_err("not json");

    assert!(matches!(err, StoreError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let (owner, repo) = ids();
    let github = GithubClient::new("t", "http://127.0.0.1:9").expect("client");

    let err = github
        .list_issues(&owner, &repo, None, 1)
        .await
        .expect_err("connection refused");

    assert!(matches!(err, StoreError::Http { .. }));
}
