//! Deterministic test doubles: an in-memory [`IssueStore`], a fixed clock, and
//! a sleeper that records instead of waiting.
//!
//! Compiled for this crate's own tests and for dependants that enable the
//! `test-support` feature.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::{
    Clock, Issue, IssueNumber, IssueState, IssueStore, OwnerName, Page, Repository,
    RepositoryName, Sleeper, StateFilter, StoreError, Timestamp, PAGE_SIZE,
};

/// The instant every test treats as "now": 2024-06-01T12:00:00Z.
pub fn fixed_now() -> Timestamp {
    Timestamp::from_utc(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid fixed time"),
    )
}

fn days_before_now(days: i64) -> Timestamp {
    Timestamp::from_utc(fixed_now().as_datetime() - chrono::Duration::days(days))
}

// ---------------------------------------------------------------------------
// Issue builder
// ---------------------------------------------------------------------------

/// Starts building an open, unlocked, unlabelled issue.
pub fn issue(number: u64) -> IssueBuilder {
    IssueBuilder(Issue {
        number: IssueNumber::new(number),
        state: IssueState::Open,
        locked: false,
        closed_at: None,
        updated_at: None,
        labels: BTreeSet::new(),
        title: format!("Issue #{number}"),
    })
}

#[derive(Debug, Clone)]
pub struct IssueBuilder(Issue);

impl IssueBuilder {
    pub fn locked(mut self) -> Self {
        self.0.locked = true;
        self
    }

    /// Marks the issue closed exactly `days` × 24 hours before [`fixed_now`].
    pub fn closed_days_ago(mut self, days: i64) -> Self {
        self.0.state = IssueState::Closed;
        self.0.closed_at = Some(days_before_now(days));
        self
    }

    pub fn updated_days_ago(mut self, days: i64) -> Self {
        self.0.updated_at = Some(days_before_now(days));
        self
    }

    pub fn label(mut self, name: &str) -> Self {
        self.0.labels.insert(name.to_string());
        self
    }

    pub fn build(self) -> Issue {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Clock and sleeper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Records every requested sleep and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeper lock").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeper lock").push(duration);
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A read issued against the [`FakeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListRepositories {
        owner: String,
        page: u32,
    },
    ListIssues {
        state: Option<StateFilter>,
        page: u32,
    },
    SearchIssues {
        query: String,
        page: u32,
    },
}

/// A mutation the [`FakeStore`] accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    AddLabel {
        owner: String,
        repo: String,
        number: u64,
        label: String,
    },
    SetState {
        owner: String,
        repo: String,
        number: u64,
        state: IssueState,
    },
    CreateComment {
        owner: String,
        repo: String,
        number: u64,
        body: String,
    },
    Lock {
        owner: String,
        repo: String,
        number: u64,
    },
}

impl Mutation {
    pub fn label(owner: &str, repo: &str, number: u64, label: &str) -> Self {
        Self::AddLabel {
            owner: owner.into(),
            repo: repo.into(),
            number,
            label: label.into(),
        }
    }

    pub fn close(owner: &str, repo: &str, number: u64) -> Self {
        Self::SetState {
            owner: owner.into(),
            repo: repo.into(),
            number,
            state: IssueState::Closed,
        }
    }

    pub fn comment(owner: &str, repo: &str, number: u64, body: &str) -> Self {
        Self::CreateComment {
            owner: owner.into(),
            repo: repo.into(),
            number,
            body: body.into(),
        }
    }

    pub fn lock(owner: &str, repo: &str, number: u64) -> Self {
        Self::Lock {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    repositories: HashMap<String, Vec<String>>,
    issues: HashMap<(String, String), Vec<Issue>>,
    search_results: HashMap<String, Vec<Issue>>,
    calls: Vec<StoreCall>,
    mutations: Vec<Mutation>,
    failures_remaining: u32,
}

/// An [`IssueStore`] held entirely in memory.
///
/// Listing honours an explicit state filter. Unlike GitHub, a listing with
/// no filter returns every stored issue, open or closed, so a test seeds
/// exactly the issues a directive should see. Results paginate with a
/// configurable page size. Accepted mutations are recorded and applied to the
/// stored issues so later listings observe them.
#[derive(Debug)]
pub struct FakeStore {
    page_size: usize,
    fail_reads: bool,
    state: Mutex<State>,
    attempts: AtomicU32,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            page_size: PAGE_SIZE as usize,
            fail_reads: false,
            state: Mutex::new(State::default()),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_repositories(mut self, owner: &str, names: &[&str]) -> Self {
        self.state_mut()
            .repositories
            .insert(owner.to_string(), names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_issues(mut self, owner: &str, repo: &str, issues: Vec<Issue>) -> Self {
        self.state_mut()
            .issues
            .insert((owner.to_string(), repo.to_string()), issues);
        self
    }

    /// Results returned for an exact search query string.
    pub fn with_search_results(mut self, query: &str, issues: Vec<Issue>) -> Self {
        self.state_mut()
            .search_results
            .insert(query.to_string(), issues);
        self
    }

    /// Every read fails with a transport error.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// The next `count` mutation attempts fail with a 502.
    pub fn failing_mutations(mut self, count: u32) -> Self {
        self.state_mut().failures_remaining = count;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.guard().calls.clone()
    }

    /// Accepted mutations, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.guard().mutations.clone()
    }

    /// Mutation attempts, failed ones included.
    pub fn mutation_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Current snapshot of one stored issue.
    pub fn issue(&self, owner: &str, repo: &str, number: u64) -> Option<Issue> {
        self.guard()
            .issues
            .get(&(owner.to_string(), repo.to_string()))
            .and_then(|issues| issues.iter().find(|i| i.number.as_u64() == number))
            .cloned()
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().expect("fake store lock")
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake store lock")
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let start = (page.max(1) as usize - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        let chunk = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
        let next_page = (end < items.len()).then_some(page + 1);
        Page {
            items: chunk,
            next_page,
        }
    }

    fn read(&self, call: StoreCall) -> Result<(), StoreError> {
        self.guard().calls.push(call);
        if self.fail_reads {
            return Err(StoreError::Http {
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(())
    }

    fn mutate(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        mutation: Mutation,
        apply: impl FnOnce(&mut Issue),
    ) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.guard();
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(StoreError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }
        if let Some(issue) = state
            .issues
            .get_mut(&(owner.to_string(), repo.to_string()))
            .and_then(|issues| issues.iter_mut().find(|i| i.number == number))
        {
            apply(issue);
        }
        state.mutations.push(mutation);
        Ok(())
    }
}

#[async_trait]
impl IssueStore for FakeStore {
    async fn list_repositories(
        &self,
        owner: &OwnerName,
        page: u32,
    ) -> Result<Page<Repository>, StoreError> {
        self.read(StoreCall::ListRepositories {
            owner: owner.to_string(),
            page,
        })?;
        let repositories: Vec<Repository> = self
            .guard()
            .repositories
            .get(owner.as_str())
            .into_iter()
            .flatten()
            .filter_map(|name| {
                RepositoryName::new(name.as_str()).map(|repo| Repository {
                    full_name: format!("{owner}/{repo}"),
                    name: repo,
                })
            })
            .collect();
        Ok(self.paginate(&repositories, page))
    }

    async fn list_issues(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        state: Option<StateFilter>,
        page: u32,
    ) -> Result<Page<Issue>, StoreError> {
        self.read(StoreCall::ListIssues { state, page })?;
        let filter = state.unwrap_or(StateFilter::All);
        let issues: Vec<Issue> = self
            .guard()
            .issues
            .get(&(owner.to_string(), repo.to_string()))
            .into_iter()
            .flatten()
            .filter(|issue| filter.matches(issue.state))
            .cloned()
            .collect();
        Ok(self.paginate(&issues, page))
    }

    async fn search_issues(&self, query: &str, page: u32) -> Result<Page<Issue>, StoreError> {
        self.read(StoreCall::SearchIssues {
            query: query.to_string(),
            page,
        })?;
        let issues = self
            .guard()
            .search_results
            .get(query)
            .cloned()
            .unwrap_or_default();
        Ok(self.paginate(&issues, page))
    }

    async fn add_label(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        label: &str,
    ) -> Result<(), StoreError> {
        let mutation = Mutation::label(owner.as_str(), repo.as_str(), number.as_u64(), label);
        self.mutate(owner, repo, number, mutation, |issue| {
            issue.labels.insert(label.to_string());
        })
    }

    async fn set_state(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        state: IssueState,
    ) -> Result<(), StoreError> {
        let mutation = Mutation::SetState {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number: number.as_u64(),
            state,
        };
        self.mutate(owner, repo, number, mutation, |issue| {
            issue.state = state;
            issue.closed_at = (state == IssueState::Closed).then(fixed_now);
        })
    }

    async fn create_comment(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        body: &str,
    ) -> Result<(), StoreError> {
        let mutation = Mutation::comment(owner.as_str(), repo.as_str(), number.as_u64(), body);
        self.mutate(owner, repo, number, mutation, |_| {})
    }

    async fn lock(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
    ) -> Result<(), StoreError> {
        let mutation = Mutation::lock(owner.as_str(), repo.as_str(), number.as_u64());
        self.mutate(owner, repo, number, mutation, |issue| issue.locked = true)
    }
}
