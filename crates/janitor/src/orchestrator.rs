//! Run orchestration.
//!
//! Processing is strictly sequential: entries → repositories → directives →
//! issues → actions. Directives run in declaration order and issues in the
//! order the store returned them. The first fatal error ends the run.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, Instrument};

use crate::{
    evaluate, select, Action, ConfigEntry, Directive, IssueNumber, IssueState, IssueStore,
    JanitorError, OwnerName, Page, Repository, RepositoryName, RetryExecutor, Timestamp,
};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Whether decided actions are sent to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Apply,
    /// Decide and log every action without issuing any mutation.
    DryRun,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub repositories: u64,
    pub issues_evaluated: u64,
    pub labels_added: u64,
    pub comments_created: u64,
    pub issues_closed: u64,
    pub issues_locked: u64,
}

impl RunSummary {
    fn record(&mut self, action: &Action) {
        match action {
            Action::AddLabel(_) => self.labels_added += 1,
            Action::Comment(_) => self.comments_created += 1,
            Action::Close => self.issues_closed += 1,
            Action::Lock => self.issues_locked += 1,
        }
    }

    /// Total number of actions taken (or, in a dry run, decided).
    pub fn actions(&self) -> u64 {
        self.labels_added + self.comments_created + self.issues_closed + self.issues_locked
    }
}

/// Drives a full run against one [`IssueStore`].
pub struct Orchestrator {
    store: Arc<dyn IssueStore>,
    executor: RetryExecutor,
    clock: Arc<dyn Clock>,
    mode: RunMode,
}

impl Orchestrator {
    /// Creates an orchestrator with the default retry policy and the system clock.
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self {
            store,
            executor: RetryExecutor::default(),
            clock: Arc::new(SystemClock),
            mode: RunMode::Apply,
        }
    }

    pub fn with_executor(mut self, executor: RetryExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Processes every entry in order.
    pub async fn run(&self, entries: &[ConfigEntry]) -> Result<RunSummary, JanitorError> {
        let mut summary = RunSummary::default();
        for entry in entries {
            self.run_entry(entry, &mut summary).await?;
        }
        Ok(summary)
    }

    /// Processes one entry: its explicit repositories, or every repository the
    /// owner has when none are listed.
    pub async fn run_entry(
        &self,
        entry: &ConfigEntry,
        summary: &mut RunSummary,
    ) -> Result<(), JanitorError> {
        let owner = OwnerName::new(entry.owner.trim())
            .ok_or_else(|| JanitorError::configuration("Every config entry must set `owner`"))?;

        if !entry.repos.is_empty() {
            for name in &entry.repos {
                let repo = RepositoryName::new(name.trim()).ok_or_else(|| {
                    JanitorError::configuration(format!(
                        "Config entry for `{owner}` lists an empty repository name"
                    ))
                })?;
                let repository = Repository {
                    full_name: format!("{owner}/{repo}"),
                    name: repo,
                };
                self.process_repository(&owner, &repository, &entry.directives, summary)
                    .await?;
            }
            return Ok(());
        }

        let mut page = 1;
        loop {
            let Page { items, next_page } = self
                .store
                .list_repositories(&owner, page)
                .await
                .map_err(|e| {
                    JanitorError::transport(format!("listing repositories of {owner}"), e)
                })?;

            for repository in items {
                self.process_repository(&owner, &repository, &entry.directives, summary)
                    .await?;
            }

            match next_page {
                Some(next) if next > page => page = next,
                _ => return Ok(()),
            }
        }
    }

    /// Applies each directive, in order, to one repository.
    pub async fn process_repository(
        &self,
        owner: &OwnerName,
        repository: &Repository,
        directives: &[Directive],
        summary: &mut RunSummary,
    ) -> Result<(), JanitorError> {
        let repo = &repository.name;
        info!(repository = %repository.full_name, "Processing repository");
        summary.repositories += 1;

        for (index, directive) in directives.iter().enumerate() {
            let span = info_span!("directive", %owner, %repo, index);
            self.apply_directive(owner, repo, directive, summary)
                .instrument(span)
                .await?;
        }
        Ok(())
    }

    async fn apply_directive(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        directive: &Directive,
        summary: &mut RunSummary,
    ) -> Result<(), JanitorError> {
        let issues = select(self.store.as_ref(), owner, repo, directive).await?;
        let now = self.clock.now();

        for issue in &issues {
            summary.issues_evaluated += 1;
            for action in evaluate(issue, directive, now) {
                self.apply(owner, repo, issue.number, &action).await?;
                summary.record(&action);
            }
        }
        Ok(())
    }

    async fn apply(
        &self,
        owner: &OwnerName,
        repo: &RepositoryName,
        number: IssueNumber,
        action: &Action,
    ) -> Result<(), JanitorError> {
        let dry_run = self.mode == RunMode::DryRun;
        let store = self.store.as_ref();

        match action {
            Action::AddLabel(label) => {
                info!(%owner, %repo, issue = %number, label = %label, dry_run, "Labeling issue");
                if dry_run {
                    return Ok(());
                }
                let label = label.as_str();
                self.executor
                    .execute(&format!("Labeling {owner}/{repo}#{number}"), move || {
                        store.add_label(owner, repo, number, label)
                    })
                    .await
            }
            Action::Comment(body) => {
                info!(%owner, %repo, issue = %number, dry_run, "Commenting on issue");
                if dry_run {
                    return Ok(());
                }
                let body = body.as_str();
                self.executor
                    .execute(&format!("Commenting on {owner}/{repo}#{number}"), move || {
                        store.create_comment(owner, repo, number, body)
                    })
                    .await
            }
            Action::Close => {
                info!(%owner, %repo, issue = %number, dry_run, "Closing issue");
                if dry_run {
                    return Ok(());
                }
                self.executor
                    .execute(&format!("Closing {owner}/{repo}#{number}"), move || {
                        store.set_state(owner, repo, number, IssueState::Closed)
                    })
                    .await
            }
            Action::Lock => {
                info!(%owner, %repo, issue = %number, dry_run, "Locking issue");
                if dry_run {
                    return Ok(());
                }
                self.executor
                    .execute(&format!("Locking {owner}/{repo}#{number}"), move || {
                        store.lock(owner, repo, number)
                    })
                    .await
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("executor", &self.executor)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_now, issue, FakeStore, FixedClock, Mutation, RecordingSleeper};
    use crate::{LinearBackoff, StateFilter};
    use tracing_test::traced_test;

    fn orchestrator(store: &Arc<FakeStore>) -> Orchestrator {
        Orchestrator::new(store.clone())
            .with_clock(Arc::new(FixedClock(fixed_now())))
            .with_executor(RetryExecutor::new(
                5,
                Box::new(LinearBackoff::default()),
                Arc::new(RecordingSleeper::default()),
            ))
    }

    fn entry(owner: &str, repos: &[&str], directives: Vec<Directive>) -> ConfigEntry {
        ConfigEntry {
            owner: owner.to_string(),
            repos: repos.iter().map(|r| r.to_string()).collect(),
            directives,
        }
    }

    #[tokio::test]
    async fn blank_owner_is_a_configuration_error() {
        let store = Arc::new(FakeStore::new());
        let err = orchestrator(&store)
            .run(&[entry("  ", &["x"], vec![Directive::default()])])
            .await
            .expect_err("blank owner");

        assert!(err.is_configuration());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn earlier_entries_run_before_a_bad_entry_aborts() {
        let store = Arc::new(
            FakeStore::new().with_issues("acme", "x", vec![issue(1).build()]),
        );
        let lock = Directive {
            lock: true,
            ..Directive::default()
        };

        let err = orchestrator(&store)
            .run(&[entry("acme", &["x"], vec![lock]), entry("", &[], vec![])])
            .await
            .expect_err("second entry is invalid");

        assert!(err.is_configuration());
        assert_eq!(store.mutations(), vec![Mutation::lock("acme", "x", 1)]);
    }

    #[tokio::test]
    #[traced_test]
    async fn progress_names_each_repository_by_full_name() {
        let store = Arc::new(FakeStore::new().with_repositories("acme", &["a", "b"]));

        orchestrator(&store)
            .run(&[
                entry("acme", &[], vec![Directive::default()]),
                entry("other", &["z"], vec![Directive::default()]),
            ])
            .await
            .expect("run");

        assert!(logs_contain("repository=acme/a"));
        assert!(logs_contain("repository=acme/b"));
        assert!(logs_contain("repository=other/z"));
    }

    #[tokio::test]
    async fn empty_repos_enumerates_every_repository_across_pages() {
        let store = Arc::new(
            FakeStore::new()
                .with_page_size(1)
                .with_repositories("acme", &["a", "b", "c"])
                .with_issues("acme", "a", vec![issue(1).build()])
                .with_issues("acme", "c", vec![issue(3).build()]),
        );
        let lock = Directive {
            lock: true,
            ..Directive::default()
        };

        let summary = orchestrator(&store)
            .run(&[entry("acme", &[], vec![lock])])
            .await
            .expect("run");

        assert_eq!(summary.repositories, 3);
        assert_eq!(
            store.mutations(),
            vec![Mutation::lock("acme", "a", 1), Mutation::lock("acme", "c", 3)]
        );
    }

    #[tokio::test]
    async fn directives_apply_in_declaration_order() {
        let store = Arc::new(FakeStore::new().with_issues(
            "acme",
            "x",
            vec![
                issue(1).updated_days_ago(100).build(),
                issue(2).updated_days_ago(1).build(),
            ],
        ));
        let directives = vec![
            Directive {
                days_not_updated: 90,
                label: Some("stale".into()),
                ..Directive::default()
            },
            Directive {
                close: true,
                close_comment: Some("Closing.".into()),
                state: Some(StateFilter::Open),
                ..Directive::default()
            },
        ];

        let summary = orchestrator(&store)
            .run(&[entry("acme", &["x"], directives)])
            .await
            .expect("run");

        assert_eq!(
            store.mutations(),
            vec![
                Mutation::label("acme", "x", 1, "stale"),
                Mutation::comment("acme", "x", 1, "Closing."),
                Mutation::close("acme", "x", 1),
                Mutation::comment("acme", "x", 2, "Closing."),
                Mutation::close("acme", "x", 2),
            ]
        );
        assert_eq!(summary.issues_evaluated, 4);
        assert_eq!(summary.labels_added, 1);
        assert_eq!(summary.comments_created, 2);
        assert_eq!(summary.issues_closed, 2);
        assert_eq!(summary.actions(), 5);
    }

    #[tokio::test]
    async fn dry_run_decides_but_never_mutates() {
        let store = Arc::new(FakeStore::new().with_issues("acme", "x", vec![issue(1).build()]));
        let directive = Directive {
            label: Some("stale".into()),
            lock: true,
            ..Directive::default()
        };

        let summary = orchestrator(&store)
            .with_mode(RunMode::DryRun)
            .run(&[entry("acme", &["x"], vec![directive])])
            .await
            .expect("run");

        assert!(store.mutations().is_empty());
        assert_eq!(summary.labels_added, 1);
        assert_eq!(summary.issues_locked, 1);
    }

    #[tokio::test]
    async fn permanent_mutation_failure_aborts_the_run() {
        let store = Arc::new(
            FakeStore::new()
                .with_issues("acme", "x", vec![issue(1).build(), issue(2).build()])
                .failing_mutations(u32::MAX),
        );
        let lock = Directive {
            lock: true,
            ..Directive::default()
        };

        let err = orchestrator(&store)
            .run(&[entry("acme", &["x"], vec![lock])])
            .await
            .expect_err("lock never succeeds");

        assert!(matches!(err, JanitorError::MutationError { attempts: 5, .. }));
        assert_eq!(store.mutation_attempts(), 5, "issue 2 is never attempted");
    }

    #[tokio::test]
    async fn repository_listing_failure_is_a_transport_error() {
        let store = Arc::new(FakeStore::new().failing_reads());

        let err = orchestrator(&store)
            .run(&[entry("acme", &[], vec![Directive::default()])])
            .await
            .expect_err("listing fails");

        assert!(matches!(err, JanitorError::TransportError { .. }));
    }
}
