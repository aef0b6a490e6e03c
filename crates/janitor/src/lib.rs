//! Core domain for the issue janitor.
//!
//! Given a list of [`ConfigEntry`] values, the janitor walks every configured
//! repository, selects candidate issues for each [`Directive`], decides which
//! [`Action`]s apply, and applies them through a bounded [`RetryExecutor`].
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no HTTP itself.
//! The remote issue tracker is reached exclusively through the [`IssueStore`]
//! trait; the `github` crate supplies the production implementation.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`OwnerName`, `IssueNumber`, `RunId`, etc.) |
//! | [`types`] | Observed value types (`Issue`, `Repository`, `Timestamp`, `Page`) |
//! | [`config`] | Configuration entries and directives |
//! | [`errors`] | Run-level and store-level error types |
//! | [`store`] | The [`IssueStore`] port |
//! | [`selector`] | Candidate issue selection (listing or search) |
//! | [`evaluator`] | Pure per-issue directive evaluation |
//! | [`retry`] | Bounded retry with injectable backoff and sleep |
//! | [`orchestrator`] | Entries → repositories → directives → issues → actions |

pub mod config;
pub mod errors;
pub mod evaluator;
pub mod identifiers;
pub mod orchestrator;
pub mod retry;
pub mod selector;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{parse_config, ConfigEntry, Directive};
pub use errors::{JanitorError, StoreError};
pub use evaluator::{evaluate, Action};
pub use identifiers::{IssueNumber, OwnerName, RepositoryName, RunId};
pub use orchestrator::{Clock, Orchestrator, RunMode, RunSummary, SystemClock};
pub use retry::{Backoff, LinearBackoff, RetryExecutor, Sleeper, TokioSleeper};
pub use selector::select;
pub use store::{IssueStore, PAGE_SIZE};
pub use types::{Issue, IssueState, Page, Repository, StateFilter, Timestamp};
