//! Per-issue directive evaluation.
//!
//! [`evaluate`] is a pure function of the issue snapshot, the directive, and
//! the time it is given. It decides *what* should happen; the orchestrator
//! applies the resulting [`Action`]s in order.

use crate::{Directive, Issue, Timestamp};

/// A single mutation decided for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    AddLabel(String),
    Comment(String),
    Close,
    Lock,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddLabel(label) => write!(f, "label {label:?}"),
            Self::Comment(_) => f.write_str("comment"),
            Self::Close => f.write_str("close"),
            Self::Lock => f.write_str("lock"),
        }
    }
}

/// Decides which actions `directive` applies to `issue` at time `now`.
///
/// Locked issues are never touched. The age predicates compare whole days with
/// strict less-than, so an issue closed exactly `N` days ago satisfies
/// `days_closed = N`. A missing timestamp never blocks a directive. When a
/// directive both comments and closes, the comment comes first so it is posted
/// while the issue is still open.
pub fn evaluate(issue: &Issue, directive: &Directive, now: Timestamp) -> Vec<Action> {
    if issue.locked {
        return Vec::new();
    }
    if younger_than(issue.closed_at, directive.days_closed, now) {
        return Vec::new();
    }
    if younger_than(issue.updated_at, directive.days_not_updated, now) {
        return Vec::new();
    }

    let mut actions = Vec::new();

    if let Some(label) = directive.label() {
        if !issue.has_label(label) {
            actions.push(Action::AddLabel(label.to_string()));
        }
    }

    if directive.close && !issue.is_closed() {
        if let Some(body) = directive.close_comment() {
            actions.push(Action::Comment(body.to_string()));
        }
        actions.push(Action::Close);
    }

    if directive.lock {
        actions.push(Action::Lock);
    }

    actions
}

fn younger_than(at: Option<Timestamp>, days: u32, now: Timestamp) -> bool {
    days > 0 && at.is_some_and(|t| t.days_since(now) < i64::from(days))
}
