//! Soft-delete lifecycle filtering
//!
//! Every entity uses the same nullable deletion marker, so the visibility
//! clause is centralized here rather than re-derived per entity. Deleted
//! records are invisible unless explicitly requested.

use crate::query::filter::{combine_clauses, OP_OR};

/// Lifecycle positions a query can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    /// Deletion marker unset
    Active,
    /// Deletion marker set
    Deleted,
}

/// The lifecycle clause for the given state selection.
///
/// An empty selection means "Active only" (the universal default). Selecting
/// both states emits no clause at all: every row is visible.
///
/// `prefix` is the entity's column prefix, giving e.g.
/// `issue_deleted_at IS NULL`.
pub fn state_clause(state: &[StateFilter], prefix: &str) -> String {
    let active = state.is_empty() || state.contains(&StateFilter::Active);
    let deleted = state.contains(&StateFilter::Deleted);

    if active && deleted {
        return String::new();
    }

    let mut clauses = Vec::new();
    if active {
        clauses.push(format!("{}_deleted_at IS NULL", prefix));
    }
    if deleted {
        clauses.push(format!("{}_deleted_at IS NOT NULL", prefix));
    }
    combine_clauses(clauses, OP_OR)
}

/// Whether a row with the given deletion marker is visible under the
/// selection; the in-memory backend's counterpart of [`state_clause`]
pub fn state_matches(state: &[StateFilter], deleted: bool) -> bool {
    if state.is_empty() {
        return !deleted;
    }
    state.contains(if deleted {
        &StateFilter::Deleted
    } else {
        &StateFilter::Active
    })
}
