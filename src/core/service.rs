//! Store traits for entity CRUD and windowed querying

use crate::core::entity::{Record, SortField};
use crate::core::error::VigilResult;
use crate::query::filter::FilterCriterion;
use crate::query::order::Order;
use crate::query::state::StateFilter;
use crate::query::window::Page;
use async_trait::async_trait;

/// Contract for an entity's typed filter object.
///
/// A filter is a struct-shaped set of named optional multi-value criteria
/// plus a state selector and the pagination inputs (`first`, `after`). The
/// engine only ever sees the flattened criteria; entity modules own the
/// field-by-field shape.
pub trait EntityFilter: Send + Sync {
    /// The field enumeration the criteria refer to
    type Field: SortField;

    /// Flatten this filter into engine criteria.
    ///
    /// Criteria with no values are dropped here rather than downstream, so
    /// an "empty" filter genuinely contributes nothing to the statement.
    fn criteria(&self) -> Vec<FilterCriterion<Self::Field>>;

    /// The lifecycle states to select; empty means Active only
    fn state(&self) -> Vec<StateFilter>;

    /// Requested page size; `None` falls back to the configured default
    fn first(&self) -> Option<usize>;

    /// Cursor marking the position to resume after; `None` or empty means
    /// the start of the result set
    fn after(&self) -> Option<&str>;
}

/// Service trait for managing stored entities.
///
/// Implementations provide soft-delete-aware CRUD plus the three windowed
/// query variants for a specific entity type. The engine is agnostic to the
/// underlying storage mechanism; uniqueness of the natural key among Active
/// rows is enforced by the implementation's storage arbiter, not by callers.
#[async_trait]
pub trait EntityStore<T: Record>: Send + Sync {
    /// Create a new entity, assigning a fresh identifier.
    ///
    /// Fails with a constraint error when an Active row already holds the
    /// same natural key; Deleted rows sharing the key do not block creation.
    async fn create(&self, entity: T) -> VigilResult<T>;

    /// Get an Active entity by identifier
    async fn get(&self, id: i64) -> VigilResult<Option<T>>;

    /// Update an existing Active entity.
    ///
    /// Updating a nonexistent or deleted row is reported as not-found, never
    /// silently ignored.
    async fn update(&self, entity: T) -> VigilResult<T>;

    /// Soft-delete an entity: sets the deletion marker and releases the
    /// natural key for reuse. The row itself is preserved.
    async fn delete(&self, id: i64) -> VigilResult<()>;

    /// Fetch one page of entities matching the filter, in the given order,
    /// with a resumption cursor per row
    async fn list(&self, filter: &T::Filter, order: &[Order<T::Field>]) -> VigilResult<Page<T>>;

    /// Count entities matching the filter and state, ignoring pagination
    async fn count(&self, filter: &T::Filter) -> VigilResult<i64>;

    /// Enumerate bare identifiers matching the filter, in the given order
    async fn list_ids(
        &self,
        filter: &T::Filter,
        order: &[Order<T::Field>],
    ) -> VigilResult<Vec<i64>>;
}
