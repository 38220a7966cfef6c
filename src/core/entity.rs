//! Record traits defining the storage adapter seam for all entity types

use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::hash::Hash;

/// Contract for an entity's enumeration of sortable/filterable fields.
///
/// Each variant maps to exactly one underlying column. The mapping is the
/// only dialect-facing knowledge an entity contributes: the query engine
/// composes clauses purely from `column_name` strings and bound parameters.
pub trait SortField: Copy + Clone + Eq + PartialEq + Hash + Debug + Send + Sync + 'static {
    /// The underlying column name for this field (e.g. `issue_primary_name`)
    fn column_name(self) -> &'static str;

    /// Resolve a column name back to a field, for cursor decoding.
    ///
    /// Returns `None` for names that do not belong to this entity; the
    /// caller surfaces that as an input error rather than guessing.
    fn from_column_name(name: &str) -> Option<Self>;

    /// The field backed by the entity's generated unique identifier.
    ///
    /// Used as the default order when the caller supplies none, and appended
    /// as the final tie-breaker to every order specification so that any
    /// order is a total order.
    fn unique_field() -> Self;
}

/// Base trait for all stored entities.
///
/// An implementation wires a domain struct into the generic query engine:
/// table identity, lifecycle timestamps, the natural key checked by the
/// uniqueness rule, and the projection of order fields to scalar values.
///
/// All entities share the same soft-delete discipline: a nullable
/// `deleted_at` marker that removes the row from default visibility and from
/// uniqueness enforcement without removing the row itself.
pub trait Record: Clone + Send + Sync + 'static {
    /// The entity's sortable/filterable field enumeration
    type Field: SortField;

    /// The entity's typed filter (criteria + state + pagination inputs)
    type Filter: super::service::EntityFilter<Field = Self::Field>;

    /// Table name (e.g. `Issue`)
    const TABLE: &'static str;

    /// Column name prefix (e.g. `issue`, giving `issue_deleted_at`)
    const COLUMN_PREFIX: &'static str;

    // === Identity ===

    /// The generated unique identifier
    fn id(&self) -> i64;

    /// Assign the generated identifier (called by the storage layer on create)
    fn set_id(&mut self, id: i64);

    /// The business-meaningful key that must be unique among Active rows.
    ///
    /// Multi-field keys return one value per field; the tuple as a whole is
    /// the identity (e.g. `(component_id, version)`).
    fn natural_key(&self) -> Vec<FieldValue>;

    // === Lifecycle timestamps ===

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// The soft-deletion marker; `Some` removes the row from the Active scope
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_created_at(&mut self, at: DateTime<Utc>);

    fn set_updated_at(&mut self, at: DateTime<Utc>);

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    // === Query projection ===

    /// The scalar value this row holds for the given order field.
    ///
    /// Cursor encoding and in-memory ordering both read row values through
    /// this single projection, which keeps the two backends agreeing on what
    /// "the value at the boundary" means.
    fn sort_value(&self, field: Self::Field) -> FieldValue;

    // === Utility ===

    /// Check if the entity has been soft-deleted
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}
