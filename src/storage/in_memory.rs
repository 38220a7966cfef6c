//! In-memory implementation of `EntityStore` for testing and development
//!
//! This backend is the reference arbiter for the engine's semantics: it
//! evaluates the same criteria, state selection, order resolution and cursor
//! boundaries that the SQL backend renders as statements, directly over
//! typed rows. The two stay in agreement because both read row values
//! through `Record::sort_value`.
//!
//! Uniqueness of the natural key among Active rows is enforced inside the
//! store's write-lock section, so check-then-insert is atomic here the same
//! way a unique index makes it atomic in a database.

use crate::core::entity::Record;
use crate::core::error::{
    ConstraintError, NotFoundError, StorageError, VigilError, VigilResult,
};
use crate::core::field::FieldValue;
use crate::core::service::EntityStore;
use crate::query::cursor::{encode_cursor, CursorField};
use crate::query::filter::{FilterCriterion, MatchMode};
use crate::query::order::{Order, OrderDirection};
use crate::query::state::{state_matches, StateFilter};
use crate::query::window::{Page, PageEntry, QueryWindow};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

const BACKEND: &str = "in-memory";

struct Inner<T> {
    /// Rows in insertion order; iteration is deterministic independent of
    /// hash state
    rows: IndexMap<i64, T>,
    next_id: i64,
}

/// In-memory entity store.
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// rows survive soft deletion and remain enumerable under a Deleted state
/// selection.
#[derive(Clone)]
pub struct InMemoryStore<T: Record> {
    inner: Arc<RwLock<Inner<T>>>,
}

impl<T: Record> InMemoryStore<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                rows: IndexMap::new(),
                next_id: 1,
            })),
        }
    }

    fn read(&self) -> VigilResult<std::sync::RwLockReadGuard<'_, Inner<T>>> {
        self.inner.read().map_err(|e| {
            VigilError::Storage(StorageError::Query {
                backend: BACKEND,
                message: format!("failed to acquire read lock: {}", e),
            })
        })
    }

    fn write(&self) -> VigilResult<std::sync::RwLockWriteGuard<'_, Inner<T>>> {
        self.inner.write().map_err(|e| {
            VigilError::Storage(StorageError::Query {
                backend: BACKEND,
                message: format!("failed to acquire write lock: {}", e),
            })
        })
    }

    fn matching_rows(
        &self,
        criteria: &[FilterCriterion<T::Field>],
        state: &[StateFilter],
    ) -> VigilResult<Vec<T>> {
        let inner = self.read()?;
        Ok(inner
            .rows
            .values()
            .filter(|row| state_matches(state, row.is_deleted()))
            .filter(|row| matches_criteria(*row, criteria))
            .cloned()
            .collect())
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> EntityStore<T> for InMemoryStore<T> {
    async fn create(&self, mut entity: T) -> VigilResult<T> {
        let mut inner = self.write()?;

        let key = entity.natural_key();
        if !key.is_empty() {
            let taken = inner
                .rows
                .values()
                .any(|row| !row.is_deleted() && row.natural_key() == key);
            if taken {
                return Err(ConstraintError::UniqueViolation {
                    entity: T::TABLE,
                    key: render_key(&key),
                }
                .into());
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let now = Utc::now();
        entity.set_id(id);
        entity.set_created_at(now);
        entity.set_updated_at(now);
        entity.set_deleted_at(None);

        inner.rows.insert(id, entity.clone());
        tracing::debug!(table = T::TABLE, id, "created row");
        Ok(entity)
    }

    async fn get(&self, id: i64) -> VigilResult<Option<T>> {
        let inner = self.read()?;
        Ok(inner
            .rows
            .get(&id)
            .filter(|row| !row.is_deleted())
            .cloned())
    }

    async fn update(&self, mut entity: T) -> VigilResult<T> {
        let mut inner = self.write()?;
        let id = entity.id();

        let created_at = match inner.rows.get(&id).filter(|row| !row.is_deleted()) {
            Some(existing) => existing.created_at(),
            None => {
                return Err(NotFoundError {
                    entity: T::TABLE,
                    id,
                }
                .into());
            }
        };

        let key = entity.natural_key();
        if !key.is_empty() {
            let collision = inner
                .rows
                .values()
                .any(|row| row.id() != id && !row.is_deleted() && row.natural_key() == key);
            if collision {
                return Err(ConstraintError::UniqueViolation {
                    entity: T::TABLE,
                    key: render_key(&key),
                }
                .into());
            }
        }

        entity.set_created_at(created_at);
        entity.set_updated_at(Utc::now());
        entity.set_deleted_at(None);

        inner.rows.insert(id, entity.clone());
        tracing::debug!(table = T::TABLE, id, "updated row");
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> VigilResult<()> {
        let mut inner = self.write()?;
        let row = inner
            .rows
            .get_mut(&id)
            .filter(|row| !row.is_deleted())
            .ok_or(NotFoundError {
                entity: T::TABLE,
                id,
            })?;

        let now = Utc::now();
        row.set_deleted_at(Some(now));
        row.set_updated_at(now);
        tracing::debug!(table = T::TABLE, id, "soft-deleted row");
        Ok(())
    }

    async fn list(&self, filter: &T::Filter, order: &[Order<T::Field>]) -> VigilResult<Page<T>> {
        let window = QueryWindow::<T>::new(filter, order)?;

        let mut rows = self.matching_rows(window.criteria(), window.state())?;
        rows.sort_by(|a, b| compare_rows(a, b, window.order()));
        if !window.boundary().is_empty() {
            rows.retain(|row| after_boundary(row, window.boundary()));
        }
        rows.truncate(window.limit());

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let cursor = encode_cursor(window.order(), &row)?;
            entries.push(PageEntry { entity: row, cursor });
        }

        tracing::debug!(table = T::TABLE, count = entries.len(), "list scan complete");
        Ok(Page { entries })
    }

    async fn count(&self, filter: &T::Filter) -> VigilResult<i64> {
        let window = QueryWindow::<T>::unbounded(filter, &[]);
        let rows = self.matching_rows(window.criteria(), window.state())?;
        tracing::debug!(table = T::TABLE, count = rows.len(), "count scan complete");
        Ok(rows.len() as i64)
    }

    async fn list_ids(
        &self,
        filter: &T::Filter,
        order: &[Order<T::Field>],
    ) -> VigilResult<Vec<i64>> {
        let window = QueryWindow::<T>::unbounded(filter, order);
        let mut rows = self.matching_rows(window.criteria(), window.state())?;
        rows.sort_by(|a, b| compare_rows(a, b, window.order()));
        Ok(rows.iter().map(Record::id).collect())
    }
}

fn render_key(key: &[FieldValue]) -> String {
    key.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn matches_criteria<T: Record>(row: &T, criteria: &[FilterCriterion<T::Field>]) -> bool {
    criteria.iter().all(|criterion| {
        if criterion.is_empty() {
            return true;
        }
        let value = row.sort_value(criterion.field);
        match criterion.mode {
            MatchMode::Equals => criterion.values.iter().any(|v| *v == value),
            MatchMode::Like => {
                let Some(text) = value.as_text() else {
                    return false;
                };
                criterion
                    .values
                    .iter()
                    .any(|v| v.as_text().is_some_and(|term| like_match(text, term)))
            }
        }
    })
}

fn compare_rows<T: Record>(a: &T, b: &T, order: &[Order<T::Field>]) -> Ordering {
    for o in order {
        let ordering = a.sort_value(o.by).cmp(&b.sort_value(o.by));
        let ordering = match o.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Whether `row` lies strictly after the boundary tuple under the boundary's
/// own order: lexicographic comparison, direction-adjusted per field
fn after_boundary<T: Record>(row: &T, boundary: &[CursorField<T::Field>]) -> bool {
    for b in boundary {
        let ordering = row.sort_value(b.field).cmp(&b.value);
        let ordering = match b.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        };
        match ordering {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => continue,
        }
    }
    false
}

/// Match `text` against SQL `LIKE CONCAT('%', term, '%')` semantics: the
/// term is a substring pattern in which `%` and `_` keep their LIKE meaning
fn like_match(text: &str, term: &str) -> bool {
    let mut pattern = String::from("(?s)^.*");
    for ch in term.chars() {
        match ch {
            '%' => pattern.push_str(".*"),
            '_' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push_str(".*$");
    Regex::new(&pattern).map(|re| re.is_match(text)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_match_plain_substring() {
        assert!(like_match("CVE-2024-1234", "2024"));
        assert!(like_match("CVE-2024-1234", "CVE-2024-1234"));
        assert!(!like_match("CVE-2024-1234", "2025"));
    }

    #[test]
    fn test_like_match_embedded_wildcards() {
        assert!(like_match("log4j-core", "log%core"));
        assert!(like_match("log4j-core", "log_j"));
        assert!(!like_match("log4j-core", "log_core"));
    }

    #[test]
    fn test_like_match_escapes_regex_metacharacters() {
        assert!(like_match("a.b+c", "a.b+c"));
        assert!(!like_match("aXb+c", "a.b+c"));
    }
}
