//! Pagination window engine
//!
//! Combines filter criteria, the lifecycle state clause, the resolved order
//! specification, a decoded cursor boundary and a page limit into bounded
//! fetch statements. The engine is stateless and read-only: every call
//! resolves one `(filter, order, cursor)` tuple to a statement and parameter
//! list with no caching in between.
//!
//! Pagination is not transactionally isolated across calls: a cursor
//! captures a position, not a snapshot, so writes between page fetches may
//! cause a row to be skipped or repeated. That weak-consistency tradeoff is
//! accepted and documented here rather than papered over.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::core::entity::{Record, SortField};
use crate::core::error::{InputError, VigilResult};
use crate::core::field::FieldValue;
use crate::core::service::EntityFilter;
use crate::query::cursor::{cursor_clause, cursor_parameters, decode_cursor, CursorField};
use crate::query::filter::{combine_clauses, filter_clause, filter_parameters, FilterCriterion, OP_AND};
use crate::query::order::{describe_order, order_by_clause, resolve_order, Order};
use crate::query::state::{state_clause, StateFilter};

/// A statement fragment pair: SQL text with `?` placeholders and the
/// order-matched bound values
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

/// One entity of a page together with its resumption cursor
#[derive(Debug, Clone)]
pub struct PageEntry<T> {
    pub entity: T,
    pub cursor: String,
}

/// A bounded, ordered sequence of entities, each carrying the cursor that
/// resumes pagination immediately after it
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub entries: Vec<PageEntry<T>>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cursor of the last row, i.e. the `after` input for the next page
    pub fn last_cursor(&self) -> Option<&str> {
        self.entries.last().map(|e| e.cursor.as_str())
    }

    /// Iterate over the entities without their cursors
    pub fn entities(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.entity)
    }

    /// Consume the page, dropping the cursors
    pub fn into_entities(self) -> Vec<T> {
        self.entries.into_iter().map(|e| e.entity).collect()
    }
}

/// A fully resolved query window for one entity type.
///
/// Construction validates the caller's input up front: the cursor is decoded
/// and checked against the resolved order before any statement is built, so
/// a mismatched cursor surfaces as an input error and never as a mispositioned
/// or empty page.
#[derive(Debug)]
pub struct QueryWindow<T: Record> {
    criteria: Vec<FilterCriterion<T::Field>>,
    state: Vec<StateFilter>,
    order: Vec<Order<T::Field>>,
    boundary: Vec<CursorField<T::Field>>,
    limit: usize,
}

impl<T: Record> QueryWindow<T> {
    /// Resolve a filter and caller order into a window.
    ///
    /// The order gets the entity's unique id field appended as tie-breaker;
    /// the page size falls back to [`DEFAULT_PAGE_SIZE`] when unspecified.
    pub fn new(filter: &T::Filter, order: &[Order<T::Field>]) -> VigilResult<Self> {
        let resolved = resolve_order(order);
        let boundary = decode_cursor::<T::Field>(T::TABLE, filter.after())?;

        if !boundary.is_empty() {
            validate_boundary(&resolved, &boundary)?;
        }

        Ok(Self {
            criteria: filter.criteria(),
            state: filter.state(),
            order: resolved,
            boundary,
            limit: filter.first().unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }

    /// Resolve a filter into a window that ignores the cursor entirely.
    ///
    /// Count and identifier enumeration apply filter and state but no
    /// boundary, so an `after` token — even one minted under a different
    /// order — is not consumed and not validated here.
    pub fn unbounded(filter: &T::Filter, order: &[Order<T::Field>]) -> Self {
        Self {
            criteria: filter.criteria(),
            state: filter.state(),
            order: resolve_order(order),
            boundary: Vec::new(),
            limit: filter.first().unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// The resolved order this window executes under
    pub fn order(&self) -> &[Order<T::Field>] {
        &self.order
    }

    /// The decoded cursor boundary; empty means start of the result set
    pub fn boundary(&self) -> &[CursorField<T::Field>] {
        &self.boundary
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn criteria(&self) -> &[FilterCriterion<T::Field>] {
        &self.criteria
    }

    pub fn state(&self) -> &[StateFilter] {
        &self.state
    }

    fn predicate_clause(&self) -> String {
        combine_clauses(
            [
                filter_clause(&self.criteria),
                state_clause(&self.state, T::COLUMN_PREFIX),
            ],
            OP_AND,
        )
    }

    fn where_clause(&self, with_cursor: bool) -> String {
        let predicate = self.predicate_clause();
        let cursor = if with_cursor {
            cursor_clause(&self.boundary)
        } else {
            String::new()
        };

        match (predicate.is_empty(), cursor.is_empty()) {
            (true, true) => String::new(),
            (false, true) => format!(" WHERE {}", predicate),
            (true, false) => format!(" WHERE ({})", cursor),
            (false, false) => format!(" WHERE {} AND ({})", predicate, cursor),
        }
    }

    /// The bounded fetch: filter + state + boundary, ordered, limited
    pub fn select(&self) -> Statement {
        let sql = format!(
            "SELECT * FROM {}{} ORDER BY {} LIMIT ?",
            T::TABLE,
            self.where_clause(true),
            order_by_clause(&self.order),
        );
        let mut params = filter_parameters(&self.criteria);
        params.extend(cursor_parameters(&self.boundary));
        params.push(FieldValue::Integer(self.limit as i64));
        Statement { sql, params }
    }

    /// The unbounded count: filter + state only, cursor and limit ignored
    pub fn count(&self) -> Statement {
        let sql = format!("SELECT COUNT(*) FROM {}{}", T::TABLE, self.where_clause(false));
        Statement {
            sql,
            params: filter_parameters(&self.criteria),
        }
    }

    /// The identifier enumeration: filter + state + order, values omitted
    pub fn ids(&self) -> Statement {
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {}",
            T::Field::unique_field().column_name(),
            T::TABLE,
            self.where_clause(false),
            order_by_clause(&self.order),
        );
        Statement {
            sql,
            params: filter_parameters(&self.criteria),
        }
    }
}

/// A cursor is only valid for the order specification it was produced
/// under: same fields, same sequence, same directions.
fn validate_boundary<F: SortField>(
    order: &[Order<F>],
    boundary: &[CursorField<F>],
) -> Result<(), InputError> {
    let matches = boundary.len() == order.len()
        && order
            .iter()
            .zip(boundary.iter())
            .all(|(o, b)| o.by == b.field && o.direction == b.direction);

    if matches {
        Ok(())
    } else {
        let found: Vec<Order<F>> = boundary
            .iter()
            .map(|b| Order {
                by: b.field,
                direction: b.direction,
            })
            .collect();
        Err(InputError::CursorMismatch {
            expected: describe_order(order),
            found: describe_order(&found),
        })
    }
}
