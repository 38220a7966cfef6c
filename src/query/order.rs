//! Order specification and resolution
//!
//! Callers supply an ordered list of (field, direction) pairs; the engine
//! resolves it into a total order by appending the entity's unique id field
//! as a final tie-breaker whenever it is not already present. Cursors are
//! only ever produced under resolved orders, so a page boundary always pins
//! down exactly one row.

use crate::core::entity::SortField;
use serde::{Deserialize, Serialize};

/// Sort direction for one order field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// The ORDER BY keyword for this direction
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }

    /// The comparison operator selecting rows strictly past a boundary
    /// value in this direction
    pub fn comparator(self) -> &'static str {
        match self {
            OrderDirection::Asc => ">",
            OrderDirection::Desc => "<",
        }
    }
}

/// One (field, direction) pair of an order specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order<F> {
    pub by: F,
    pub direction: OrderDirection,
}

impl<F> Order<F> {
    pub fn asc(by: F) -> Self {
        Self {
            by,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(by: F) -> Self {
        Self {
            by,
            direction: OrderDirection::Desc,
        }
    }
}

/// Resolve a caller-supplied order into a total order.
///
/// An empty specification becomes `(unique_field, Asc)`. A non-empty one is
/// preserved field-by-field and gets the unique id field appended ascending
/// unless the caller already ordered by it somewhere in the sequence.
pub fn resolve_order<F: SortField>(order: &[Order<F>]) -> Vec<Order<F>> {
    let unique = F::unique_field();
    let mut resolved: Vec<Order<F>> = order.to_vec();
    if !resolved.iter().any(|o| o.by == unique) {
        resolved.push(Order::asc(unique));
    }
    resolved
}

/// Render the ORDER BY fragment for a (resolved) order specification,
/// preserving the field sequence
pub fn order_by_clause<F: SortField>(order: &[Order<F>]) -> String {
    order
        .iter()
        .map(|o| format!("{} {}", o.by.column_name(), o.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable rendering used in mismatch errors
pub fn describe_order<F: SortField>(order: &[Order<F>]) -> String {
    order_by_clause(order)
}
