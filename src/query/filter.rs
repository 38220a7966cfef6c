//! Filter predicate building
//!
//! Turns typed, multi-valued filter criteria into a boolean expression and
//! its positional parameters. Values are never interpolated into the
//! expression text: every clause is built from column names and `?`
//! placeholders, and the matching values travel out-of-band in a flat,
//! order-matched parameter list.

use crate::core::entity::SortField;
use crate::core::field::FieldValue;

/// Logical connective used when combining clauses
pub const OP_AND: &str = "AND";
/// Logical connective used between values of one criterion
pub const OP_OR: &str = "OR";

/// How a criterion's values are compared against the column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Exact equality (`col = ?`)
    Equals,
    /// Substring pattern match (`col LIKE CONCAT('%', ?, '%')`)
    Like,
}

/// One named, possibly multi-valued, optional constraint.
///
/// Multiple values within a criterion are alternatives (OR); multiple
/// criteria on one filter are combined with AND. A criterion with zero
/// values is absent: it contributes no clause and no parameters, and must
/// never be read as "matches nothing".
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriterion<F> {
    pub field: F,
    pub mode: MatchMode,
    pub values: Vec<FieldValue>,
}

impl<F: SortField> FilterCriterion<F> {
    /// An equality criterion over the given acceptable values
    pub fn equals<V>(field: F, values: Vec<V>) -> Self
    where
        V: Into<FieldValue>,
    {
        Self {
            field,
            mode: MatchMode::Equals,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A substring-match criterion over the given search terms
    pub fn like<V>(field: F, values: Vec<V>) -> Self
    where
        V: Into<FieldValue>,
    {
        Self {
            field,
            mode: MatchMode::Like,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this criterion constrains anything at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The parenthesized OR-of-comparisons clause for this criterion, or an
    /// empty string when the criterion is absent
    pub fn clause(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let column = self.field.column_name();
        let comparison = match self.mode {
            MatchMode::Equals => format!("{} = ?", column),
            MatchMode::Like => format!("{} LIKE CONCAT('%', ?, '%')", column),
        };
        let parts: Vec<&str> = std::iter::repeat_n(comparison.as_str(), self.values.len()).collect();
        format!("({})", parts.join(&format!(" {} ", OP_OR)))
    }
}

/// Join non-empty clauses with the given connective.
///
/// Empty clauses are skipped entirely; an all-empty input yields the empty
/// string, which callers must treat as "always true" (no `WHERE` at all).
pub fn combine_clauses<I>(clauses: I, op: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    clauses
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(&format!(" {} ", op))
}

/// The AND-combined expression for a criterion list (state not included)
pub fn filter_clause<F: SortField>(criteria: &[FilterCriterion<F>]) -> String {
    combine_clauses(criteria.iter().map(FilterCriterion::clause), OP_AND)
}

/// The flat parameter list matching [`filter_clause`], in clause order
pub fn filter_parameters<F: SortField>(criteria: &[FilterCriterion<F>]) -> Vec<FieldValue> {
    criteria
        .iter()
        .flat_map(|c| c.values.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::SortField;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestField {
        Id,
        Name,
    }

    impl SortField for TestField {
        fn column_name(self) -> &'static str {
            match self {
                TestField::Id => "issue_id",
                TestField::Name => "issue_primary_name",
            }
        }

        fn from_column_name(name: &str) -> Option<Self> {
            match name {
                "issue_id" => Some(TestField::Id),
                "issue_primary_name" => Some(TestField::Name),
                _ => None,
            }
        }

        fn unique_field() -> Self {
            TestField::Id
        }
    }

    #[test]
    fn test_single_value_criterion() {
        let c = FilterCriterion::equals(TestField::Id, vec![1i64]);
        assert_eq!(c.clause(), "(issue_id = ?)");
    }

    #[test]
    fn test_multi_value_criterion_is_or_joined() {
        let c = FilterCriterion::equals(TestField::Id, vec![1i64, 2, 3]);
        assert_eq!(c.clause(), "(issue_id = ? OR issue_id = ? OR issue_id = ?)");
    }

    #[test]
    fn test_empty_criterion_contributes_nothing() {
        let c = FilterCriterion::equals(TestField::Id, Vec::<i64>::new());
        assert!(c.is_empty());
        assert_eq!(c.clause(), "");
        assert!(filter_parameters(&[c]).is_empty());
    }

    #[test]
    fn test_like_criterion() {
        let c = FilterCriterion::like(TestField::Name, vec!["log4j"]);
        assert_eq!(c.clause(), "(issue_primary_name LIKE CONCAT('%', ?, '%'))");
    }

    #[test]
    fn test_criteria_are_and_joined() {
        let criteria = vec![
            FilterCriterion::equals(TestField::Id, vec![1i64, 2]),
            FilterCriterion::like(TestField::Name, vec!["cve"]),
        ];
        assert_eq!(
            filter_clause(&criteria),
            "(issue_id = ? OR issue_id = ?) AND (issue_primary_name LIKE CONCAT('%', ?, '%'))"
        );
    }

    #[test]
    fn test_parameters_match_clause_order() {
        let criteria = vec![
            FilterCriterion::equals(TestField::Id, vec![1i64, 2]),
            FilterCriterion::like(TestField::Name, vec!["cve"]),
        ];
        assert_eq!(
            filter_parameters(&criteria),
            vec![
                FieldValue::Integer(1),
                FieldValue::Integer(2),
                FieldValue::Text("cve".into()),
            ]
        );
    }

    #[test]
    fn test_all_empty_yields_empty_expression() {
        let criteria = vec![
            FilterCriterion::equals(TestField::Id, Vec::<i64>::new()),
            FilterCriterion::like(TestField::Name, Vec::<String>::new()),
        ];
        assert_eq!(filter_clause(&criteria), "");
        assert!(filter_parameters(&criteria).is_empty());
    }

    #[test]
    fn test_combine_skips_empty_clauses() {
        let combined = combine_clauses(
            vec![String::new(), "(a = ?)".to_string(), String::new(), "(b = ?)".to_string()],
            OP_AND,
        );
        assert_eq!(combined, "(a = ?) AND (b = ?)");
    }

    #[test]
    fn test_duplicate_values_are_kept() {
        // OR-ing duplicates is harmless; elimination is a quality choice,
        // not a correctness requirement.
        let c = FilterCriterion::equals(TestField::Id, vec![5i64, 5]);
        assert_eq!(c.clause(), "(issue_id = ? OR issue_id = ?)");
        assert_eq!(c.values.len(), 2);
    }
}
