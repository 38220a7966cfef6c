//! Opaque cursor codec and boundary expansion
//!
//! A cursor encodes, for the order specification a query actually ran under,
//! the tuple of field values observed at one row. The token is URL-safe
//! base64 over a JSON array of `{name, value, direction}` entries, making it
//! self-describing: decoding recovers typed boundary values keyed by column
//! name, and a token produced under one order fails cleanly when replayed
//! against another.
//!
//! An absent or empty token is the valid sentinel for "start of result set".
//! A malformed token is an input error, never a silent first page: callers
//! need to distinguish the two.

use crate::core::entity::{Record, SortField};
use crate::core::error::{InputError, StorageError, VigilResult};
use crate::core::field::FieldValue;
use crate::query::order::{Order, OrderDirection};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One decoded boundary entry: a field, the value at the boundary, and the
/// direction it was ordered under
#[derive(Debug, Clone, PartialEq)]
pub struct CursorField<F> {
    pub field: F,
    pub value: FieldValue,
    pub direction: OrderDirection,
}

/// Wire shape of one cursor entry; field identity travels as the column name
#[derive(Debug, Serialize, Deserialize)]
struct WireField {
    name: String,
    value: FieldValue,
    direction: OrderDirection,
}

/// Encode the cursor for `row` under the given (resolved) order.
///
/// Only ever called with the order specification actually used for the query
/// that produced the row, so handing the token back to the caller keeps it
/// replayable against the same endpoint with the same order.
pub fn encode_cursor<T: Record>(order: &[Order<T::Field>], row: &T) -> VigilResult<String> {
    let fields: Vec<WireField> = order
        .iter()
        .map(|o| WireField {
            name: o.by.column_name().to_string(),
            value: row.sort_value(o.by),
            direction: o.direction,
        })
        .collect();

    let json = serde_json::to_vec(&fields).map_err(|e| StorageError::Serialization {
        message: e.to_string(),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a cursor token into typed boundary fields.
///
/// `None` or the empty string decode to no boundary (first page). Tokens
/// that are not valid base64/JSON fail with [`InputError::MalformedCursor`];
/// tokens naming a column the entity does not expose fail with
/// [`InputError::UnknownField`].
pub fn decode_cursor<F: SortField>(
    entity: &'static str,
    after: Option<&str>,
) -> Result<Vec<CursorField<F>>, InputError> {
    let token = match after {
        None | Some("") => return Ok(Vec::new()),
        Some(t) => t,
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| InputError::MalformedCursor {
            message: format!("invalid base64: {}", e),
        })?;

    let wire: Vec<WireField> =
        serde_json::from_slice(&bytes).map_err(|e| InputError::MalformedCursor {
            message: format!("invalid payload: {}", e),
        })?;

    wire.into_iter()
        .map(|w| {
            let field = F::from_column_name(&w.name).ok_or_else(|| InputError::UnknownField {
                entity,
                name: w.name.clone(),
            })?;
            Ok(CursorField {
                field,
                value: w.value,
                direction: w.direction,
            })
        })
        .collect()
}

/// Expand a boundary into the "strictly after this tuple" condition.
///
/// For N order fields the condition is a disjunction of N conjunctions:
/// field 1 strictly past its boundary value, OR field 1 equal AND field 2
/// strictly past, and so on — with "past" meaning greater for ascending and
/// less for descending fields. An empty boundary yields the empty string.
pub fn cursor_clause<F: SortField>(boundary: &[CursorField<F>]) -> String {
    let mut clauses = Vec::with_capacity(boundary.len());
    for (i, last) in boundary.iter().enumerate() {
        let mut parts: Vec<String> = boundary[..i]
            .iter()
            .map(|b| format!("{} = ?", b.field.column_name()))
            .collect();
        parts.push(format!(
            "{} {} ?",
            last.field.column_name(),
            last.direction.comparator()
        ));
        clauses.push(format!("({})", parts.join(" AND ")));
    }
    clauses.join(" OR ")
}

/// The flat parameter list matching [`cursor_clause`], in clause order
pub fn cursor_parameters<F: SortField>(boundary: &[CursorField<F>]) -> Vec<FieldValue> {
    let mut params = Vec::new();
    for i in 0..boundary.len() {
        for b in &boundary[..=i] {
            params.push(b.value.clone());
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Record;
    use crate::core::service::EntityFilter;
    use crate::query::filter::FilterCriterion;
    use crate::query::state::StateFilter;
    use chrono::{DateTime, Utc};

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

    #[derive(Debug, Clone, Default)]
    struct TestFilter;

    impl EntityFilter for TestFilter {
        type Field = TestField;

        fn criteria(&self) -> Vec<FilterCriterion<TestField>> {
            Vec::new()
        }

        fn state(&self) -> Vec<StateFilter> {
            Vec::new()
        }

        fn first(&self) -> Option<usize> {
            None
        }

        fn after(&self) -> Option<&str> {
            None
        }
    }

    #[derive(Debug, Clone)]
    struct TestRow {
        id: i64,
        name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    }

    impl TestRow {
        fn new(id: i64, name: &str) -> Self {
            let now = Utc::now();
            Self {
                id,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            }
        }
    }

    impl Record for TestRow {
        type Field = TestField;
        type Filter = TestFilter;

        const TABLE: &'static str = "Issue";
        const COLUMN_PREFIX: &'static str = "issue";

        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn natural_key(&self) -> Vec<FieldValue> {
            vec![FieldValue::Text(self.name.clone())]
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn updated_at(&self) -> DateTime<Utc> {
            self.updated_at
        }

        fn deleted_at(&self) -> Option<DateTime<Utc>> {
            self.deleted_at
        }

        fn set_created_at(&mut self, at: DateTime<Utc>) {
            self.created_at = at;
        }

        fn set_updated_at(&mut self, at: DateTime<Utc>) {
            self.updated_at = at;
        }

        fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
            self.deleted_at = at;
        }

        fn sort_value(&self, field: TestField) -> FieldValue {
            match field {
                TestField::Id => FieldValue::Integer(self.id),
                TestField::Name => FieldValue::Text(self.name.clone()),
            }
        }
    }

    #[test]
    fn test_roundtrip_single_field() {
        let row = TestRow::new(42, "CVE-2024-0001");
        let order = vec![Order::asc(TestField::Id)];
        let token = encode_cursor(&order, &row).unwrap();
        let decoded = decode_cursor::<TestField>("Issue", Some(&token)).unwrap();
        assert_eq!(
            decoded,
            vec![CursorField {
                field: TestField::Id,
                value: FieldValue::Integer(42),
                direction: OrderDirection::Asc,
            }]
        );
    }

    #[test]
    fn test_roundtrip_multi_field_both_directions() {
        let row = TestRow::new(7, "CVE-2024-0002");
        let order = vec![Order::desc(TestField::Name), Order::asc(TestField::Id)];
        let token = encode_cursor(&order, &row).unwrap();
        let decoded = decode_cursor::<TestField>("Issue", Some(&token)).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].field, TestField::Name);
        assert_eq!(decoded[0].value, FieldValue::Text("CVE-2024-0002".into()));
        assert_eq!(decoded[0].direction, OrderDirection::Desc);
        assert_eq!(decoded[1].field, TestField::Id);
        assert_eq!(decoded[1].value, FieldValue::Integer(7));
        assert_eq!(decoded[1].direction, OrderDirection::Asc);
    }

    #[test]
    fn test_token_is_url_safe() {
        let row = TestRow::new(999, "name with spaces & symbols /+=?");
        let order = vec![Order::asc(TestField::Name), Order::asc(TestField::Id)];
        let token = encode_cursor(&order, &row).unwrap();
        assert!(!token.contains('/'));
        assert!(!token.contains('+'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_empty_cursor_is_first_page() {
        assert!(decode_cursor::<TestField>("Issue", None).unwrap().is_empty());
        assert!(decode_cursor::<TestField>("Issue", Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_token_is_an_error() {
        let err = decode_cursor::<TestField>("Issue", Some("!!! not base64 !!!")).unwrap_err();
        assert!(matches!(err, InputError::MalformedCursor { .. }));

        // valid base64, invalid payload
        let garbage = URL_SAFE_NO_PAD.encode(b"{\"not\": \"a cursor\"}");
        let err = decode_cursor::<TestField>("Issue", Some(&garbage)).unwrap_err();
        assert!(matches!(err, InputError::MalformedCursor { .. }));
    }

    #[test]
    fn test_foreign_field_is_an_error() {
        let row = TestRow::new(1, "x");
        let order = vec![Order::asc(TestField::Name)];
        let token = encode_cursor(&order, &row).unwrap();

        // Decode against an entity that only knows "service_ccrn".
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum OtherField {
            Ccrn,
        }
        impl SortField for OtherField {
            fn column_name(self) -> &'static str {
                "service_ccrn"
            }
            fn from_column_name(name: &str) -> Option<Self> {
                (name == "service_ccrn").then_some(OtherField::Ccrn)
            }
            fn unique_field() -> Self {
                OtherField::Ccrn
            }
        }

        let err = decode_cursor::<OtherField>("Service", Some(&token)).unwrap_err();
        assert!(matches!(err, InputError::UnknownField { .. }));
    }

    #[test]
    fn test_cursor_clause_single_field() {
        let boundary = vec![CursorField {
            field: TestField::Id,
            value: FieldValue::Integer(10),
            direction: OrderDirection::Asc,
        }];
        assert_eq!(cursor_clause(&boundary), "(issue_id > ?)");
        assert_eq!(cursor_parameters(&boundary), vec![FieldValue::Integer(10)]);
    }

    #[test]
    fn test_cursor_clause_lexicographic_expansion() {
        let boundary = vec![
            CursorField {
                field: TestField::Name,
                value: FieldValue::Text("m".into()),
                direction: OrderDirection::Desc,
            },
            CursorField {
                field: TestField::Id,
                value: FieldValue::Integer(5),
                direction: OrderDirection::Asc,
            },
        ];
        assert_eq!(
            cursor_clause(&boundary),
            "(issue_primary_name < ?) OR (issue_primary_name = ? AND issue_id > ?)"
        );
        assert_eq!(
            cursor_parameters(&boundary),
            vec![
                FieldValue::Text("m".into()),
                FieldValue::Text("m".into()),
                FieldValue::Integer(5),
            ]
        );
    }

    #[test]
    fn test_empty_boundary_yields_no_clause() {
        let boundary: Vec<CursorField<TestField>> = Vec::new();
        assert_eq!(cursor_clause(&boundary), "");
        assert!(cursor_parameters(&boundary).is_empty());
    }
}
