//! Security issue entity

use crate::core::entity::{Record, SortField};
use crate::core::field::FieldValue;
use crate::core::service::EntityFilter;
use crate::query::filter::FilterCriterion;
use crate::query::state::StateFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Classification of a tracked security issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    Vulnerability,
    PolicyViolation,
    SecurityEvent,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueType::Vulnerability => "Vulnerability",
            IssueType::PolicyViolation => "PolicyViolation",
            IssueType::SecurityEvent => "SecurityEvent",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error)]
#[error("unknown issue type '{0}'")]
pub struct ParseIssueTypeError(String);

impl FromStr for IssueType {
    type Err = ParseIssueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Vulnerability" => Ok(IssueType::Vulnerability),
            "PolicyViolation" => Ok(IssueType::PolicyViolation),
            "SecurityEvent" => Ok(IssueType::SecurityEvent),
            other => Err(ParseIssueTypeError(other.to_string())),
        }
    }
}

/// A tracked security issue.
///
/// The primary name (e.g. a CVE identifier) is the natural key: unique
/// among Active issues, repeatable across Deleted ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub primary_name: String,
    pub issue_type: IssueType,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Create an unsaved issue; the identifier is assigned by the store
    pub fn new(
        primary_name: impl Into<String>,
        issue_type: IssueType,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            primary_name: primary_name.into(),
            issue_type,
            description: description.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Sortable/filterable issue fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    Id,
    PrimaryName,
    Type,
}

impl SortField for IssueField {
    fn column_name(self) -> &'static str {
        match self {
            IssueField::Id => "issue_id",
            IssueField::PrimaryName => "issue_primary_name",
            IssueField::Type => "issue_type",
        }
    }

    fn from_column_name(name: &str) -> Option<Self> {
        match name {
            "issue_id" => Some(IssueField::Id),
            "issue_primary_name" => Some(IssueField::PrimaryName),
            "issue_type" => Some(IssueField::Type),
            _ => None,
        }
    }

    fn unique_field() -> Self {
        IssueField::Id
    }
}

/// Typed issue query filter
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub id: Vec<i64>,
    pub primary_name: Vec<String>,
    pub issue_type: Vec<IssueType>,
    /// Wildcard search over the primary name
    pub search: Vec<String>,
    pub state: Vec<StateFilter>,
    pub first: Option<usize>,
    pub after: Option<String>,
}

impl EntityFilter for IssueFilter {
    type Field = IssueField;

    fn criteria(&self) -> Vec<FilterCriterion<IssueField>> {
        vec![
            FilterCriterion::equals(IssueField::Id, self.id.clone()),
            FilterCriterion::equals(IssueField::PrimaryName, self.primary_name.clone()),
            FilterCriterion::equals(
                IssueField::Type,
                self.issue_type.iter().map(ToString::to_string).collect(),
            ),
            FilterCriterion::like(IssueField::PrimaryName, self.search.clone()),
        ]
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect()
    }

    fn state(&self) -> Vec<StateFilter> {
        self.state.clone()
    }

    fn first(&self) -> Option<usize> {
        self.first
    }

    fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }
}

impl Record for Issue {
    type Field = IssueField;
    type Filter = IssueFilter;

    const TABLE: &'static str = "Issue";
    const COLUMN_PREFIX: &'static str = "issue";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn natural_key(&self) -> Vec<FieldValue> {
        vec![FieldValue::Text(self.primary_name.clone())]
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

    fn sort_value(&self, field: IssueField) -> FieldValue {
        match field {
            IssueField::Id => FieldValue::Integer(self.id),
            IssueField::PrimaryName => FieldValue::Text(self.primary_name.clone()),
            IssueField::Type => FieldValue::Text(self.issue_type.to_string()),
        }
    }
}

#[cfg(feature = "mariadb")]
mod sql {
    use super::Issue;
    use crate::core::field::FieldValue;
    use crate::storage::mariadb::SqlRecord;
    use sqlx::mysql::MySqlRow;
    use sqlx::{FromRow, Row};
    use std::str::FromStr;

    impl<'r> FromRow<'r, MySqlRow> for Issue {
        fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
            let issue_type: String = row.try_get("issue_type")?;
            Ok(Self {
                id: row.try_get("issue_id")?,
                primary_name: row.try_get("issue_primary_name")?,
                issue_type: super::IssueType::from_str(&issue_type).map_err(|e| {
                    sqlx::Error::ColumnDecode {
                        index: "issue_type".to_string(),
                        source: Box::new(e),
                    }
                })?,
                description: row.try_get("issue_description")?,
                created_at: row.try_get("issue_created_at")?,
                updated_at: row.try_get("issue_updated_at")?,
                deleted_at: row.try_get("issue_deleted_at")?,
            })
        }
    }

    impl SqlRecord for Issue {
        fn columns() -> &'static [&'static str] {
            &["issue_primary_name", "issue_type", "issue_description"]
        }

        fn values(&self) -> Vec<FieldValue> {
            vec![
                FieldValue::Text(self.primary_name.clone()),
                FieldValue::Text(self.issue_type.to_string()),
                FieldValue::Text(self.description.clone()),
            ]
        }
    }
}
