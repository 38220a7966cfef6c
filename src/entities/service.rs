//! Affected service entity

use crate::core::entity::{Record, SortField};
use crate::core::field::FieldValue;
use crate::core::service::EntityFilter;
use crate::query::filter::FilterCriterion;
use crate::query::state::StateFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A service whose deployments can be affected by issues.
///
/// The CCRN (cloud resource name) is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub ccrn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Service {
    /// Create an unsaved service; the identifier is assigned by the store
    pub fn new(ccrn: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            ccrn: ccrn.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Sortable/filterable service fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceField {
    Id,
    Ccrn,
}

impl SortField for ServiceField {
    fn column_name(self) -> &'static str {
        match self {
            ServiceField::Id => "service_id",
            ServiceField::Ccrn => "service_ccrn",
        }
    }

    fn from_column_name(name: &str) -> Option<Self> {
        match name {
            "service_id" => Some(ServiceField::Id),
            "service_ccrn" => Some(ServiceField::Ccrn),
            _ => None,
        }
    }

    fn unique_field() -> Self {
        ServiceField::Id
    }
}

/// Typed service query filter
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub id: Vec<i64>,
    pub ccrn: Vec<String>,
    /// Wildcard search over the CCRN
    pub search: Vec<String>,
    pub state: Vec<StateFilter>,
    pub first: Option<usize>,
    pub after: Option<String>,
}

impl EntityFilter for ServiceFilter {
    type Field = ServiceField;

    fn criteria(&self) -> Vec<FilterCriterion<ServiceField>> {
        vec![
            FilterCriterion::equals(ServiceField::Id, self.id.clone()),
            FilterCriterion::equals(ServiceField::Ccrn, self.ccrn.clone()),
            FilterCriterion::like(ServiceField::Ccrn, self.search.clone()),
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

impl Record for Service {
    type Field = ServiceField;
    type Filter = ServiceFilter;

    const TABLE: &'static str = "Service";
    const COLUMN_PREFIX: &'static str = "service";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn natural_key(&self) -> Vec<FieldValue> {
        vec![FieldValue::Text(self.ccrn.clone())]
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

    fn sort_value(&self, field: ServiceField) -> FieldValue {
        match field {
            ServiceField::Id => FieldValue::Integer(self.id),
            ServiceField::Ccrn => FieldValue::Text(self.ccrn.clone()),
        }
    }
}

#[cfg(feature = "mariadb")]
mod sql {
    use super::Service;
    use crate::core::field::FieldValue;
    use crate::storage::mariadb::SqlRecord;
    use sqlx::mysql::MySqlRow;
    use sqlx::{FromRow, Row};

    impl<'r> FromRow<'r, MySqlRow> for Service {
        fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
            Ok(Self {
                id: row.try_get("service_id")?,
                ccrn: row.try_get("service_ccrn")?,
                created_at: row.try_get("service_created_at")?,
                updated_at: row.try_get("service_updated_at")?,
                deleted_at: row.try_get("service_deleted_at")?,
            })
        }
    }

    impl SqlRecord for Service {
        fn columns() -> &'static [&'static str] {
            &["service_ccrn"]
        }

        fn values(&self) -> Vec<FieldValue> {
            vec![FieldValue::Text(self.ccrn.clone())]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_key_is_ccrn() {
        let service = Service::new("ccrn:billing-api");
        assert_eq!(
            service.natural_key(),
            vec![FieldValue::Text("ccrn:billing-api".into())]
        );
    }

    #[test]
    fn test_filter_criteria() {
        let filter = ServiceFilter {
            ccrn: vec!["ccrn:a".to_string(), "ccrn:b".to_string()],
            ..Default::default()
        };
        let criteria = filter.criteria();
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].values.len(), 2);
    }
}
