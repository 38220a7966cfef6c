//! Component version entity

use crate::core::entity::{Record, SortField};
use crate::core::field::FieldValue;
use crate::core::service::EntityFilter;
use crate::query::filter::FilterCriterion;
use crate::query::state::StateFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One released version of a tracked component.
///
/// The natural key is the `(component_id, version)` pair: a component may
/// carry many versions, but each version string identifies at most one
/// Active row per component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentVersion {
    pub id: i64,
    pub component_id: i64,
    pub version: String,
    pub repository: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ComponentVersion {
    /// Create an unsaved component version; the identifier is assigned by
    /// the store
    pub fn new(
        component_id: i64,
        version: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            component_id,
            version: version.into(),
            repository: repository.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Sortable/filterable component version fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentVersionField {
    Id,
    ComponentId,
    Version,
    Repository,
}

impl SortField for ComponentVersionField {
    fn column_name(self) -> &'static str {
        match self {
            ComponentVersionField::Id => "componentversion_id",
            ComponentVersionField::ComponentId => "componentversion_component_id",
            ComponentVersionField::Version => "componentversion_version",
            ComponentVersionField::Repository => "componentversion_repository",
        }
    }

    fn from_column_name(name: &str) -> Option<Self> {
        match name {
            "componentversion_id" => Some(ComponentVersionField::Id),
            "componentversion_component_id" => Some(ComponentVersionField::ComponentId),
            "componentversion_version" => Some(ComponentVersionField::Version),
            "componentversion_repository" => Some(ComponentVersionField::Repository),
            _ => None,
        }
    }

    fn unique_field() -> Self {
        ComponentVersionField::Id
    }
}

/// Typed component version query filter
#[derive(Debug, Clone, Default)]
pub struct ComponentVersionFilter {
    pub id: Vec<i64>,
    pub component_id: Vec<i64>,
    pub version: Vec<String>,
    pub repository: Vec<String>,
    pub state: Vec<StateFilter>,
    pub first: Option<usize>,
    pub after: Option<String>,
}

impl EntityFilter for ComponentVersionFilter {
    type Field = ComponentVersionField;

    fn criteria(&self) -> Vec<FilterCriterion<ComponentVersionField>> {
        vec![
            FilterCriterion::equals(ComponentVersionField::Id, self.id.clone()),
            FilterCriterion::equals(
                ComponentVersionField::ComponentId,
                self.component_id.clone(),
            ),
            FilterCriterion::equals(ComponentVersionField::Version, self.version.clone()),
            FilterCriterion::equals(ComponentVersionField::Repository, self.repository.clone()),
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

impl Record for ComponentVersion {
    type Field = ComponentVersionField;
    type Filter = ComponentVersionFilter;

    const TABLE: &'static str = "ComponentVersion";
    const COLUMN_PREFIX: &'static str = "componentversion";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn natural_key(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Integer(self.component_id),
            FieldValue::Text(self.version.clone()),
        ]
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

    fn sort_value(&self, field: ComponentVersionField) -> FieldValue {
        match field {
            ComponentVersionField::Id => FieldValue::Integer(self.id),
            ComponentVersionField::ComponentId => FieldValue::Integer(self.component_id),
            ComponentVersionField::Version => FieldValue::Text(self.version.clone()),
            ComponentVersionField::Repository => FieldValue::Text(self.repository.clone()),
        }
    }
}

#[cfg(feature = "mariadb")]
mod sql {
    use super::ComponentVersion;
    use crate::core::field::FieldValue;
    use crate::storage::mariadb::SqlRecord;
    use sqlx::mysql::MySqlRow;
    use sqlx::{FromRow, Row};

    impl<'r> FromRow<'r, MySqlRow> for ComponentVersion {
        fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
            Ok(Self {
                id: row.try_get("componentversion_id")?,
                component_id: row.try_get("componentversion_component_id")?,
                version: row.try_get("componentversion_version")?,
                repository: row.try_get("componentversion_repository")?,
                created_at: row.try_get("componentversion_created_at")?,
                updated_at: row.try_get("componentversion_updated_at")?,
                deleted_at: row.try_get("componentversion_deleted_at")?,
            })
        }
    }

    impl SqlRecord for ComponentVersion {
        fn columns() -> &'static [&'static str] {
            &[
                "componentversion_component_id",
                "componentversion_version",
                "componentversion_repository",
            ]
        }

        fn values(&self) -> Vec<FieldValue> {
            vec![
                FieldValue::Integer(self.component_id),
                FieldValue::Text(self.version.clone()),
                FieldValue::Text(self.repository.clone()),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_key_is_component_and_version() {
        let cv = ComponentVersion::new(3, "1.2.3", "ghcr.io/acme/billing");
        assert_eq!(
            cv.natural_key(),
            vec![FieldValue::Integer(3), FieldValue::Text("1.2.3".into())]
        );
    }

    #[test]
    fn test_same_version_different_component_has_different_key() {
        let a = ComponentVersion::new(1, "2.0.0", "r");
        let b = ComponentVersion::new(2, "2.0.0", "r");
        assert_ne!(a.natural_key(), b.natural_key());
    }

    #[test]
    fn test_filter_criteria_by_component() {
        let filter = ComponentVersionFilter {
            component_id: vec![7],
            version: vec!["1.0.0".to_string()],
            ..Default::default()
        };
        assert_eq!(filter.criteria().len(), 2);
    }
}
