//! MariaDB storage backend using sqlx.
//!
//! Executes the statements produced by the query engine against a MySQL/
//! MariaDB pool. Each operation borrows one pooled connection for the
//! duration of a single statement and releases it on every exit path.
//!
//! Uniqueness of natural keys is enforced by the database's partial unique
//! constraint; this module only translates the resulting violation into the
//! engine's error taxonomy. The application never attempts a
//! check-then-insert of its own — two concurrent creates would race between
//! check and insert, so the index is the arbiter.
//!
//! # Feature flag
//!
//! This module is gated behind the `mariadb` feature flag:
//! ```toml
//! [dependencies]
//! vigil-rs = { version = "0.1", features = ["mariadb"] }
//! ```

use crate::config::DatabaseConfig;
use crate::core::entity::Record;
use crate::core::error::{
    ConstraintError, NotFoundError, StorageError, VigilError, VigilResult,
};
use crate::core::field::FieldValue;
use crate::core::service::EntityStore;
use crate::query::cursor::encode_cursor;
use crate::query::order::Order;
use crate::query::window::{Page, PageEntry, QueryWindow, Statement};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{FromRow, Row};
use std::marker::PhantomData;

const BACKEND: &str = "mariadb";

/// Column mapping an entity contributes to the SQL backend.
///
/// `columns()` lists the writable columns in declaration order, excluding
/// the generated id and the timestamp columns (those are maintained by the
/// schema's defaults and by this backend); `values()` returns the matching
/// bound values.
pub trait SqlRecord: Record + for<'r> FromRow<'r, MySqlRow> + Unpin {
    fn columns() -> &'static [&'static str];

    fn values(&self) -> Vec<FieldValue>;
}

/// Entity store backed by MariaDB via `sqlx::MySqlPool`
#[derive(Clone, Debug)]
pub struct MariaDbStore<T> {
    pool: MySqlPool,
    _marker: PhantomData<T>,
}

impl<T> MariaDbStore<T> {
    /// Create a new store over an existing connection pool
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

/// Open a connection pool from the configured database settings
pub async fn connect(config: &DatabaseConfig) -> VigilResult<MySqlPool> {
    let url = format!(
        "mysql://{}:{}@{}:{}/{}",
        config.user, config.password, config.address, config.port, config.name
    );
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&url)
        .await
        .map_err(|e| {
            VigilError::Storage(StorageError::Connection {
                backend: BACKEND,
                message: e.to_string(),
            })
        })
}

impl<T: SqlRecord> MariaDbStore<T> {
    async fn fetch_rows(&self, stmt: &Statement) -> VigilResult<Vec<MySqlRow>> {
        let mut query = sqlx::query(&stmt.sql);
        for value in &stmt.params {
            query = bind_value(query, value);
        }
        query.fetch_all(&self.pool).await.map_err(storage_error)
    }
}

#[async_trait]
impl<T: SqlRecord> EntityStore<T> for MariaDbStore<T> {
    async fn create(&self, mut entity: T) -> VigilResult<T> {
        let sql = insert_sql(T::TABLE, T::columns());
        let mut query = sqlx::query(&sql);
        for value in entity.values() {
            query = bind_value(query, &value);
        }

        let key = render_key(&entity.natural_key());
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| constraint_or_storage_error(e, T::TABLE, key))?;

        let now = Utc::now();
        entity.set_id(result.last_insert_id() as i64);
        entity.set_created_at(now);
        entity.set_updated_at(now);
        entity.set_deleted_at(None);
        tracing::debug!(table = T::TABLE, id = entity.id(), "performed insert");
        Ok(entity)
    }

    async fn get(&self, id: i64) -> VigilResult<Option<T>> {
        let sql = get_sql(T::TABLE, T::COLUMN_PREFIX);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        row.map(|r| T::from_row(&r).map_err(storage_error)).transpose()
    }

    async fn update(&self, mut entity: T) -> VigilResult<T> {
        let id = entity.id();
        if self.get(id).await?.is_none() {
            return Err(NotFoundError {
                entity: T::TABLE,
                id,
            }
            .into());
        }

        let now = Utc::now();
        let sql = update_sql(T::TABLE, T::COLUMN_PREFIX, T::columns());
        let mut query = sqlx::query(&sql);
        for value in entity.values() {
            query = bind_value(query, &value);
        }
        query = query.bind(now).bind(id);

        let key = render_key(&entity.natural_key());
        query
            .execute(&self.pool)
            .await
            .map_err(|e| constraint_or_storage_error(e, T::TABLE, key))?;

        entity.set_updated_at(now);
        entity.set_deleted_at(None);
        tracing::debug!(table = T::TABLE, id, "performed update");
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> VigilResult<()> {
        let sql = delete_sql(T::TABLE, T::COLUMN_PREFIX);
        let result = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: T::TABLE,
                id,
            }
            .into());
        }
        tracing::debug!(table = T::TABLE, id, "soft-deleted row");
        Ok(())
    }

    async fn list(&self, filter: &T::Filter, order: &[Order<T::Field>]) -> VigilResult<Page<T>> {
        let window = QueryWindow::<T>::new(filter, order)?;
        let rows = self.fetch_rows(&window.select()).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let entity = T::from_row(row).map_err(storage_error)?;
            let cursor = encode_cursor(window.order(), &entity)?;
            entries.push(PageEntry { entity, cursor });
        }

        tracing::debug!(table = T::TABLE, count = entries.len(), "list scan complete");
        Ok(Page { entries })
    }

    async fn count(&self, filter: &T::Filter) -> VigilResult<i64> {
        let window = QueryWindow::<T>::unbounded(filter, &[]);
        let stmt = window.count();
        let mut query = sqlx::query(&stmt.sql);
        for value in &stmt.params {
            query = bind_value(query, value);
        }
        let row = query.fetch_one(&self.pool).await.map_err(storage_error)?;
        row.try_get::<i64, _>(0).map_err(storage_error)
    }

    async fn list_ids(
        &self,
        filter: &T::Filter,
        order: &[Order<T::Field>],
    ) -> VigilResult<Vec<i64>> {
        let window = QueryWindow::<T>::unbounded(filter, order);
        let rows = self.fetch_rows(&window.ids()).await?;
        rows.iter()
            .map(|row| row.try_get::<i64, _>(0).map_err(storage_error))
            .collect()
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &FieldValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        FieldValue::Null => query.bind(None::<i64>),
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Time(t) => query.bind(*t),
    }
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders: Vec<&str> = std::iter::repeat_n("?", columns.len()).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn update_sql(table: &str, prefix: &str, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();
    format!(
        "UPDATE {} SET {}, {}_updated_at = ? WHERE {}_id = ?",
        table,
        assignments.join(", "),
        prefix,
        prefix
    )
}

fn delete_sql(table: &str, prefix: &str) -> String {
    format!(
        "UPDATE {} SET {}_deleted_at = ? WHERE {}_id = ? AND {}_deleted_at IS NULL",
        table, prefix, prefix, prefix
    )
}

fn get_sql(table: &str, prefix: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {}_id = ? AND {}_deleted_at IS NULL",
        table, prefix, prefix
    )
}

fn render_key(key: &[FieldValue]) -> String {
    key.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// Translate a database fault, recognizing unique-index violations.
///
/// The violation is surfaced verbatim as a constraint error (never swallowed,
/// never retried); everything else propagates as a storage fault.
fn constraint_or_storage_error(err: sqlx::Error, entity: &'static str, key: String) -> VigilError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ConstraintError::UniqueViolation { entity, key }.into()
        }
        _ => storage_error(err),
    }
}

fn storage_error(err: sqlx::Error) -> VigilError {
    let storage = match &err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StorageError::Connection {
                backend: BACKEND,
                message: err.to_string(),
            }
        }
        _ => StorageError::Query {
            backend: BACKEND,
            message: err.to_string(),
        },
    };
    storage.into()
}
