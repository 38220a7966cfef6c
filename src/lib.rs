//! # Vigil
//!
//! Core engine for a vulnerability-tracking inventory backend: security
//! issues, affected services and component versions over soft-delete
//! storage.
//!
//! ## Features
//!
//! - **Composable Filtering**: typed multi-value criteria, OR within a
//!   criterion, AND across criteria, values always bound out-of-band
//! - **Lifecycle State Filtering**: Active/Deleted visibility centralized
//!   over a shared `deleted_at` marker
//! - **Total Ordering**: caller-supplied (field, direction) sequences with
//!   the unique id appended as an invisible tie-breaker
//! - **Cursor Pagination**: opaque, URL-safe, self-describing tokens that
//!   round-trip the boundary tuple exactly and fail cleanly on mismatch
//! - **Uniqueness Under Soft-Delete**: natural keys are unique among Active
//!   rows only; deletion releases the key while preserving history
//! - **Pluggable Storage**: in-memory reference backend, MariaDB backend
//!   behind the `mariadb` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vigil::prelude::*;
//!
//! let store: InMemoryStore<Issue> = InMemoryStore::new();
//! store.create(Issue::new("CVE-2024-3094", IssueType::Vulnerability, "xz backdoor")).await?;
//!
//! let filter = IssueFilter { search: vec!["2024".into()], first: Some(50), ..Default::default() };
//! let page = store.list(&filter, &[Order::desc(IssueField::PrimaryName)]).await?;
//!
//! // Resume exactly after the last row of this page:
//! let next = IssueFilter { after: page.last_cursor().map(String::from), ..filter.clone() };
//! let page2 = store.list(&next, &[Order::desc(IssueField::PrimaryName)]).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod logging;
pub mod query;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        entity::{Record, SortField},
        error::{
            ConstraintError, InputError, NotFoundError, StorageError, VigilError, VigilResult,
        },
        field::FieldValue,
        service::{EntityFilter, EntityStore},
    };

    // === Query Engine ===
    pub use crate::query::{
        cursor::{decode_cursor, encode_cursor, CursorField},
        filter::{FilterCriterion, MatchMode},
        order::{Order, OrderDirection},
        state::StateFilter,
        window::{Page, PageEntry, QueryWindow, Statement},
    };

    // === Entities ===
    pub use crate::entities::{
        ComponentVersion, ComponentVersionField, ComponentVersionFilter, Issue, IssueField,
        IssueFilter, IssueType, Service, ServiceField, ServiceFilter,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "mariadb")]
    pub use crate::storage::{MariaDbStore, SqlRecord};

    // === Config ===
    pub use crate::config::{VigilConfig, DEFAULT_PAGE_SIZE};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
}
