//! Typed error handling for the vigil core
//!
//! Every error surfaced by the engine falls into one of four categories that
//! callers can distinguish without string matching:
//!
//! - [`InputError`]: malformed or mismatched caller input (bad cursor,
//!   unknown field), rejected before any statement executes
//! - [`ConstraintError`]: natural-key uniqueness violations on create/update
//! - [`NotFoundError`]: operations targeting a nonexistent or
//!   already-deleted identifier
//! - [`StorageError`]: faults from the storage backend, propagated
//!   uninterpreted (no retry is attempted inside the core)
//!
//! # Example
//!
//! ```rust,ignore
//! match store.create(issue).await {
//!     Ok(created) => println!("created #{}", created.id()),
//!     Err(VigilError::Constraint(ConstraintError::UniqueViolation { key, .. })) => {
//!         println!("an active row already holds key {}", key);
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for the vigil core
#[derive(Debug, Error)]
pub enum VigilError {
    /// Malformed caller input, rejected before any query executes
    #[error(transparent)]
    Input(#[from] InputError),

    /// Natural-key uniqueness violation
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// Target row does not exist in the addressed state
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Storage backend fault
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl VigilError {
    /// Get the stable error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            VigilError::Input(e) => e.error_code(),
            VigilError::Constraint(e) => e.error_code(),
            VigilError::NotFound(_) => "NOT_FOUND",
            VigilError::Storage(e) => e.error_code(),
        }
    }
}

// =============================================================================
// Input Errors
// =============================================================================

/// Errors caused by malformed caller input
#[derive(Debug, Error)]
pub enum InputError {
    /// The cursor token could not be decoded.
    ///
    /// A bad token is never treated as "no cursor": callers need to
    /// distinguish a first-page request from a corrupted one.
    #[error("malformed cursor token: {message}")]
    MalformedCursor { message: String },

    /// The cursor's field tuple does not match the order specification of
    /// the current query
    #[error("cursor does not match the requested order (expected [{expected}], got [{found}])")]
    CursorMismatch { expected: String, found: String },

    /// A cursor or filter referenced a column this entity does not expose
    #[error("unknown field '{name}' for {entity}")]
    UnknownField {
        entity: &'static str,
        name: String,
    },
}

impl InputError {
    pub fn error_code(&self) -> &'static str {
        match self {
            InputError::MalformedCursor { .. } => "MALFORMED_CURSOR",
            InputError::CursorMismatch { .. } => "CURSOR_MISMATCH",
            InputError::UnknownField { .. } => "UNKNOWN_FIELD",
        }
    }
}

// =============================================================================
// Constraint Errors
// =============================================================================

/// Natural-key uniqueness violations, surfaced verbatim from the storage
/// arbiter (never swallowed, never retried)
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// An Active row already holds this natural key
    #[error("{entity} with key '{key}' already exists")]
    UniqueViolation { entity: &'static str, key: String },
}

impl ConstraintError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConstraintError::UniqueViolation { .. } => "DUPLICATE_ENTRY",
        }
    }
}

// =============================================================================
// Not-Found Errors
// =============================================================================

/// The addressed row does not exist, or is not visible in the addressed
/// state (e.g. deleting an already-deleted row)
#[derive(Debug, Error)]
#[error("{entity} with id '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: i64,
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Faults from the storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection-level failure (includes timeouts; transient from the
    /// caller's perspective, but the core performs no retry)
    #[error("failed to connect to {backend}: {message}")]
    Connection { backend: &'static str, message: String },

    /// Statement execution failure
    #[error("{backend} query error: {message}")]
    Query { backend: &'static str, message: String },

    /// Row or cursor payload could not be (de)serialized
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::Connection { .. } => "STORAGE_CONNECTION_ERROR",
            StorageError::Query { .. } => "STORAGE_QUERY_ERROR",
            StorageError::Serialization { .. } => "STORAGE_SERIALIZATION_ERROR",
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for vigil operations
pub type VigilResult<T> = Result<T, VigilError>;
