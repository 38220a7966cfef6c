//! Core module containing fundamental traits and types for the engine

pub mod entity;
pub mod error;
pub mod field;
pub mod service;

pub use entity::{Record, SortField};
pub use error::{
    ConstraintError, InputError, NotFoundError, StorageError, VigilError, VigilResult,
};
pub use field::FieldValue;
pub use service::{EntityFilter, EntityStore};
