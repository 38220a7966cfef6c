//! Storage backend implementations
//!
//! The in-memory backend is always available and doubles as the reference
//! implementation of the engine's semantics; the MariaDB backend executes
//! the same statements against a real pool and is gated behind the
//! `mariadb` feature.

pub mod in_memory;

#[cfg(feature = "mariadb")]
pub mod mariadb;

pub use in_memory::InMemoryStore;

#[cfg(feature = "mariadb")]
pub use mariadb::{MariaDbStore, SqlRecord};
