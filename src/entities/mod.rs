//! Entity registrations
//!
//! Each module here is a thin adapter: the struct, its field enumeration,
//! its typed filter and the `Record` wiring. All filtering, ordering,
//! pagination and uniqueness behavior comes from the generic engine.

pub mod component_version;
pub mod issue;
pub mod service;

pub use component_version::{ComponentVersion, ComponentVersionField, ComponentVersionFilter};
pub use issue::{Issue, IssueField, IssueFilter, IssueType};
pub use service::{Service, ServiceField, ServiceFilter};
