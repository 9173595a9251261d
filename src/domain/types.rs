//! Shared domain enumerations aligned with persisted database enums.

pub use libris_api_types::Role;
