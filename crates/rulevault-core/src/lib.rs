//! rulevault core: rule record codec, model schema, and error types.
//!
//! This crate defines the storage-independent contracts shared by the
//! store crate and by embedders: the logical and persisted forms of a
//! policy rule, the model (rule schema) parser, and the error surface.
//! It intentionally carries no I/O or backend dependencies so it can be
//! reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RuleVaultError`/`Result` so
//! embedding processes do not crash on malformed schemas or rules.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod record;

/// Shared result type.
pub use error::{Result, RuleVaultError};
pub use model::Model;
pub use record::{PolicyRule, StoredRow, MAX_FIELDS};
