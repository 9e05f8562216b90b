//! rulevault store library entry.
//!
//! This crate wires the config loader, relational storage adapter,
//! evaluation engine, and the policy vault facade into a cohesive stack.
//! It is intended to be consumed by embedders and by integration tests.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod facade;

pub use adapter::{SqliteAdapter, StorageAdapter};
pub use config::{AdapterClass, Config, ModelConfigType};
pub use engine::{EvaluationEngine, RbacEngine};
pub use facade::PolicyVault;
