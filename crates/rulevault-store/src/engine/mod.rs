//! Evaluation engine layer.
//!
//! The engine owns the in-memory rule sets and decides allow/deny for a
//! request. Its surface is a closed capability set: every operation the
//! vault facade can dispatch by name is a method on `EvaluationEngine`,
//! trading open-ended forwarding for a checkable interface.

pub mod rbac;

use rulevault_core::error::Result;

pub use rbac::RbacEngine;

/// Capability set of an evaluation engine.
///
/// Mutations follow the Auto-Save lifecycle: the storage adapter is
/// written through first, then the in-memory sets are updated, so rule
/// changes persist immediately rather than only on an explicit save.
pub trait EvaluationEngine: Send {
    /// Decide allow/deny for a request tuple.
    fn enforce(&self, request: &[String]) -> Result<bool>;

    /// Add one rule under `ptype`. Returns false (and writes nothing)
    /// when the rule is already present.
    fn add_policy(&mut self, ptype: &str, fields: Vec<String>) -> Result<bool>;

    /// Remove the exactly-matching rule under `ptype`. Returns false when
    /// no such rule was present.
    fn remove_policy(&mut self, ptype: &str, fields: &[String]) -> Result<bool>;

    /// Remove every rule under `ptype` matching the partial tuple
    /// starting at `field_index` (empty values are wildcards). Returns
    /// whether anything was removed.
    fn remove_filtered_policy(
        &mut self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool>;

    /// Current rules under `ptype` (empty when unknown).
    fn get_policy(&self, ptype: &str) -> Result<Vec<Vec<String>>>;

    /// Replace the in-memory sets with the stored rules.
    fn load_policy(&mut self) -> Result<()>;

    /// Write every in-memory rule to storage.
    fn save_policy(&self) -> Result<()>;

    /// Drop the in-memory sets without touching storage.
    fn clear_policy(&mut self);
}
