//! Storage adapter layer.
//!
//! The adapter contract is the Auto-Save lifecycle of the evaluation
//! engine: bulk load, single insert, exact-match delete, filtered bulk
//! delete, and per-ptype bulk save. Every mutation the engine performs
//! flows through exactly this capability set, so backends are swappable
//! behind the trait.

pub mod sqlite;

use std::collections::BTreeMap;

use rulevault_core::error::Result;
use rulevault_core::record::PolicyRule;

pub use sqlite::SqliteAdapter;

/// Relational storage contract for policy rules.
///
/// Implementations hold one backend connection; methods block on backend
/// I/O and define no timeout of their own. Zero rows affected by a delete
/// is success, not an error.
pub trait StorageAdapter: Send + Sync {
    /// Read every stored rule, in storage-read order. Callers must not
    /// depend on ordering beyond the backend default.
    fn load_all(&self) -> Result<Vec<PolicyRule>>;

    /// Encode and insert one rule.
    fn insert(&self, ptype: &str, fields: &[String]) -> Result<()>;

    /// Delete rules matching `ptype` and, for each provided position `i`,
    /// `v_i = fields[i]` exactly. Exact-match on the full provided tuple,
    /// not a prefix or pattern match.
    fn delete(&self, ptype: &str, fields: &[String]) -> Result<()>;

    /// Delete rules matching `ptype` and `v(field_index + k) = field_values[k]`
    /// for each non-empty value. Empty values act as wildcards; positions
    /// outside `[0, 5]` are ignored.
    fn delete_filtered(&self, ptype: &str, field_index: usize, field_values: &[String])
        -> Result<()>;

    /// Insert every rule under every ptype, sequentially.
    ///
    /// Not transactional: a failure at row k leaves rows 1..k-1 persisted.
    /// Callers needing atomicity must wrap this in their own transaction
    /// scope.
    fn save_all(&self, rule_sets: &BTreeMap<String, Vec<Vec<String>>>) -> Result<()>;
}
