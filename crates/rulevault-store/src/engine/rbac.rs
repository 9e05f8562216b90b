//! Built-in reference engine: subject/role matching with write-through
//! persistence.
//!
//! Matching semantics: a request matches a permission rule when every
//! position is equal, the rule holds `*`, or a transitive grouping (`g`)
//! link connects the request value to the rule value. The model's
//! matcher expression text is carried but not interpreted; embedders
//! needing a full expression language plug their own `EvaluationEngine`
//! behind the trait.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use rulevault_core::error::{Result, RuleVaultError};
use rulevault_core::model::Model;
use rulevault_core::record::MAX_FIELDS;

use crate::adapter::StorageAdapter;

use super::EvaluationEngine;

/// Reference evaluation engine.
///
/// Holds the rule sets in memory, keyed by ptype, mirroring storage after
/// `load_policy`. Mutations write through the adapter before touching the
/// in-memory sets (Auto-Save).
pub struct RbacEngine {
    model: Arc<Model>,
    adapter: Arc<dyn StorageAdapter>,
    rules: BTreeMap<String, Vec<Vec<String>>>,
    log: bool,
}

impl RbacEngine {
    pub fn new(model: Arc<Model>, adapter: Arc<dyn StorageAdapter>, log: bool) -> Self {
        Self {
            model,
            adapter,
            rules: BTreeMap::new(),
            log,
        }
    }

    /// Check a mutation against the schema: known ptype, arity within the
    /// declared width.
    fn validate(&self, ptype: &str, len: usize) -> Result<()> {
        let arity = self.model.arity_of(ptype).ok_or_else(|| {
            RuleVaultError::InvalidArgument(format!("ptype `{ptype}` not declared by the model"))
        })?;
        if len == 0 {
            return Err(RuleVaultError::Codec("rule must have at least one field".into()));
        }
        if len > arity {
            return Err(RuleVaultError::Codec(format!(
                "rule has {len} fields, section `{ptype}` declares {arity}"
            )));
        }
        Ok(())
    }

    /// Transitive grouping-link check across every `g*` section.
    fn has_role_link(&self, member: &str, role: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        seen.insert(member);
        queue.push_back(member);

        while let Some(cur) = queue.pop_front() {
            for g in self.model.grouping_ptypes() {
                let Some(rules) = self.rules.get(g) else {
                    continue;
                };
                for r in rules {
                    if r.len() < 2 || r[0] != cur {
                        continue;
                    }
                    if r[1] == role {
                        return true;
                    }
                    if seen.insert(r[1].as_str()) {
                        queue.push_back(r[1].as_str());
                    }
                }
            }
        }
        false
    }

    fn value_matches(&self, req: &str, pattern: &str) -> bool {
        pattern == "*" || req == pattern || self.has_role_link(req, pattern)
    }

    fn rule_matches(&self, request: &[String], rule: &[String]) -> bool {
        request.iter().enumerate().all(|(i, req)| {
            let pattern = rule.get(i).map_or("", String::as_str);
            self.value_matches(req, pattern)
        })
    }

    /// Section consulted by `enforce`: `p` by convention, else the first
    /// declared policy section.
    fn enforce_ptype(&self) -> Result<String> {
        if self.model.arity_of("p").is_some() && !self.model.is_grouping("p") {
            return Ok("p".to_string());
        }
        self.model
            .policy_ptypes()
            .next()
            .map(str::to_string)
            .ok_or_else(|| RuleVaultError::Config("model declares no policy section".into()))
    }
}

/// Partial-tuple match with the same wildcard semantics as the adapter's
/// filtered delete.
fn filter_matches(fields: &[String], field_index: usize, field_values: &[String]) -> bool {
    field_values.iter().enumerate().all(|(k, v)| {
        // Out-of-range positions (including index overflow) are ignored.
        let pos = match field_index.checked_add(k) {
            Some(p) if p < MAX_FIELDS => p,
            _ => return true,
        };
        if v.is_empty() {
            return true;
        }
        fields.get(pos).map_or("", String::as_str) == v
    })
}

impl EvaluationEngine for RbacEngine {
    fn enforce(&self, request: &[String]) -> Result<bool> {
        let expected = self.model.request_tokens().len();
        if request.len() != expected {
            return Err(RuleVaultError::InvalidArgument(format!(
                "request has {} values, model declares {expected}",
                request.len()
            )));
        }

        let ptype = self.enforce_ptype()?;
        let allowed = self
            .rules
            .get(&ptype)
            .is_some_and(|rules| rules.iter().any(|r| self.rule_matches(request, r)));

        if self.log {
            tracing::info!(request = ?request, allowed, "enforce");
        }
        Ok(allowed)
    }

    fn add_policy(&mut self, ptype: &str, fields: Vec<String>) -> Result<bool> {
        self.validate(ptype, fields.len())?;

        if self.rules.get(ptype).is_some_and(|set| set.contains(&fields)) {
            return Ok(false);
        }

        self.adapter.insert(ptype, &fields)?;
        if self.log {
            tracing::debug!(ptype, rule = ?fields, "add_policy");
        }
        self.rules.entry(ptype.to_string()).or_default().push(fields);
        Ok(true)
    }

    fn remove_policy(&mut self, ptype: &str, fields: &[String]) -> Result<bool> {
        self.validate(ptype, fields.len())?;

        self.adapter.delete(ptype, fields)?;
        let removed = match self.rules.get_mut(ptype) {
            Some(set) => {
                let before = set.len();
                set.retain(|r| r != fields);
                set.len() != before
            }
            None => false,
        };
        if self.log {
            tracing::debug!(ptype, rule = ?fields, removed, "remove_policy");
        }
        Ok(removed)
    }

    fn remove_filtered_policy(
        &mut self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<bool> {
        self.adapter.delete_filtered(ptype, field_index, field_values)?;
        let removed = match self.rules.get_mut(ptype) {
            Some(set) => {
                let before = set.len();
                set.retain(|r| !filter_matches(r, field_index, field_values));
                set.len() != before
            }
            None => false,
        };
        if self.log {
            tracing::debug!(ptype, field_index, values = ?field_values, removed, "remove_filtered_policy");
        }
        Ok(removed)
    }

    fn get_policy(&self, ptype: &str) -> Result<Vec<Vec<String>>> {
        Ok(self.rules.get(ptype).cloned().unwrap_or_default())
    }

    fn load_policy(&mut self) -> Result<()> {
        let stored = self.adapter.load_all()?;
        self.rules.clear();
        for rule in stored {
            if self.model.arity_of(&rule.ptype).is_none() {
                tracing::warn!(ptype = %rule.ptype, "stored rule ptype not declared by the model, skipping");
                continue;
            }
            self.rules.entry(rule.ptype).or_default().push(rule.fields);
        }
        Ok(())
    }

    fn save_policy(&self) -> Result<()> {
        self.adapter.save_all(&self.rules)
    }

    fn clear_policy(&mut self) {
        self.rules.clear();
    }
}
