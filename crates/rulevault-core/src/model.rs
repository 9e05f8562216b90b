//! Model: the rule schema (recognized sections, arities, matcher text).
//!
//! Parsed once from an INI-style definition, either a file path or inline
//! text. Immutable after parsing; the store facade offers an explicit
//! reload that swaps in a freshly parsed instance.
//!
//! Recognized sections:
//! - `[request_definition]` : `r = sub, obj, act` (required)
//! - `[policy_definition]`  : `p = sub, obj, act`, `p2 = ...` (required)
//! - `[role_definition]`    : `g = _, _`, `g2 = ...` (optional)
//! - `[policy_effect]`      : effect expression text (optional)
//! - `[matchers]`           : `m = ...` matcher expression text (required)
//!
//! The matcher and effect expressions are carried verbatim; interpreting
//! them is the evaluation engine's concern, not the schema's.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, RuleVaultError};
use crate::record::MAX_FIELDS;

/// Parsed rule schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    request: Vec<String>,
    policy: BTreeMap<String, Vec<String>>,
    grouping: BTreeMap<String, usize>,
    matcher: String,
    effect: Option<String>,
}

impl Model {
    /// Parse a model from a definition file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            RuleVaultError::Config(format!("read model file {} failed: {e}", path.display()))
        })?;
        Self::from_text(&text)
    }

    /// Parse a model from inline definition text.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut section = String::new();
        let mut request: Option<Vec<String>> = None;
        let mut policy: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut grouping: BTreeMap<String, usize> = BTreeMap::new();
        let mut matcher: Option<String> = None;
        let mut effect: Option<String> = None;

        for (lineno, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix('[') {
                let name = name.strip_suffix(']').ok_or_else(|| {
                    RuleVaultError::Config(format!("line {}: unterminated section header", lineno + 1))
                })?;
                section = name.trim().to_string();
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                RuleVaultError::Config(format!("line {}: expected `key = value`", lineno + 1))
            })?;
            let key = key.trim();
            let value = value.trim();

            match section.as_str() {
                "request_definition" => {
                    if key != "r" {
                        return Err(RuleVaultError::Config(format!(
                            "request_definition key must be `r`, got `{key}`"
                        )));
                    }
                    if request.is_some() {
                        return Err(RuleVaultError::Config("duplicate `r` definition".into()));
                    }
                    request = Some(split_tokens(value));
                }
                "policy_definition" => {
                    if !key.starts_with('p') {
                        return Err(RuleVaultError::Config(format!(
                            "policy_definition key must start with `p`, got `{key}`"
                        )));
                    }
                    let tokens = split_tokens(value);
                    check_arity(key, tokens.len())?;
                    if policy.insert(key.to_string(), tokens).is_some() {
                        return Err(RuleVaultError::Config(format!(
                            "duplicate `{key}` definition"
                        )));
                    }
                }
                "role_definition" => {
                    if !key.starts_with('g') {
                        return Err(RuleVaultError::Config(format!(
                            "role_definition key must start with `g`, got `{key}`"
                        )));
                    }
                    let arity = split_tokens(value).len();
                    check_arity(key, arity)?;
                    if grouping.insert(key.to_string(), arity).is_some() {
                        return Err(RuleVaultError::Config(format!(
                            "duplicate `{key}` definition"
                        )));
                    }
                }
                "policy_effect" => {
                    if key != "e" {
                        return Err(RuleVaultError::Config(format!(
                            "policy_effect key must be `e`, got `{key}`"
                        )));
                    }
                    if effect.is_some() {
                        return Err(RuleVaultError::Config("duplicate `e` definition".into()));
                    }
                    effect = Some(value.to_string());
                }
                "matchers" => {
                    if key != "m" {
                        return Err(RuleVaultError::Config(format!(
                            "matchers key must be `m`, got `{key}`"
                        )));
                    }
                    if matcher.is_some() {
                        return Err(RuleVaultError::Config("duplicate `m` definition".into()));
                    }
                    matcher = Some(value.to_string());
                }
                other => {
                    return Err(RuleVaultError::Config(format!(
                        "line {}: unrecognized section `{other}`",
                        lineno + 1
                    )));
                }
            }
        }

        let request =
            request.ok_or_else(|| RuleVaultError::Config("missing [request_definition]".into()))?;
        if policy.is_empty() {
            return Err(RuleVaultError::Config("missing [policy_definition]".into()));
        }
        let matcher =
            matcher.ok_or_else(|| RuleVaultError::Config("missing [matchers]".into()))?;

        Ok(Self {
            request,
            policy,
            grouping,
            matcher,
            effect,
        })
    }

    /// Declared arity of a ptype, or None if the schema does not know it.
    pub fn arity_of(&self, ptype: &str) -> Option<usize> {
        self.policy
            .get(ptype)
            .map(Vec::len)
            .or_else(|| self.grouping.get(ptype).copied())
    }

    /// Whether the ptype names a grouping/role section.
    pub fn is_grouping(&self, ptype: &str) -> bool {
        self.grouping.contains_key(ptype)
    }

    /// Recognized permission ptypes (`p`, `p2`, ...).
    pub fn policy_ptypes(&self) -> impl Iterator<Item = &str> {
        self.policy.keys().map(String::as_str)
    }

    /// Recognized grouping ptypes (`g`, `g2`, ...).
    pub fn grouping_ptypes(&self) -> impl Iterator<Item = &str> {
        self.grouping.keys().map(String::as_str)
    }

    /// Request token list (`r = sub, obj, act`).
    pub fn request_tokens(&self) -> &[String] {
        &self.request
    }

    /// Matcher expression text, carried verbatim.
    pub fn matcher(&self) -> &str {
        &self.matcher
    }

    /// Effect expression text, if the schema declared one.
    pub fn effect(&self) -> Option<&str> {
        self.effect.as_deref()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn split_tokens(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn check_arity(key: &str, arity: usize) -> Result<()> {
    if arity == 0 {
        return Err(RuleVaultError::Config(format!("section `{key}` declares no fields")));
    }
    if arity > MAX_FIELDS {
        return Err(RuleVaultError::Config(format!(
            "section `{key}` declares {arity} fields, max is {MAX_FIELDS}"
        )));
    }
    Ok(())
}
