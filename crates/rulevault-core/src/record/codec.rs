//! Rule record codec (panic-free).
//!
//! Codec rules:
//! - Encoding pads missing trailing fields with `""`, never null.
//! - Decoding trims *trailing* empty values only. Embedded empty fields
//!   survive a round trip; a legitimately-empty trailing field does not
//!   (it is indistinguishable from "unset" in the fixed-width row).

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleVaultError};

/// Fixed width of the stored record: v0..v5.
pub const MAX_FIELDS: usize = 6;

/// Logical policy rule: ptype tag plus ordered fields.
///
/// `ptype` distinguishes permission rules (`p`, `p2`, ...) from
/// grouping/role rules (`g`, `g2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
    pub ptype: String,
    pub fields: Vec<String>,
}

/// Persisted form of a rule: `(ptype, v0..v5)`, empty string = unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    pub ptype: String,
    pub values: [String; MAX_FIELDS],
}

/// Encode a rule into a fixed-width row.
///
/// Fields beyond the provided arity persist as empty strings.
pub fn encode(ptype: &str, fields: &[String]) -> Result<StoredRow> {
    if fields.len() > MAX_FIELDS {
        return Err(RuleVaultError::Codec(format!(
            "cannot encode {} fields, max is {MAX_FIELDS}",
            fields.len()
        )));
    }

    let mut values: [String; MAX_FIELDS] = Default::default();
    for (i, f) in fields.iter().enumerate() {
        values[i].clone_from(f);
    }

    Ok(StoredRow {
        ptype: ptype.to_string(),
        values,
    })
}

/// Decode a fixed-width row back into a rule.
///
/// Only trailing empty values are dropped. An empty value *between*
/// non-empty ones is kept as a real field; callers that persisted a rule
/// with an empty trailing field get the shorter arity back.
pub fn decode(row: &StoredRow) -> PolicyRule {
    let arity = row
        .values
        .iter()
        .rposition(|v| !v.is_empty())
        .map_or(0, |i| i + 1);

    PolicyRule {
        ptype: row.ptype.clone(),
        fields: row.values[..arity].to_vec(),
    }
}
