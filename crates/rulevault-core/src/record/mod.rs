//! Rule record module (logical rule + fixed-width stored row).
//!
//! This module hosts the two forms a policy rule takes:
//! - `PolicyRule`: the logical form, a ptype tag plus 0..=6 string fields.
//! - `StoredRow`: the persisted form, ptype plus exactly six positional
//!   values with empty string meaning "unset".
//!
//! The codec between the two is panic-free and pure: arity violations are
//! reported as `RuleVaultError::Codec` instead of truncating or panicking.

pub mod codec;

pub use codec::{decode, encode, PolicyRule, StoredRow, MAX_FIELDS};
