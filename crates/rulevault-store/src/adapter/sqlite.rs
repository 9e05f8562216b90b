//! SQLite-backed storage adapter.
//!
//! One table, `policy_rules (ptype, v0..v5)`, all TEXT NOT NULL with `''`
//! defaults. The adapter issues a bulk SELECT on load, single-row INSERTs,
//! and DELETEs with a `ptype =` predicate conjoined with zero or more
//! `vN =` predicates.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, params_from_iter, Connection};

use rulevault_core::error::{Result, RuleVaultError};
use rulevault_core::record::{decode, encode, PolicyRule, StoredRow, MAX_FIELDS};

use super::StorageAdapter;

const TABLE_DDL: &str = "
CREATE TABLE IF NOT EXISTS policy_rules (
    ptype TEXT NOT NULL,
    v0    TEXT NOT NULL DEFAULT '',
    v1    TEXT NOT NULL DEFAULT '',
    v2    TEXT NOT NULL DEFAULT '',
    v3    TEXT NOT NULL DEFAULT '',
    v4    TEXT NOT NULL DEFAULT '',
    v5    TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS policy_rules_ptype_idx ON policy_rules(ptype);
";

enum Location {
    Memory,
    Path(PathBuf),
}

fn resolve_url(url: &str) -> Result<Location> {
    if url == ":memory:" || url == "sqlite::memory:" {
        return Ok(Location::Memory);
    }
    if let Some(rest) = url.strip_prefix("sqlite://") {
        return Ok(Location::Path(PathBuf::from(rest)));
    }
    if url.contains("://") {
        return Err(RuleVaultError::Config(format!(
            "unsupported backend url scheme: {url}"
        )));
    }
    Ok(Location::Path(PathBuf::from(url)))
}

/// SQLite adapter holding one connection behind a mutex, so `&self`
/// methods stay safe when the handle is shared.
#[derive(Debug)]
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
}

impl SqliteAdapter {
    /// Open (or create) the backing database and ensure the table exists.
    ///
    /// Accepted url forms: a filesystem path, `sqlite://path`,
    /// `:memory:`, `sqlite::memory:`.
    pub fn open(url: &str) -> Result<Self> {
        let conn = match resolve_url(url)? {
            Location::Memory => Connection::open_in_memory(),
            Location::Path(p) => Connection::open(p),
        }
        .map_err(|e| RuleVaultError::Storage(format!("open {url} failed: {e}")))?;

        conn.execute_batch(TABLE_DDL)
            .map_err(|e| RuleVaultError::Storage(format!("create table failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RuleVaultError::Storage("connection mutex poisoned".into()))
    }
}

impl StorageAdapter for SqliteAdapter {
    fn load_all(&self) -> Result<Vec<PolicyRule>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT ptype, v0, v1, v2, v3, v4, v5 FROM policy_rules")
            .map_err(|e| RuleVaultError::Storage(format!("load query failed: {e}")))?;

        let rows = stmt
            .query_map([], |r| {
                Ok(StoredRow {
                    ptype: r.get(0)?,
                    values: [
                        r.get(1)?,
                        r.get(2)?,
                        r.get(3)?,
                        r.get(4)?,
                        r.get(5)?,
                        r.get(6)?,
                    ],
                })
            })
            .map_err(|e| RuleVaultError::Storage(format!("load query failed: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let row = row.map_err(|e| RuleVaultError::Storage(format!("load row failed: {e}")))?;
            out.push(decode(&row));
        }
        Ok(out)
    }

    fn insert(&self, ptype: &str, fields: &[String]) -> Result<()> {
        let row = encode(ptype, fields)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO policy_rules (ptype, v0, v1, v2, v3, v4, v5) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.ptype,
                row.values[0],
                row.values[1],
                row.values[2],
                row.values[3],
                row.values[4],
                row.values[5],
            ],
        )
        .map_err(|e| RuleVaultError::Storage(format!("insert failed: {e}")))?;
        Ok(())
    }

    fn delete(&self, ptype: &str, fields: &[String]) -> Result<()> {
        if fields.len() > MAX_FIELDS {
            return Err(RuleVaultError::Codec(format!(
                "cannot match {} fields, max is {MAX_FIELDS}",
                fields.len()
            )));
        }

        let mut sql = String::from("DELETE FROM policy_rules WHERE ptype = ?");
        let mut args: Vec<&str> = vec![ptype];
        for (i, v) in fields.iter().enumerate() {
            sql.push_str(&format!(" AND v{i} = ?"));
            args.push(v);
        }

        let conn = self.conn()?;
        // Zero rows affected is success, not an error.
        conn.execute(&sql, params_from_iter(args))
            .map_err(|e| RuleVaultError::Storage(format!("delete failed: {e}")))?;
        Ok(())
    }

    fn delete_filtered(
        &self,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> Result<()> {
        let mut sql = String::from("DELETE FROM policy_rules WHERE ptype = ?");
        let mut args: Vec<&str> = vec![ptype];
        for (k, v) in field_values.iter().enumerate() {
            // Positions past the record width (including index overflow)
            // are ignored; empty values act as wildcards.
            let pos = match field_index.checked_add(k) {
                Some(p) if p < MAX_FIELDS => p,
                _ => continue,
            };
            if v.is_empty() {
                continue;
            }
            sql.push_str(&format!(" AND v{pos} = ?"));
            args.push(v);
        }

        let conn = self.conn()?;
        conn.execute(&sql, params_from_iter(args))
            .map_err(|e| RuleVaultError::Storage(format!("filtered delete failed: {e}")))?;
        Ok(())
    }

    fn save_all(&self, rule_sets: &BTreeMap<String, Vec<Vec<String>>>) -> Result<()> {
        // Sequential inserts, no rollback: a failure partway leaves the
        // rows already written persisted.
        for (ptype, rules) in rule_sets {
            for fields in rules {
                self.insert(ptype, fields)?;
            }
        }
        Ok(())
    }
}
