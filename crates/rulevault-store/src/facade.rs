//! Policy vault facade.
//!
//! Owns the model, the storage adapter, and a lazily constructed engine
//! instance, and exposes the engine's capability set by name through
//! `dispatch`. One vault per logical request/session is the expected
//! usage; the engine handle it returns is an `Arc<Mutex<_>>` so it stays
//! safe once handed across threads.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use rulevault_core::error::{Result, RuleVaultError};
use rulevault_core::model::Model;

use crate::adapter::{SqliteAdapter, StorageAdapter};
use crate::config::{AdapterClass, Config, ModelSource};
use crate::engine::{EvaluationEngine, RbacEngine};

/// Shared handle to a constructed engine.
pub type EngineHandle = Arc<Mutex<dyn EvaluationEngine>>;

/// Facade over model, adapter, and the cached evaluation engine.
///
/// Engine lifecycle: none until the first `engine()` or `dispatch()` call;
/// `engine(true)` replaces the cached instance; no teardown beyond the
/// vault's own drop.
pub struct PolicyVault {
    model: Arc<Model>,
    source: ModelSource,
    adapter: Arc<dyn StorageAdapter>,
    log_enable: bool,
    engine: Option<EngineHandle>,
}

impl std::fmt::Debug for PolicyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyVault")
            .field("source", &self.source)
            .field("log_enable", &self.log_enable)
            .finish_non_exhaustive()
    }
}

impl PolicyVault {
    /// Build the vault from a validated config: construct the adapter
    /// named by `adapter_class`, load the model from file or text.
    pub fn new(cfg: &Config) -> Result<Self> {
        cfg.validate()?;

        let adapter: Arc<dyn StorageAdapter> = match cfg.adapter_class {
            AdapterClass::Sqlite => Arc::new(SqliteAdapter::open(&cfg.url)?),
        };

        let source = cfg.model_source()?;
        let model = Arc::new(load_model(&source)?);

        Ok(Self {
            model,
            source,
            adapter,
            log_enable: cfg.log_enable,
            engine: None,
        })
    }

    /// Return the cached engine, constructing it first if absent or if
    /// `force_new` is set. New instances load the stored rules before
    /// being returned.
    pub fn engine(&mut self, force_new: bool) -> Result<EngineHandle> {
        if !force_new {
            if let Some(e) = &self.engine {
                return Ok(Arc::clone(e));
            }
        }

        let mut engine = RbacEngine::new(
            Arc::clone(&self.model),
            Arc::clone(&self.adapter),
            self.log_enable,
        );
        engine.load_policy()?;

        let handle: EngineHandle = Arc::new(Mutex::new(engine));
        self.engine = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Re-parse the model from its original source. Takes effect for
    /// engines constructed afterwards (`engine(true)`); the cached engine
    /// keeps the model it was built with.
    pub fn reload_model(&mut self) -> Result<()> {
        self.model = Arc::new(load_model(&self.source)?);
        Ok(())
    }

    /// Invoke an engine capability by name, constructing the engine first
    /// if absent. Arguments and results cross as JSON values; errors from
    /// the engine and adapter pass through unchanged.
    pub fn dispatch(&mut self, op: &str, args: &[Value]) -> Result<Value> {
        let handle = self.engine(false)?;
        let mut engine = handle
            .lock()
            .map_err(|_| RuleVaultError::Storage("engine mutex poisoned".into()))?;

        match op {
            "enforce" => {
                let request = string_args(op, args)?;
                Ok(Value::Bool(engine.enforce(&request)?))
            }
            "addPolicy" => {
                let fields = string_args(op, args)?;
                Ok(Value::Bool(engine.add_policy("p", fields)?))
            }
            "removePolicy" => {
                let fields = string_args(op, args)?;
                Ok(Value::Bool(engine.remove_policy("p", &fields)?))
            }
            "removeFilteredPolicy" => {
                let (index, values) = filter_args(op, args)?;
                Ok(Value::Bool(engine.remove_filtered_policy("p", index, &values)?))
            }
            "addGroupingPolicy" => {
                let fields = string_args(op, args)?;
                Ok(Value::Bool(engine.add_policy("g", fields)?))
            }
            "removeGroupingPolicy" => {
                let fields = string_args(op, args)?;
                Ok(Value::Bool(engine.remove_policy("g", &fields)?))
            }
            "removeFilteredGroupingPolicy" => {
                let (index, values) = filter_args(op, args)?;
                Ok(Value::Bool(engine.remove_filtered_policy("g", index, &values)?))
            }
            "getPolicy" => Ok(json!(engine.get_policy("p")?)),
            "getGroupingPolicy" => Ok(json!(engine.get_policy("g")?)),
            "loadPolicy" => {
                engine.load_policy()?;
                Ok(Value::Null)
            }
            "savePolicy" => {
                engine.save_policy()?;
                Ok(Value::Null)
            }
            "clearPolicy" => {
                engine.clear_policy();
                Ok(Value::Null)
            }
            other => Err(RuleVaultError::UnknownOperation(other.to_string())),
        }
    }
}

fn load_model(source: &ModelSource) -> Result<Model> {
    match source {
        ModelSource::File(path) => Model::from_file(path),
        ModelSource::Text(text) => Model::from_text(text),
    }
}

fn string_args(op: &str, args: &[Value]) -> Result<Vec<String>> {
    args.iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                RuleVaultError::InvalidArgument(format!("{op}: expected string argument, got {v}"))
            })
        })
        .collect()
}

/// First argument is the field index, the rest are the filter values.
fn filter_args(op: &str, args: &[Value]) -> Result<(usize, Vec<String>)> {
    let (first, rest) = args.split_first().ok_or_else(|| {
        RuleVaultError::InvalidArgument(format!("{op}: missing field index argument"))
    })?;
    let index = first
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            RuleVaultError::InvalidArgument(format!("{op}: field index must be an integer, got {first}"))
        })?;
    Ok((index, string_args(op, rest)?))
}
