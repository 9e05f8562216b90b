use std::path::PathBuf;

use serde::Deserialize;

use rulevault_core::error::{Result, RuleVaultError};

/// Recognized vault options. Immutable after construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Which storage backend to instantiate.
    pub adapter_class: AdapterClass,

    /// Backend connection string.
    pub url: String,

    /// Where the model schema comes from.
    pub model_config_type: ModelConfigType,

    /// Schema file path, required when `model_config_type: file`.
    #[serde(default)]
    pub model_config_file_path: Option<PathBuf>,

    /// Inline schema text, required when `model_config_type: text`.
    #[serde(default)]
    pub model_config_text: Option<String>,

    /// Forward decision/auto-save events to the logging layer.
    #[serde(default)]
    pub log_enable: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(RuleVaultError::Config("url must not be empty".into()));
        }
        self.model_source().map(|_| ())
    }

    /// Resolve the declared model source, checking the matching field is set.
    pub fn model_source(&self) -> Result<ModelSource> {
        match self.model_config_type {
            ModelConfigType::File => match &self.model_config_file_path {
                Some(p) if !p.as_os_str().is_empty() => Ok(ModelSource::File(p.clone())),
                _ => Err(RuleVaultError::Config(
                    "model_config_type is `file` but model_config_file_path is not set".into(),
                )),
            },
            ModelConfigType::Text => match &self.model_config_text {
                Some(t) if !t.trim().is_empty() => Ok(ModelSource::Text(t.clone())),
                _ => Err(RuleVaultError::Config(
                    "model_config_type is `text` but model_config_text is not set".into(),
                )),
            },
        }
    }
}

/// Storage backend selector. The facade contract is polymorphic over the
/// adapter capability set; sqlite is the one specified backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterClass {
    Sqlite,
}

/// Model source discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelConfigType {
    File,
    Text,
}

/// Resolved model source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    File(PathBuf),
    Text(String),
}
