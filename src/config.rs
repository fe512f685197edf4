use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::eval::FailurePolicy;
use crate::{InternalResult, ScenarioError};

/// Template that chat sender entities are created from.
pub const DEFAULT_CHAT_TEMPLATE: &str = "scenario:scenarioChatEntity";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    #[serde(default)]
    pub builder: BuilderConfig,

    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Nesting limit for templates instantiated through slot defaults.
    #[serde(default = "default_max_template_depth")]
    pub max_template_depth: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_template_depth: default_max_template_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default = "default_chat_template")]
    pub chat_template: String,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Nesting limit for value requests during evaluation.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            chat_template: default_chat_template(),
            failure_policy: FailurePolicy::default(),
            max_depth: default_max_depth(),
        }
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ScenarioError::internal(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader).map_err(|e| {
        ScenarioError::internal(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| ScenarioError::internal(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

fn default_event_buffer_size() -> usize {
    1000
}

fn default_max_template_depth() -> usize {
    crate::build::DEFAULT_MAX_TEMPLATE_DEPTH
}

fn default_max_depth() -> usize {
    crate::eval::DEFAULT_MAX_DEPTH
}

fn default_chat_template() -> String {
    DEFAULT_CHAT_TEMPLATE.to_string()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: default_event_buffer_size(),
            builder: BuilderConfig::default(),
            evaluator: EvaluatorConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        from_file(path)
    }
}
