use crate::prelude::Params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog entry describing an installable analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineDescriptor {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_params: Params,
    #[serde(default)]
    pub param_descriptions: HashMap<String, String>,
}

impl PipelineDescriptor {
    /// Help text registered for `param`, empty when none was published.
    pub fn help_for(&self, param: &str) -> &str {
        self.param_descriptions
            .get(param)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Response body of `GET /pipelines`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineList {
    #[serde(default)]
    pub pipelines: Vec<PipelineDescriptor>,
}

impl PipelineList {
    pub fn find(&self, name: &str) -> Option<&PipelineDescriptor> {
        self.pipelines.iter().find(|pipeline| pipeline.name == name)
    }
}

/// The pipeline and parameters currently applied by the registry.
///
/// Also used as the editor draft and baseline, which share this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ActiveSettings {
    pub name: String,
    #[serde(default)]
    pub params: Params,
}

impl ActiveSettings {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}
