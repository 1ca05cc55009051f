//! Engine configuration

use serde::{Deserialize, Serialize};
use workflow_types::{WorkflowError, WorkflowResult};

/// Which version of a workflow `start` uses when none is given
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// The highest registered version
    #[default]
    HighestVersion,
    /// The highest version whose effective date is not after today
    LatestEffective,
}

/// What the registry does with definitions that fail to load
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Log the failure and keep the definitions that loaded
    #[default]
    SkipInvalid,
    /// Fail on the first broken definition
    AllOrNothing,
}

/// Configuration for the workflow engine
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version_policy: VersionPolicy,
    pub load_mode: LoadMode,
}

impl EngineConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json(text: &str) -> WorkflowResult<Self> {
        serde_json::from_str(text).map_err(|e| WorkflowError::InvalidDocument {
            source_name: "engine config".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }
}
