//! Definition registry: stores and retrieves workflow definitions
//!
//! Definitions are immutable once registered. To modify, publish a new
//! version. The registry keeps every version keyed by `(workflow_id,
//! version)` and hands them out behind `Arc` for lock-free sharing.

use crate::config::{LoadMode, VersionPolicy};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use workflow_types::{
    DefinitionKey, DefinitionLoader, WorkflowDefinition, WorkflowError, WorkflowId,
    WorkflowResult,
};

/// Registry of workflow definitions
#[derive(Clone, Debug, Default)]
pub struct DefinitionRegistry {
    /// Versions of each workflow, ordered by version number
    definitions: HashMap<WorkflowId, BTreeMap<u32, Arc<WorkflowDefinition>>>,
}

impl DefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a registry from a loader.
    ///
    /// With [`LoadMode::SkipInvalid`] definitions that failed to load are
    /// logged and left out; with [`LoadMode::AllOrNothing`] the first failure
    /// is returned. Duplicate keys are always an error.
    pub fn load(loader: &dyn DefinitionLoader, mode: LoadMode) -> WorkflowResult<Self> {
        let mut registry = Self::new();
        let mut skipped = 0usize;
        for result in loader.load() {
            match result {
                Ok(definition) => {
                    registry.register(definition)?;
                }
                Err(e) if mode == LoadMode::SkipInvalid => {
                    tracing::warn!(error = %e, "Skipping workflow definition that failed to load");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!(
            definitions = registry.count(),
            skipped,
            "Workflow definitions loaded"
        );
        Ok(registry)
    }

    /// Register a workflow definition
    pub fn register(&mut self, definition: WorkflowDefinition) -> WorkflowResult<DefinitionKey> {
        let key = definition.key().clone();
        let versions = self.definitions.entry(key.workflow_id.clone()).or_default();
        if versions.contains_key(&key.version) {
            return Err(WorkflowError::DuplicateDefinition(key));
        }
        versions.insert(key.version, Arc::new(definition));

        tracing::info!(
            workflow_id = %key.workflow_id,
            version = key.version,
            "Workflow definition registered"
        );
        Ok(key)
    }

    /// Get one version of a definition
    pub fn get(
        &self,
        workflow_id: &WorkflowId,
        version: u32,
    ) -> WorkflowResult<Arc<WorkflowDefinition>> {
        self.definitions
            .get(workflow_id)
            .and_then(|versions| versions.get(&version))
            .cloned()
            .ok_or_else(|| {
                WorkflowError::DefinitionNotFound(
                    DefinitionKey::new(workflow_id.clone(), version).to_string(),
                )
            })
    }

    /// The version `start` should use today
    pub fn current(
        &self,
        workflow_id: &WorkflowId,
        policy: VersionPolicy,
        today: NaiveDate,
    ) -> WorkflowResult<Arc<WorkflowDefinition>> {
        let versions = self.definitions.get(workflow_id);
        let chosen = match policy {
            VersionPolicy::HighestVersion => versions.and_then(|v| v.values().next_back()),
            VersionPolicy::LatestEffective => versions.and_then(|v| {
                v.values()
                    .rev()
                    .find(|definition| definition.effective_date() <= today)
            }),
        };
        chosen
            .cloned()
            .ok_or_else(|| WorkflowError::DefinitionNotFound(workflow_id.to_string()))
    }

    /// All versions of a workflow, lowest first
    pub fn versions(&self, workflow_id: &WorkflowId) -> Vec<u32> {
        self.definitions
            .get(workflow_id)
            .map(|v| v.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of registered definitions
    pub fn count(&self) -> usize {
        self.definitions.values().map(BTreeMap::len).sum()
    }

    /// Check if a definition exists
    pub fn contains(&self, workflow_id: &WorkflowId, version: u32) -> bool {
        self.definitions
            .get(workflow_id)
            .is_some_and(|v| v.contains_key(&version))
    }
}
