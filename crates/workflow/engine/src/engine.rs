//! Workflow engine: the entry point for starting and finding instances
//!
//! The engine owns the definition registry and a shared state store. It
//! keeps no per-instance state of its own: [`WorkflowEngine::find`] rebuilds
//! an instance handle from the store on every call.

use crate::config::EngineConfig;
use crate::definition_registry::DefinitionRegistry;
use crate::instance::WorkflowInstance;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use workflow_types::*;

/// Everything the engine is built from
#[derive(Clone)]
pub struct EngineDeps {
    pub store: Arc<dyn StateStore>,
    pub definitions: DefinitionRegistry,
}

/// Starts workflow instances and finds running ones
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn StateStore>,
    definitions: DefinitionRegistry,
    config: EngineConfig,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("definitions", &self.definitions.count())
            .field("config", &self.config)
            .finish()
    }
}

impl WorkflowEngine {
    pub fn new(deps: EngineDeps, config: EngineConfig) -> Self {
        Self {
            store: deps.store,
            definitions: deps.definitions,
            config,
        }
    }

    /// Build an engine whose registry is filled from `loader`
    pub fn from_loader(
        store: Arc<dyn StateStore>,
        loader: &dyn DefinitionLoader,
        config: EngineConfig,
    ) -> WorkflowResult<Self> {
        let definitions = DefinitionRegistry::load(loader, config.load_mode)?;
        Ok(Self::new(EngineDeps { store, definitions }, config))
    }

    // ── Instance Lifecycle ───────────────────────────────────────────

    /// Start the current version of a workflow
    pub fn start(
        &self,
        workflow_id: &WorkflowId,
        params: Option<&Params>,
    ) -> WorkflowResult<WorkflowInstance> {
        self.start_as_of(workflow_id, Utc::now().date_naive(), params)
    }

    /// Start the version that is current on `today`
    pub fn start_as_of(
        &self,
        workflow_id: &WorkflowId,
        today: NaiveDate,
        params: Option<&Params>,
    ) -> WorkflowResult<WorkflowInstance> {
        let definition =
            self.definitions
                .current(workflow_id, self.config.version_policy, today)?;
        WorkflowInstance::start(definition, Arc::clone(&self.store), params)
    }

    /// Start one specific version of a workflow
    pub fn start_version(
        &self,
        workflow_id: &WorkflowId,
        version: u32,
        params: Option<&Params>,
    ) -> WorkflowResult<WorkflowInstance> {
        let definition = self.definitions.get(workflow_id, version)?;
        WorkflowInstance::start(definition, Arc::clone(&self.store), params)
    }

    /// Rebuild a handle on an existing instance.
    ///
    /// An id the store does not know yields a completed instance with no
    /// definition attached. An active instance whose definition is no longer
    /// registered is an error; a completed one is returned without it.
    pub fn find(&self, instance_id: &InstanceId) -> WorkflowResult<WorkflowInstance> {
        let record = match self.store.find_instance(instance_id)? {
            Some(record) => record,
            None => {
                tracing::debug!(instance_id = %instance_id, "Instance not in store, treating as completed");
                return Ok(WorkflowInstance::purged(
                    instance_id.clone(),
                    Arc::clone(&self.store),
                ));
            }
        };

        let definition = match self.definitions.get(&record.workflow_id, record.version) {
            Ok(definition) => Some(definition),
            Err(_) if record.state.is_completed() => None,
            Err(e) => return Err(e),
        };
        Ok(WorkflowInstance::restore(
            record,
            definition,
            Arc::clone(&self.store),
        ))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn definitions(&self) -> &DefinitionRegistry {
        &self.definitions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }
}
