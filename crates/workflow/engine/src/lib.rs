//! Workflow engine for human-task workflows
//!
//! Instances move through a [`WorkflowDefinition`] one task at a time.
//! Actors are assigned to tasks, complete them, or interrupt them through
//! boundary events; the engine decides where each instance goes next and
//! persists every step through a [`StateStore`].
//!
//! # Architecture
//!
//! - [`WorkflowEngine`]: starts instances and finds existing ones
//! - [`WorkflowInstance`]: per-instance operations (complete, trigger, assign)
//! - [`DefinitionRegistry`]: every loaded version of every workflow
//! - [`StateMachine`]: traversal from a finished node to the next resting point
//! - [`EngineConfig`]: version selection and load behaviour
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use workflow_engine::{DefinitionRegistry, EngineConfig, EngineDeps, WorkflowEngine};
//! use workflow_store::InMemoryStateStore;
//! use workflow_types::*;
//!
//! let definition = WorkflowDefinition::builder("leave", 1)
//!     .node(FlowNode::start_event("f01", "Start"))
//!     .node(Task::single("f02", "Approve"))
//!     .node(FlowNode::terminate_event("f99", "End"))
//!     .flow(SequenceFlow::new("s1", "f01", "f02"))
//!     .flow(SequenceFlow::new("s2", "f02", "f99"))
//!     .build()
//!     .unwrap();
//!
//! let mut definitions = DefinitionRegistry::new();
//! definitions.register(definition).unwrap();
//! let engine = WorkflowEngine::new(
//!     EngineDeps { store: Arc::new(InMemoryStateStore::new()), definitions },
//!     EngineConfig::default(),
//! );
//!
//! let mut instance = engine.start(&WorkflowId::new("leave"), None).unwrap();
//! assert!(instance.is_active(&FlowNodeId::new("f02")));
//!
//! instance.complete_user_task(None, &ActorId::new("boss")).unwrap();
//! assert!(engine.find(instance.id()).unwrap().is_completed());
//! ```
//!
//! [`WorkflowDefinition`]: workflow_types::WorkflowDefinition
//! [`StateStore`]: workflow_types::StateStore

#![deny(unsafe_code)]

pub mod config;
pub mod definition_registry;
pub mod engine;
pub mod instance;
pub mod state_machine;

// Re-export main types
pub use config::{EngineConfig, LoadMode, VersionPolicy};
pub use definition_registry::DefinitionRegistry;
pub use engine::{EngineDeps, WorkflowEngine};
pub use instance::WorkflowInstance;
pub use state_machine::StateMachine;
