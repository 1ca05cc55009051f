//! Workflow Domain Types
//!
//! A workflow is a versioned, immutable graph of flow nodes (events, tasks,
//! gateways, boundary events) connected by optionally-conditional sequence
//! flows. Human actors (users and groups) are assigned to tasks and complete
//! them; conditions decide which branch a finished task follows and when a
//! multi-actor task counts as finished.
//!
//! # Key Concepts
//!
//! - **WorkflowDefinition**: the graph, identified by `(workflow_id, version)`.
//!   Built once and shared read-only across every instance.
//! - **FlowNode**: a closed set of node variants. Gateways are branch points
//!   that traversal passes through; boundary events interrupt the task they
//!   are attached to.
//! - **FlowProceedCondition**: decides whether a sequence flow may be taken.
//! - **CompletionCondition**: decides whether a multi-instance task is done.
//! - **StateStore**: the durable per-instance state port (active node,
//!   assignment rosters, active-task records).
//! - **DefinitionLoader**: the port that supplies definitions at start-up.

#![deny(unsafe_code)]

pub mod condition;
mod definition;
mod errors;
mod flow;
mod identifiers;
mod instance;
mod loader;
mod node;
mod params;
mod store;

pub use condition::{CompletionCondition, FlowProceedCondition};
pub use definition::*;
pub use errors::*;
pub use flow::*;
pub use identifiers::*;
pub use instance::*;
pub use loader::*;
pub use node::*;
pub use params::*;
pub use store::*;
