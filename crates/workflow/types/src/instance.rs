//! Workflow instance state as persisted by the state store.
//!
//! An instance is either parked on exactly one active flow node or has
//! reached a terminate event. Only this discriminant and the node id are
//! persisted; everything else about the instance is derived from its
//! definition and the assignment records kept by the store.

use crate::{ActorId, FlowNodeId, InstanceId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Whether an actor is tracked as a user or as a group.
///
/// Users and groups are tracked independently: a task has one roster of
/// assigned users and another of assigned groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    User,
    Group,
}

impl ActorKind {
    pub const ALL: [ActorKind; 2] = [ActorKind::User, ActorKind::Group];
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// Lifecycle state of a workflow instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "flow_node_id", rename_all = "snake_case")]
pub enum InstanceState {
    /// Parked on a task awaiting completion
    Active(FlowNodeId),
    /// A terminate event was reached; no further transitions
    Completed,
}

impl InstanceState {
    pub fn active_flow_node_id(&self) -> Option<&FlowNodeId> {
        match self {
            Self::Active(id) => Some(id),
            Self::Completed => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// The persisted header of a workflow instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: InstanceId,
    pub workflow_id: WorkflowId,
    pub version: u32,
    pub state: InstanceState,
}

/// An actor that still owes input on an active task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTask {
    pub actor: ActorId,
    /// 1-based position in the declared roster order
    pub sequence: u32,
}
