//! Error types for the workflow layer

use crate::{
    ActorId, ActorKind, DefinitionKey, FlowNodeId, InstanceId, LaneId, MultiInstanceType,
    SequenceFlowId, TriggerId,
};

/// Broad classification of a [`WorkflowError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A definition (or a strategy declaration inside it) is malformed.
    /// Raised while loading; fatal for that definition.
    Configuration,
    /// The operation is not allowed in the instance's current state.
    State,
    /// A referenced flow node, task, lane or definition does not exist or
    /// does not fit the operation.
    InvalidArgument,
    /// The operation is not available on this object.
    Unsupported,
    /// The state store failed.
    Store,
}

/// Errors that can occur in workflow operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Task '{task_id}' with multi-instance type {multi_instance} {detail}")]
    CompletionConditionMismatch {
        task_id: FlowNodeId,
        multi_instance: MultiInstanceType,
        detail: &'static str,
    },

    #[error("invalid class/strategy name pattern: '{0}'")]
    InvalidStrategyPattern(String),

    #[error("failed to create instance: '{declaration}': {reason}")]
    StrategyCreation { declaration: String, reason: String },

    #[error("Duplicate flow node ID: {0}")]
    DuplicateFlowNodeId(FlowNodeId),

    #[error("Sequence flow '{flow_id}' references unknown flow node '{node_id}'")]
    DanglingSequenceFlow {
        flow_id: SequenceFlowId,
        node_id: FlowNodeId,
    },

    #[error("Workflow must declare exactly one start event, found {0}")]
    StartEventCount(usize),

    #[error("Boundary event '{event_id}' is attached to '{task_id}', which is not a task")]
    InvalidAttachment {
        event_id: FlowNodeId,
        task_id: FlowNodeId,
    },

    #[error("Flow node '{node_id}' references undeclared lane '{lane_id}'")]
    UndeclaredLane { node_id: FlowNodeId, lane_id: LaneId },

    #[error("Invalid definition document '{source_name}': {reason}")]
    InvalidDocument { source_name: String, reason: String },

    #[error("Duplicate workflow definition: {0}")]
    DuplicateDefinition(DefinitionKey),

    #[error("Instance {instance_id}: no outgoing sequence flow of '{node_id}' matches")]
    NoMatchingFlow {
        instance_id: InstanceId,
        node_id: FlowNodeId,
    },

    #[error("Instance {instance_id}: cannot transition to '{node_id}': {reason}")]
    InvalidTransition {
        instance_id: InstanceId,
        node_id: FlowNodeId,
        reason: &'static str,
    },

    #[error("Workflow instance {instance_id} is already completed")]
    AlreadyCompleted { instance_id: InstanceId },

    #[error(
        "Instance {instance_id}: no boundary event with trigger '{trigger_id}' is attached to '{task_id}'"
    )]
    UnknownTrigger {
        instance_id: InstanceId,
        task_id: FlowNodeId,
        trigger_id: TriggerId,
    },

    #[error("Instance {instance_id}: {kind} '{actor}' is not assigned to task '{task_id}'")]
    ActorNotAssigned {
        instance_id: InstanceId,
        task_id: FlowNodeId,
        kind: ActorKind,
        actor: ActorId,
    },

    #[error("Flow node '{node_id}' not found in workflow {definition}")]
    FlowNodeNotFound {
        definition: DefinitionKey,
        node_id: FlowNodeId,
    },

    #[error("Flow node '{node_id}' in workflow {definition} is not a task")]
    NotATask {
        definition: DefinitionKey,
        node_id: FlowNodeId,
    },

    #[error("Lane '{lane_id}' not found in workflow {definition}")]
    LaneNotFound {
        definition: DefinitionKey,
        lane_id: LaneId,
    },

    #[error(
        "Instance {instance_id}: task '{task_id}' is single-instance and takes one actor, got {count}"
    )]
    TooManyActors {
        instance_id: InstanceId,
        task_id: FlowNodeId,
        count: usize,
    },

    #[error("Instance {instance_id}: {kind} '{actor}' appears more than once in the roster of task '{task_id}'")]
    DuplicateActor {
        instance_id: InstanceId,
        task_id: FlowNodeId,
        kind: ActorKind,
        actor: ActorId,
    },

    #[error("Workflow definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CompletionConditionMismatch { .. }
            | Self::InvalidStrategyPattern(_)
            | Self::StrategyCreation { .. }
            | Self::DuplicateFlowNodeId(_)
            | Self::DanglingSequenceFlow { .. }
            | Self::StartEventCount(_)
            | Self::InvalidAttachment { .. }
            | Self::UndeclaredLane { .. }
            | Self::InvalidDocument { .. }
            | Self::DuplicateDefinition(_)
            | Self::NoMatchingFlow { .. }
            | Self::InvalidTransition { .. } => ErrorKind::Configuration,

            Self::AlreadyCompleted { .. }
            | Self::UnknownTrigger { .. }
            | Self::ActorNotAssigned { .. } => ErrorKind::State,

            Self::FlowNodeNotFound { .. }
            | Self::NotATask { .. }
            | Self::LaneNotFound { .. }
            | Self::TooManyActors { .. }
            | Self::DuplicateActor { .. }
            | Self::DefinitionNotFound(_) => ErrorKind::InvalidArgument,

            Self::Unsupported(_) => ErrorKind::Unsupported,

            Self::Store(_) => ErrorKind::Store,
        }
    }
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// State-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for state-store operations.
pub type StoreResult<T> = Result<T, StoreError>;
