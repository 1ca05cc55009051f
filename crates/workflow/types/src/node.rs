//! Flow nodes: the addressable points of a workflow graph
//!
//! The node set is closed. Traversal matches on [`FlowNode`] exhaustively,
//! so adding a variant forces every traversal decision to be revisited.

use crate::condition::{CompletionCondition, SingleCompletionCondition};
use crate::{FlowNodeId, LaneId, TriggerId, WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ── Enumerations ─────────────────────────────────────────────────────

/// How many actors must act on a task
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MultiInstanceType {
    /// One actor completes the task
    #[default]
    None,
    /// Several actors in declared order
    Sequential,
    /// Several actors in any order
    Parallel,
}

impl MultiInstanceType {
    pub fn is_multi(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for MultiInstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("NONE"),
            Self::Sequential => f.write_str("SEQUENTIAL"),
            Self::Parallel => f.write_str("PARALLEL"),
        }
    }
}

/// Kind of branch point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayType {
    /// Exactly one outgoing flow is taken: the first whose condition matches
    #[default]
    Exclusive,
}

/// Kind of plain event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Start,
    Terminate,
}

// ── Variants ─────────────────────────────────────────────────────────

/// A start or terminate event
#[derive(Clone, Debug)]
pub struct Event {
    pub id: FlowNodeId,
    pub name: String,
    pub lane_id: Option<LaneId>,
}

/// A unit of human work
#[derive(Clone, Debug)]
pub struct Task {
    pub id: FlowNodeId,
    pub name: String,
    pub lane_id: Option<LaneId>,
    multi_instance: MultiInstanceType,
    completion_condition: Option<Arc<dyn CompletionCondition>>,
}

impl Task {
    /// Create a task.
    ///
    /// A completion condition must be supplied exactly when the task is
    /// multi-instance; single-instance tasks complete on the first actor.
    pub fn new(
        id: impl Into<FlowNodeId>,
        name: impl Into<String>,
        multi_instance: MultiInstanceType,
        completion_condition: Option<Arc<dyn CompletionCondition>>,
    ) -> WorkflowResult<Self> {
        let id = id.into();
        match (multi_instance.is_multi(), completion_condition.is_some()) {
            (false, true) => Err(WorkflowError::CompletionConditionMismatch {
                task_id: id,
                multi_instance,
                detail: "must not declare a completion condition",
            }),
            (true, false) => Err(WorkflowError::CompletionConditionMismatch {
                task_id: id,
                multi_instance,
                detail: "requires a completion condition",
            }),
            _ => Ok(Self {
                id,
                name: name.into(),
                lane_id: None,
                multi_instance,
                completion_condition,
            }),
        }
    }

    /// Create a single-instance task
    pub fn single(id: impl Into<FlowNodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lane_id: None,
            multi_instance: MultiInstanceType::None,
            completion_condition: None,
        }
    }

    pub fn with_lane(mut self, lane_id: impl Into<LaneId>) -> Self {
        self.lane_id = Some(lane_id.into());
        self
    }

    pub fn multi_instance(&self) -> MultiInstanceType {
        self.multi_instance
    }

    pub fn is_multi_instance(&self) -> bool {
        self.multi_instance.is_multi()
    }

    /// The condition deciding when this task is finished.
    ///
    /// Single-instance tasks use [`SingleCompletionCondition`].
    pub fn completion_condition(&self) -> &dyn CompletionCondition {
        match &self.completion_condition {
            Some(condition) => condition.as_ref(),
            None => &SingleCompletionCondition,
        }
    }
}

/// A branch point; traversal passes through it without stopping
#[derive(Clone, Debug)]
pub struct Gateway {
    pub id: FlowNodeId,
    pub name: String,
    pub lane_id: Option<LaneId>,
    pub gateway_type: GatewayType,
}

impl Gateway {
    pub fn exclusive(id: impl Into<FlowNodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lane_id: None,
            gateway_type: GatewayType::Exclusive,
        }
    }
}

/// An interrupt attached to a task, reachable only by an explicit trigger
#[derive(Clone, Debug)]
pub struct BoundaryEvent {
    pub id: FlowNodeId,
    pub name: String,
    pub lane_id: Option<LaneId>,
    pub attached_task_id: FlowNodeId,
    pub trigger_id: TriggerId,
    pub trigger_name: String,
}

impl BoundaryEvent {
    pub fn new(
        id: impl Into<FlowNodeId>,
        attached_task_id: impl Into<FlowNodeId>,
        trigger_id: impl Into<TriggerId>,
    ) -> Self {
        let trigger_id = trigger_id.into();
        Self {
            id: id.into(),
            name: String::new(),
            lane_id: None,
            attached_task_id: attached_task_id.into(),
            trigger_name: trigger_id.to_string(),
            trigger_id,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_trigger_name(mut self, trigger_name: impl Into<String>) -> Self {
        self.trigger_name = trigger_name.into();
        self
    }
}

// ── Flow Node ────────────────────────────────────────────────────────

/// Any addressable point in a workflow graph
#[derive(Clone, Debug)]
pub enum FlowNode {
    StartEvent(Event),
    TerminateEvent(Event),
    Task(Task),
    Gateway(Gateway),
    BoundaryEvent(BoundaryEvent),
}

impl FlowNode {
    /// Create a start event
    pub fn start_event(id: impl Into<FlowNodeId>, name: impl Into<String>) -> Self {
        Self::StartEvent(Event {
            id: id.into(),
            name: name.into(),
            lane_id: None,
        })
    }

    /// Create a terminate event
    pub fn terminate_event(id: impl Into<FlowNodeId>, name: impl Into<String>) -> Self {
        Self::TerminateEvent(Event {
            id: id.into(),
            name: name.into(),
            lane_id: None,
        })
    }

    pub fn id(&self) -> &FlowNodeId {
        match self {
            Self::StartEvent(e) | Self::TerminateEvent(e) => &e.id,
            Self::Task(t) => &t.id,
            Self::Gateway(g) => &g.id,
            Self::BoundaryEvent(b) => &b.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::StartEvent(e) | Self::TerminateEvent(e) => &e.name,
            Self::Task(t) => &t.name,
            Self::Gateway(g) => &g.name,
            Self::BoundaryEvent(b) => &b.name,
        }
    }

    pub fn lane_id(&self) -> Option<&LaneId> {
        match self {
            Self::StartEvent(e) | Self::TerminateEvent(e) => e.lane_id.as_ref(),
            Self::Task(t) => t.lane_id.as_ref(),
            Self::Gateway(g) => g.lane_id.as_ref(),
            Self::BoundaryEvent(b) => b.lane_id.as_ref(),
        }
    }

    /// The event type, for start and terminate events
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::StartEvent(_) => Some(EventType::Start),
            Self::TerminateEvent(_) => Some(EventType::Terminate),
            _ => None,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Self::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_boundary_event(&self) -> Option<&BoundaryEvent> {
        match self {
            Self::BoundaryEvent(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway(_))
    }
}

impl From<Task> for FlowNode {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<Gateway> for FlowNode {
    fn from(gateway: Gateway) -> Self {
        Self::Gateway(gateway)
    }
}

impl From<BoundaryEvent> for FlowNode {
    fn from(event: BoundaryEvent) -> Self {
        Self::BoundaryEvent(event)
    }
}
