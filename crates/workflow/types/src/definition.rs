//! Workflow definitions: the immutable, versioned graph an instance runs on
//!
//! A WorkflowDefinition is a directed graph where:
//! - Nodes are flow nodes (events, tasks, gateways, boundary events)
//! - Edges are sequence flows, optionally guarded by a proceed condition
//!
//! Definitions are validated once by [`WorkflowDefinitionBuilder::build`] and
//! never change afterwards. To modify, publish a new version.

use crate::{
    BoundaryEvent, FlowNode, FlowNodeId, LaneId, SequenceFlow, Task, TriggerId, WorkflowError,
    WorkflowId, WorkflowResult,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ── Identifiers ──────────────────────────────────────────────────────

/// A workflow id together with one of its versions
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefinitionKey {
    pub workflow_id: WorkflowId,
    pub version: u32,
}

impl DefinitionKey {
    pub fn new(workflow_id: impl Into<WorkflowId>, version: u32) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            version,
        }
    }
}

impl std::fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.workflow_id, self.version)
    }
}

/// A grouping of tasks by responsible role
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    pub name: String,
}

impl Lane {
    pub fn new(id: impl Into<LaneId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ── Workflow Definition ──────────────────────────────────────────────

/// A validated workflow graph
#[derive(Clone, Debug)]
pub struct WorkflowDefinition {
    key: DefinitionKey,
    name: String,
    effective_date: NaiveDate,
    nodes: Vec<FlowNode>,
    flows: Vec<SequenceFlow>,
    lanes: Vec<Lane>,
    node_index: HashMap<FlowNodeId, usize>,
    outgoing: HashMap<FlowNodeId, Vec<usize>>,
    start: usize,
}

impl WorkflowDefinition {
    /// Start building a definition
    pub fn builder(workflow_id: impl Into<WorkflowId>, version: u32) -> WorkflowDefinitionBuilder {
        WorkflowDefinitionBuilder::new(workflow_id, version)
    }

    pub fn key(&self) -> &DefinitionKey {
        &self.key
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.key.workflow_id
    }

    pub fn version(&self) -> u32 {
        self.key.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    /// All flow nodes in declaration order
    pub fn flow_nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    /// All sequence flows in declaration order
    pub fn sequence_flows(&self) -> &[SequenceFlow] {
        &self.flows
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn find_lane(&self, id: &LaneId) -> Option<&Lane> {
        self.lanes.iter().find(|l| &l.id == id)
    }

    /// Look up a flow node by id
    pub fn find_flow_node(&self, id: &FlowNodeId) -> WorkflowResult<&FlowNode> {
        self.node_index
            .get(id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| WorkflowError::FlowNodeNotFound {
                definition: self.key.clone(),
                node_id: id.clone(),
            })
    }

    /// Look up a task by id; other node kinds are rejected
    pub fn find_task(&self, id: &FlowNodeId) -> WorkflowResult<&Task> {
        self.find_flow_node(id)?
            .as_task()
            .ok_or_else(|| WorkflowError::NotATask {
                definition: self.key.clone(),
                node_id: id.clone(),
            })
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.nodes.iter().filter_map(FlowNode::as_task)
    }

    /// Tasks whose lane is `lane_id`, in declaration order
    pub fn tasks_in_lane<'a>(&'a self, lane_id: &'a LaneId) -> impl Iterator<Item = &'a Task> {
        self.tasks()
            .filter(move |t| t.lane_id.as_ref() == Some(lane_id))
    }

    /// Every boundary event declared with `trigger_id`, whatever task it is
    /// attached to
    pub fn boundary_events<'a>(
        &'a self,
        trigger_id: &'a TriggerId,
    ) -> impl Iterator<Item = &'a BoundaryEvent> {
        self.nodes
            .iter()
            .filter_map(FlowNode::as_boundary_event)
            .filter(move |b| &b.trigger_id == trigger_id)
    }

    /// Outgoing flows of a node, in declaration order
    pub fn outgoing_flows(&self, node_id: &FlowNodeId) -> impl Iterator<Item = &SequenceFlow> {
        self.outgoing
            .get(node_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.flows[i])
    }

    /// The single start event
    pub fn start_event(&self) -> &FlowNode {
        &self.nodes[self.start]
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Accumulates the parts of a definition and validates them in `build`
#[derive(Debug)]
pub struct WorkflowDefinitionBuilder {
    key: DefinitionKey,
    name: String,
    effective_date: NaiveDate,
    nodes: Vec<FlowNode>,
    flows: Vec<SequenceFlow>,
    lanes: Vec<Lane>,
}

impl WorkflowDefinitionBuilder {
    pub fn new(workflow_id: impl Into<WorkflowId>, version: u32) -> Self {
        Self {
            key: DefinitionKey::new(workflow_id, version),
            name: String::new(),
            effective_date: NaiveDate::MIN,
            nodes: Vec::new(),
            flows: Vec::new(),
            lanes: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = date;
        self
    }

    pub fn lane(mut self, lane: Lane) -> Self {
        self.lanes.push(lane);
        self
    }

    pub fn node(mut self, node: impl Into<FlowNode>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn flow(mut self, flow: SequenceFlow) -> Self {
        self.flows.push(flow);
        self
    }

    /// Validate the graph and freeze it
    pub fn build(self) -> WorkflowResult<WorkflowDefinition> {
        let mut node_index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if node_index.insert(node.id().clone(), i).is_some() {
                return Err(WorkflowError::DuplicateFlowNodeId(node.id().clone()));
            }
        }

        let lane_ids: HashSet<&LaneId> = self.lanes.iter().map(|l| &l.id).collect();
        for node in &self.nodes {
            if let Some(lane_id) = node.lane_id() {
                if !lane_ids.contains(lane_id) {
                    return Err(WorkflowError::UndeclaredLane {
                        node_id: node.id().clone(),
                        lane_id: lane_id.clone(),
                    });
                }
            }
        }

        let starts: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, FlowNode::StartEvent(_)))
            .map(|(i, _)| i)
            .collect();
        let start = match starts.as_slice() {
            [only] => *only,
            _ => return Err(WorkflowError::StartEventCount(starts.len())),
        };

        for node in &self.nodes {
            if let FlowNode::BoundaryEvent(b) = node {
                let attached = node_index
                    .get(&b.attached_task_id)
                    .map(|&i| &self.nodes[i]);
                if !matches!(attached, Some(FlowNode::Task(_))) {
                    return Err(WorkflowError::InvalidAttachment {
                        event_id: b.id.clone(),
                        task_id: b.attached_task_id.clone(),
                    });
                }
            }
        }

        let mut outgoing: HashMap<FlowNodeId, Vec<usize>> = HashMap::new();
        for (i, flow) in self.flows.iter().enumerate() {
            for endpoint in [&flow.source, &flow.target] {
                if !node_index.contains_key(endpoint) {
                    return Err(WorkflowError::DanglingSequenceFlow {
                        flow_id: flow.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            outgoing.entry(flow.source.clone()).or_default().push(i);
        }

        Ok(WorkflowDefinition {
            key: self.key,
            name: self.name,
            effective_date: self.effective_date,
            nodes: self.nodes,
            flows: self.flows,
            lanes: self.lanes,
            node_index,
            outgoing,
            start,
        })
    }
}
