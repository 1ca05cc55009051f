//! Definition documents: the JSON form of a workflow definition
//!
//! Conditions appear as strategy declarations and are resolved when the
//! document is compiled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use workflow_types::{
    FlowNodeId, GatewayType, LaneId, MultiInstanceType, SequenceFlowId, TriggerId, WorkflowError,
    WorkflowId, WorkflowResult,
};

/// A complete workflow definition as written on disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDocument {
    pub workflow_id: WorkflowId,
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub lanes: Vec<LaneDocument>,
    pub flow_nodes: Vec<FlowNodeDocument>,
    #[serde(default)]
    pub sequence_flows: Vec<SequenceFlowDocument>,
}

impl DefinitionDocument {
    /// Parse a document; `source_name` only labels errors
    pub fn from_json(source_name: &str, text: &str) -> WorkflowResult<Self> {
        serde_json::from_str(text).map_err(|e| WorkflowError::InvalidDocument {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneDocument {
    pub id: LaneId,
    #[serde(default)]
    pub name: String,
}

/// One flow node, tagged by `type`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowNodeDocument {
    StartEvent {
        id: FlowNodeId,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lane: Option<LaneId>,
    },
    TerminateEvent {
        id: FlowNodeId,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lane: Option<LaneId>,
    },
    Task {
        id: FlowNodeId,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lane: Option<LaneId>,
        #[serde(default)]
        multi_instance: MultiInstanceType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion_condition: Option<String>,
    },
    Gateway {
        id: FlowNodeId,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lane: Option<LaneId>,
        #[serde(default)]
        gateway_type: GatewayType,
    },
    BoundaryEvent {
        id: FlowNodeId,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lane: Option<LaneId>,
        attached_to: FlowNodeId,
        trigger_id: TriggerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trigger_name: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceFlowDocument {
    pub id: SequenceFlowId,
    #[serde(default)]
    pub name: String,
    pub source: FlowNodeId,
    pub target: FlowNodeId,
    /// Proceed-condition declaration; absent means always taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}
