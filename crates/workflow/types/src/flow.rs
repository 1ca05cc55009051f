use crate::condition::FlowProceedCondition;
use crate::{FlowNodeId, InstanceId, Params, SequenceFlowId};
use std::sync::Arc;

/// A directed, optionally conditional edge between two flow nodes
#[derive(Clone, Debug)]
pub struct SequenceFlow {
    pub id: SequenceFlowId,
    pub name: String,
    pub source: FlowNodeId,
    pub target: FlowNodeId,
    condition: Option<Arc<dyn FlowProceedCondition>>,
}

impl SequenceFlow {
    pub fn new(
        id: impl Into<SequenceFlowId>,
        source: impl Into<FlowNodeId>,
        target: impl Into<FlowNodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            source: source.into(),
            target: target.into(),
            condition: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_condition(mut self, condition: Arc<dyn FlowProceedCondition>) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn condition(&self) -> Option<&dyn FlowProceedCondition> {
        self.condition.as_deref()
    }

    /// Whether this flow may be taken; an unconditional flow always matches
    pub fn is_match(&self, instance_id: &InstanceId, params: Option<&Params>) -> bool {
        match &self.condition {
            Some(condition) => condition.is_match(instance_id, params, self),
            None => true,
        }
    }
}
