//! State machine: graph traversal between resting points
//!
//! An instance only ever rests on a task or in the completed state. From a
//! node that has just been left, the state machine follows the first
//! matching outgoing flow, passes through gateways, and stops at the first
//! task or terminate event.

use std::collections::HashSet;
use workflow_types::*;

/// Computes the next resting state of an instance
#[derive(Clone, Copy, Debug, Default)]
pub struct StateMachine;

impl StateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Traverse from `from` using `params` for flow conditions.
    ///
    /// Flows are tried in declaration order and the first match is taken.
    /// Entering a start or boundary event, or meeting a gateway twice in one
    /// traversal, is a definition error.
    pub fn advance(
        &self,
        definition: &WorkflowDefinition,
        instance_id: &InstanceId,
        from: &FlowNodeId,
        params: Option<&Params>,
    ) -> WorkflowResult<InstanceState> {
        let mut current = from.clone();
        let mut gateways: HashSet<FlowNodeId> = HashSet::new();

        loop {
            let flow = definition
                .outgoing_flows(&current)
                .find(|flow| flow.is_match(instance_id, params))
                .ok_or_else(|| WorkflowError::NoMatchingFlow {
                    instance_id: instance_id.clone(),
                    node_id: current.clone(),
                })?;
            let target = definition.find_flow_node(&flow.target)?;

            tracing::debug!(
                instance_id = %instance_id,
                flow_id = %flow.id,
                from = %current,
                to = %target.id(),
                "Sequence flow taken"
            );

            match target {
                FlowNode::Task(task) => return Ok(InstanceState::Active(task.id.clone())),
                FlowNode::TerminateEvent(_) => return Ok(InstanceState::Completed),
                FlowNode::Gateway(gateway) => {
                    if !gateways.insert(gateway.id.clone()) {
                        return Err(WorkflowError::InvalidTransition {
                            instance_id: instance_id.clone(),
                            node_id: gateway.id.clone(),
                            reason: "gateway cycle without a task",
                        });
                    }
                    current = gateway.id.clone();
                }
                FlowNode::StartEvent(event) => {
                    return Err(WorkflowError::InvalidTransition {
                        instance_id: instance_id.clone(),
                        node_id: event.id.clone(),
                        reason: "a start event cannot be entered",
                    })
                }
                FlowNode::BoundaryEvent(event) => {
                    return Err(WorkflowError::InvalidTransition {
                        instance_id: instance_id.clone(),
                        node_id: event.id.clone(),
                        reason: "a boundary event is only reached through its trigger",
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use workflow_types::condition::{Comparator, NumericCondition};

    fn eq(key: &str, value: i64) -> Arc<NumericCondition> {
        Arc::new(NumericCondition::new(Comparator::Eq, key, value))
    }

    fn branching() -> WorkflowDefinition {
        WorkflowDefinition::builder("branching", 1)
            .node(FlowNode::start_event("f01", "Start"))
            .node(Task::single("f02", "Work"))
            .node(Gateway::exclusive("g01", "First"))
            .node(Gateway::exclusive("g02", "Second"))
            .node(Task::single("f03", "Review"))
            .node(FlowNode::terminate_event("f50", "Approved"))
            .node(FlowNode::terminate_event("f99", "Rejected"))
            .flow(SequenceFlow::new("s1", "f01", "f02"))
            .flow(SequenceFlow::new("s2", "f02", "g01"))
            .flow(SequenceFlow::new("s3", "g01", "f50").with_condition(eq("var", 1000)))
            .flow(SequenceFlow::new("s4", "g01", "g02"))
            .flow(SequenceFlow::new("s5", "g02", "f03").with_condition(eq("var", 5)))
            .flow(SequenceFlow::new("s6", "g02", "f99"))
            .flow(SequenceFlow::new("s7", "f03", "f99"))
            .build()
            .unwrap()
    }

    fn advance(
        def: &WorkflowDefinition,
        from: &str,
        params: serde_json::Value,
    ) -> WorkflowResult<InstanceState> {
        StateMachine::new().advance(
            def,
            &InstanceId::new("i-1"),
            &FlowNodeId::new(from),
            params.as_object(),
        )
    }

    #[test]
    fn test_stops_at_first_task() {
        let state = advance(&branching(), "f01", json!({})).unwrap();
        assert_eq!(state, InstanceState::Active(FlowNodeId::new("f02")));
    }

    #[test]
    fn test_gateways_are_passed_through() {
        let def = branching();
        assert_eq!(
            advance(&def, "f02", json!({ "var": 1000 })).unwrap(),
            InstanceState::Completed
        );
        assert_eq!(
            advance(&def, "f02", json!({ "var": 5 })).unwrap(),
            InstanceState::Active(FlowNodeId::new("f03"))
        );
        assert_eq!(
            advance(&def, "f02", json!({ "var": 1001 })).unwrap(),
            InstanceState::Completed
        );
    }

    #[test]
    fn test_no_matching_flow() {
        let def = WorkflowDefinition::builder("stuck", 1)
            .node(FlowNode::start_event("f01", "Start"))
            .node(Task::single("f02", "Work"))
            .node(FlowNode::terminate_event("f99", "End"))
            .flow(SequenceFlow::new("s1", "f01", "f02"))
            .flow(SequenceFlow::new("s2", "f02", "f99").with_condition(eq("ok", 1)))
            .build()
            .unwrap();

        let err = advance(&def, "f02", json!({ "ok": 0 })).unwrap_err();
        assert!(matches!(err, WorkflowError::NoMatchingFlow { .. }));
        assert!(err.to_string().contains("i-1"));
        assert!(err.to_string().contains("f02"));

        let err = advance(&def, "f99", json!({})).unwrap_err();
        assert!(matches!(err, WorkflowError::NoMatchingFlow { .. }));
    }

    #[test]
    fn test_gateway_cycle_detected() {
        let def = WorkflowDefinition::builder("loop", 1)
            .node(FlowNode::start_event("f01", "Start"))
            .node(Gateway::exclusive("g01", "A"))
            .node(Gateway::exclusive("g02", "B"))
            .flow(SequenceFlow::new("s1", "f01", "g01"))
            .flow(SequenceFlow::new("s2", "g01", "g02"))
            .flow(SequenceFlow::new("s3", "g02", "g01"))
            .build()
            .unwrap();

        let err = advance(&def, "f01", json!({})).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_entering_events_rejected() {
        let def = WorkflowDefinition::builder("bad", 1)
            .node(FlowNode::start_event("f01", "Start"))
            .node(Task::single("f02", "Work"))
            .node(BoundaryEvent::new("b01", "f02", "cancel"))
            .flow(SequenceFlow::new("s1", "f01", "f02"))
            .flow(SequenceFlow::new("s2", "f02", "b01"))
            .flow(SequenceFlow::new("s3", "b01", "f01"))
            .build()
            .unwrap();

        let err = advance(&def, "f02", json!({})).unwrap_err();
        assert!(err.to_string().contains("boundary event"));

        let err = advance(&def, "b01", json!({})).unwrap_err();
        assert!(err.to_string().contains("start event"));
    }
}
