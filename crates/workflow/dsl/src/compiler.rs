//! Compiler: converts a DefinitionDocument into a WorkflowDefinition
//!
//! Every condition declaration is resolved through the strategy loader
//! here; the first failure aborts the whole definition.

use crate::document::{DefinitionDocument, FlowNodeDocument};
use crate::strategy::StrategyLoader;
use workflow_types::*;

/// Compile a parsed document into a validated definition
pub fn compile(
    document: &DefinitionDocument,
    strategies: &StrategyLoader,
) -> WorkflowResult<WorkflowDefinition> {
    let mut builder =
        WorkflowDefinition::builder(document.workflow_id.clone(), document.version)
            .name(document.name.clone());
    if let Some(date) = document.effective_date {
        builder = builder.effective_date(date);
    }

    for lane in &document.lanes {
        builder = builder.lane(Lane::new(lane.id.clone(), lane.name.clone()));
    }

    for node in &document.flow_nodes {
        builder = builder.node(compile_node(node, strategies)?);
    }

    for flow in &document.sequence_flows {
        let mut compiled = SequenceFlow::new(flow.id.clone(), flow.source.clone(), flow.target.clone())
            .with_name(flow.name.clone());
        if let Some(declaration) = &flow.condition {
            compiled = compiled.with_condition(strategies.proceed_condition(declaration)?);
        }
        builder = builder.flow(compiled);
    }

    let definition = builder.build()?;
    tracing::debug!(
        workflow_id = %definition.workflow_id(),
        version = definition.version(),
        nodes = definition.flow_nodes().len(),
        "Compiled workflow definition"
    );
    Ok(definition)
}

fn compile_node(node: &FlowNodeDocument, strategies: &StrategyLoader) -> WorkflowResult<FlowNode> {
    let compiled = match node {
        FlowNodeDocument::StartEvent { id, name, lane } => FlowNode::StartEvent(Event {
            id: id.clone(),
            name: name.clone(),
            lane_id: lane.clone(),
        }),
        FlowNodeDocument::TerminateEvent { id, name, lane } => FlowNode::TerminateEvent(Event {
            id: id.clone(),
            name: name.clone(),
            lane_id: lane.clone(),
        }),
        FlowNodeDocument::Task {
            id,
            name,
            lane,
            multi_instance,
            completion_condition,
        } => {
            let condition = completion_condition
                .as_deref()
                .map(|d| strategies.completion_condition(d))
                .transpose()?;
            let mut task = Task::new(id.clone(), name.clone(), *multi_instance, condition)?;
            task.lane_id = lane.clone();
            FlowNode::Task(task)
        }
        FlowNodeDocument::Gateway {
            id,
            name,
            lane,
            gateway_type,
        } => FlowNode::Gateway(Gateway {
            id: id.clone(),
            name: name.clone(),
            lane_id: lane.clone(),
            gateway_type: *gateway_type,
        }),
        FlowNodeDocument::BoundaryEvent {
            id,
            name,
            lane,
            attached_to,
            trigger_id,
            trigger_name,
        } => {
            let mut event = BoundaryEvent::new(id.clone(), attached_to.clone(), trigger_id.clone())
                .with_name(name.clone());
            if let Some(trigger_name) = trigger_name {
                event = event.with_trigger_name(trigger_name.clone());
            }
            event.lane_id = lane.clone();
            FlowNode::BoundaryEvent(event)
        }
    };
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> DefinitionDocument {
        serde_json::from_value(value).unwrap()
    }

    fn approval() -> serde_json::Value {
        json!({
            "workflow_id": "approval",
            "version": 1,
            "name": "Approval",
            "lanes": [{ "id": "managers", "name": "Managers" }],
            "flow_nodes": [
                { "type": "start_event", "id": "f01", "name": "Start" },
                { "type": "task", "id": "f02", "name": "Apply" },
                { "type": "task", "id": "f03", "name": "Approve", "lane": "managers",
                  "multi_instance": "PARALLEL", "completion_condition": "completion.Or(2)" },
                { "type": "gateway", "id": "g01" },
                { "type": "boundary_event", "id": "b01", "attached_to": "f03",
                  "trigger_id": "withdraw", "trigger_name": "Withdraw" },
                { "type": "terminate_event", "id": "f50" },
                { "type": "terminate_event", "id": "f99" }
            ],
            "sequence_flows": [
                { "id": "s1", "source": "f01", "target": "f02" },
                { "id": "s2", "source": "f02", "target": "f03" },
                { "id": "s3", "source": "f03", "target": "g01" },
                { "id": "s4", "source": "g01", "target": "f50",
                  "condition": "proceed.Eq(var, 1000)" },
                { "id": "s5", "source": "g01", "target": "f99" },
                { "id": "s6", "source": "b01", "target": "f02" }
            ]
        })
    }

    #[test]
    fn test_compile_resolves_conditions() {
        let def = compile(&document(approval()), &StrategyLoader::with_builtins()).unwrap();

        assert_eq!(def.key(), &DefinitionKey::new("approval", 1));
        assert_eq!(def.effective_date(), chrono::NaiveDate::MIN);

        let approve = def.find_task(&FlowNodeId::new("f03")).unwrap();
        assert_eq!(approve.multi_instance(), MultiInstanceType::Parallel);
        assert_eq!(approve.lane_id, Some(LaneId::new("managers")));

        let flows: Vec<&SequenceFlow> = def.outgoing_flows(&FlowNodeId::new("g01")).collect();
        assert!(flows[0].condition().is_some());
        assert!(flows[1].condition().is_none());

        let id = InstanceId::new("i-1");
        let hit = json!({ "var": 1000 });
        assert!(flows[0].is_match(&id, hit.as_object()));

        let trigger = TriggerId::new("withdraw");
        let boundary: Vec<&BoundaryEvent> = def.boundary_events(&trigger).collect();
        assert_eq!(boundary[0].trigger_name, "Withdraw");
    }

    #[test]
    fn test_single_task_with_condition_rejected() {
        let mut value = approval();
        value["flow_nodes"][1]["completion_condition"] = json!("completion.All");
        let err = compile(&document(value), &StrategyLoader::with_builtins()).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::CompletionConditionMismatch { .. }
        ));
    }

    #[test]
    fn test_multi_task_without_condition_rejected() {
        let mut value = approval();
        value["flow_nodes"][2]
            .as_object_mut()
            .unwrap()
            .remove("completion_condition");
        let err = compile(&document(value), &StrategyLoader::with_builtins()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unresolvable_condition_aborts() {
        let mut value = approval();
        value["sequence_flows"][3]["condition"] = json!("proceed.Between(var, 1, 2)");
        let err = compile(&document(value), &StrategyLoader::with_builtins()).unwrap_err();
        assert!(matches!(err, WorkflowError::StrategyCreation { .. }));

        let mut value = approval();
        value["sequence_flows"][3]["condition"] = json!("proceed.Eq(var, 1000");
        let err = compile(&document(value), &StrategyLoader::with_builtins()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStrategyPattern(_)));
    }

    #[test]
    fn test_structural_errors_surface() {
        let mut value = approval();
        value["sequence_flows"][0]["target"] = json!("missing");
        let err = compile(&document(value), &StrategyLoader::with_builtins()).unwrap_err();
        assert!(matches!(err, WorkflowError::DanglingSequenceFlow { .. }));
    }
}
