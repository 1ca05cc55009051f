//! State store port: durable per-instance state.
//!
//! The engine keeps nothing between calls. Instance headers, assigned
//! rosters and active-actor rows all live behind this trait. Implementations
//! are responsible for serializing concurrent mutations of one instance.

use crate::{
    ActiveTask, ActorId, ActorKind, FlowNodeId, InstanceId, InstanceRecord, InstanceState,
    StoreResult, WorkflowId,
};

/// Persistence of workflow instances and their task assignments
pub trait StateStore: Send + Sync {
    // ── Instances ────────────────────────────────────────────────────

    /// Create an instance header and empty rosters for `task_ids`
    fn create_instance(
        &self,
        workflow_id: &WorkflowId,
        version: u32,
        task_ids: &[FlowNodeId],
    ) -> StoreResult<InstanceId>;

    fn find_instance(&self, instance_id: &InstanceId) -> StoreResult<Option<InstanceRecord>>;

    fn find_active_flow_node_id(&self, instance_id: &InstanceId) -> StoreResult<Option<FlowNodeId>> {
        Ok(self
            .find_instance(instance_id)?
            .and_then(|r| r.state.active_flow_node_id().cloned()))
    }

    fn save_instance_state(&self, instance_id: &InstanceId, state: &InstanceState)
        -> StoreResult<()>;

    /// Drop an instance that never reached its first resting state, with
    /// its rosters and active rows; unknown ids are ignored
    fn delete_instance(&self, instance_id: &InstanceId) -> StoreResult<()>;

    // ── Assigned rosters ─────────────────────────────────────────────

    /// Replace the roster of `task_id`, keeping the given order
    fn save_assigned(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actors: &[ActorId],
    ) -> StoreResult<()>;

    fn assigned(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<Vec<ActorId>>;

    fn task_assigned_count(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<usize> {
        Ok(self.assigned(instance_id, task_id, kind)?.len())
    }

    /// Replace `old` by `new` in place; false when `old` is not assigned
    fn change_assigned(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        old: &ActorId,
        new: &ActorId,
    ) -> StoreResult<bool>;

    // ── Active tasks ─────────────────────────────────────────────────

    fn save_active_task(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actor: &ActorId,
        sequence: u32,
    ) -> StoreResult<()>;

    /// Replace the active rows of `task_id`; sequence numbers start at 1
    fn save_active_tasks(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actors: &[ActorId],
    ) -> StoreResult<()> {
        self.delete_active_tasks(instance_id, task_id, kind)?;
        for (seq, actor) in (1u32..).zip(actors) {
            self.save_active_task(instance_id, task_id, kind, actor, seq)?;
        }
        Ok(())
    }

    /// Remove one actor's active row; false when there was none
    fn delete_active_task(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actor: &ActorId,
    ) -> StoreResult<bool>;

    fn delete_active_tasks(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<()>;

    /// Active rows of `task_id` ordered by sequence
    fn active_tasks(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<Vec<ActiveTask>>;

    /// Active rows of one task, or of the whole instance when `task_id` is `None`
    fn active_task_count(
        &self,
        instance_id: &InstanceId,
        task_id: Option<&FlowNodeId>,
        kind: ActorKind,
    ) -> StoreResult<usize>;

    fn active_task_count_by_actor(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actor: &ActorId,
    ) -> StoreResult<usize>;

    /// Replace `old` by `new` keeping its sequence; false when `old` is not active
    fn change_active_task(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        old: &ActorId,
        new: &ActorId,
    ) -> StoreResult<bool>;
}
