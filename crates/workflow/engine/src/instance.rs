//! Workflow instance: the per-instance state machine
//!
//! A [`WorkflowInstance`] is a short-lived handle. It pairs the instance's
//! current state with its definition and the state store, and every
//! operation writes through to the store before returning. The engine holds
//! no lock across calls; serializing writers of one instance is the store's
//! job.
//!
//! # Lifecycle
//!
//! ```text
//! start ──▶ Active(task) ──complete / trigger──▶ Active(next task)
//!                 │
//!                 └──────── terminate event ──▶ Completed
//! ```
//!
//! On entering a task its active rosters are seeded from the assigned
//! rosters. On leaving a task its active rows are dropped.
//!
//! An instance the store no longer knows is returned as a completed
//! null-object: read-only queries answer as for any completed instance,
//! mutations fail with a state error, and the workflow id and version are
//! unavailable.

use crate::state_machine::StateMachine;
use std::collections::HashSet;
use std::sync::Arc;
use workflow_types::*;

/// A handle on one running (or finished) workflow instance
#[derive(Clone)]
pub struct WorkflowInstance {
    id: InstanceId,
    key: Option<DefinitionKey>,
    origin: Option<Arc<WorkflowDefinition>>,
    state: InstanceState,
    store: Arc<dyn StateStore>,
    state_machine: StateMachine,
}

impl std::fmt::Debug for WorkflowInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowInstance")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("state", &self.state)
            .finish()
    }
}

impl WorkflowInstance {
    // ── Construction ─────────────────────────────────────────────────

    /// Create an instance in the store and traverse from the start event
    pub(crate) fn start(
        definition: Arc<WorkflowDefinition>,
        store: Arc<dyn StateStore>,
        params: Option<&Params>,
    ) -> WorkflowResult<Self> {
        let task_ids: Vec<FlowNodeId> = definition.tasks().map(|t| t.id.clone()).collect();
        let id = store.create_instance(definition.workflow_id(), definition.version(), &task_ids)?;
        let start = definition.start_event().id().clone();
        let key = definition.key().clone();

        let mut instance = Self {
            id,
            key: Some(key.clone()),
            origin: Some(definition),
            state: InstanceState::Completed,
            store,
            state_machine: StateMachine::new(),
        };

        if let Err(e) = instance.advance(None, &start, params) {
            if let Err(cleanup) = instance.store.delete_instance(&instance.id) {
                tracing::warn!(
                    instance_id = %instance.id,
                    error = %cleanup,
                    "Could not remove instance after a failed start"
                );
            }
            return Err(e);
        }

        tracing::info!(
            instance_id = %instance.id,
            workflow_id = %key.workflow_id,
            version = key.version,
            "Workflow instance started"
        );
        Ok(instance)
    }

    /// Rebuild a handle from a stored record
    pub(crate) fn restore(
        record: InstanceRecord,
        definition: Option<Arc<WorkflowDefinition>>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            id: record.instance_id,
            key: Some(DefinitionKey::new(record.workflow_id, record.version)),
            origin: definition,
            state: record.state,
            store,
            state_machine: StateMachine::new(),
        }
    }

    /// The completed null-object for an id the store does not know
    pub(crate) fn purged(id: InstanceId, store: Arc<dyn StateStore>) -> Self {
        Self {
            id,
            key: None,
            origin: None,
            state: InstanceState::Completed,
            store,
            state_machine: StateMachine::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    /// The definition this instance runs on, when it is still known
    pub fn definition(&self) -> Option<&WorkflowDefinition> {
        self.origin.as_deref()
    }

    pub fn workflow_id(&self) -> WorkflowResult<&WorkflowId> {
        self.key
            .as_ref()
            .map(|k| &k.workflow_id)
            .ok_or(WorkflowError::Unsupported(
                "workflow id of a completed instance whose detail was purged",
            ))
    }

    pub fn version(&self) -> WorkflowResult<u32> {
        self.key
            .as_ref()
            .map(|k| k.version)
            .ok_or(WorkflowError::Unsupported(
                "version of a completed instance whose detail was purged",
            ))
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    /// Whether the instance currently rests on `flow_node_id`
    pub fn is_active(&self, flow_node_id: &FlowNodeId) -> bool {
        self.state.active_flow_node_id() == Some(flow_node_id)
    }

    pub fn active_flow_node_id(&self) -> Option<&FlowNodeId> {
        self.state.active_flow_node_id()
    }

    /// Roster of users assigned to `task_id`, in execution order
    pub fn assigned_users(&self, task_id: &FlowNodeId) -> WorkflowResult<Vec<ActorId>> {
        self.assigned(ActorKind::User, task_id)
    }

    /// Roster of groups assigned to `task_id`, in execution order
    pub fn assigned_groups(&self, task_id: &FlowNodeId) -> WorkflowResult<Vec<ActorId>> {
        self.assigned(ActorKind::Group, task_id)
    }

    /// Whether `actor` still owes input on the active task
    pub fn has_active_user_task(&self, actor: &ActorId) -> WorkflowResult<bool> {
        self.has_active(ActorKind::User, actor)
    }

    pub fn has_active_group_task(&self, actor: &ActorId) -> WorkflowResult<bool> {
        self.has_active(ActorKind::Group, actor)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Record that `actor` finished the active task as a user
    pub fn complete_user_task(
        &mut self,
        params: Option<&Params>,
        actor: &ActorId,
    ) -> WorkflowResult<()> {
        self.complete(ActorKind::User, params, actor)
    }

    /// Record that `actor` finished the active task as a group
    pub fn complete_group_task(
        &mut self,
        params: Option<&Params>,
        actor: &ActorId,
    ) -> WorkflowResult<()> {
        self.complete(ActorKind::Group, params, actor)
    }

    /// Interrupt the active task through one of its boundary events
    pub fn trigger_event(
        &mut self,
        trigger_id: &TriggerId,
        params: Option<&Params>,
    ) -> WorkflowResult<()> {
        let (definition, task_id) = self.require_active()?;
        let event_id = definition
            .boundary_events(trigger_id)
            .find(|event| event.attached_task_id == task_id)
            .map(|event| event.id.clone())
            .ok_or_else(|| WorkflowError::UnknownTrigger {
                instance_id: self.id.clone(),
                task_id: task_id.clone(),
                trigger_id: trigger_id.clone(),
            })?;

        tracing::info!(
            instance_id = %self.id,
            task_id = %task_id,
            trigger_id = %trigger_id,
            "Boundary event triggered"
        );
        self.advance(Some(&task_id), &event_id, params)
    }

    /// Replace the user roster of a task
    pub fn assign_users(&self, task_id: &FlowNodeId, actors: &[ActorId]) -> WorkflowResult<()> {
        self.assign(ActorKind::User, task_id, actors)
    }

    /// Replace the group roster of a task
    pub fn assign_groups(&self, task_id: &FlowNodeId, actors: &[ActorId]) -> WorkflowResult<()> {
        self.assign(ActorKind::Group, task_id, actors)
    }

    /// Give every task in a lane its own copy of the user roster
    pub fn assign_users_to_lane(&self, lane_id: &LaneId, actors: &[ActorId]) -> WorkflowResult<()> {
        self.assign_to_lane(ActorKind::User, lane_id, actors)
    }

    /// Give every task in a lane its own copy of the group roster
    pub fn assign_groups_to_lane(
        &self,
        lane_id: &LaneId,
        actors: &[ActorId],
    ) -> WorkflowResult<()> {
        self.assign_to_lane(ActorKind::Group, lane_id, actors)
    }

    /// Swap one assigned user for another, keeping roster position
    pub fn change_assigned_user(
        &self,
        task_id: &FlowNodeId,
        old: &ActorId,
        new: &ActorId,
    ) -> WorkflowResult<()> {
        self.change_assigned(ActorKind::User, task_id, old, new)
    }

    /// Swap one assigned group for another, keeping roster position
    pub fn change_assigned_group(
        &self,
        task_id: &FlowNodeId,
        old: &ActorId,
        new: &ActorId,
    ) -> WorkflowResult<()> {
        self.change_assigned(ActorKind::Group, task_id, old, new)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Definition and active task, or a state error once completed
    fn require_active(&self) -> WorkflowResult<(Arc<WorkflowDefinition>, FlowNodeId)> {
        match (&self.state, &self.origin) {
            (InstanceState::Active(task_id), Some(definition)) => {
                Ok((Arc::clone(definition), task_id.clone()))
            }
            _ => Err(WorkflowError::AlreadyCompleted {
                instance_id: self.id.clone(),
            }),
        }
    }

    fn complete(
        &mut self,
        kind: ActorKind,
        params: Option<&Params>,
        actor: &ActorId,
    ) -> WorkflowResult<()> {
        let (definition, task_id) = self.require_active()?;
        let task = definition.find_task(&task_id)?;

        // Ordering on SEQUENTIAL tasks is recorded, not enforced.
        let row = self
            .store
            .active_tasks(&self.id, &task_id, kind)?
            .into_iter()
            .find(|row| &row.actor == actor);
        if !self.store.delete_active_task(&self.id, &task_id, kind, actor)? {
            tracing::warn!(
                instance_id = %self.id,
                task_id = %task_id,
                %kind,
                actor = %actor,
                "Completion by an actor without an active task record"
            );
        }

        let done = task
            .completion_condition()
            .is_completed(self.store.as_ref(), kind, params, &self.id, task)?;
        if !done {
            tracing::debug!(
                instance_id = %self.id,
                task_id = %task_id,
                actor = %actor,
                "Task still waiting on other actors"
            );
            return Ok(());
        }

        tracing::debug!(instance_id = %self.id, task_id = %task_id, "Task completed");
        if let Err(e) = self.advance(Some(&task_id), &task_id, params) {
            // The task stays active, so the completion is taken back too.
            if let Some(row) = row {
                self.store
                    .save_active_task(&self.id, &task_id, kind, &row.actor, row.sequence)?;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Traverse from `from`, then leave `leaving` and persist the new state.
    ///
    /// Nothing is written until traversal has succeeded.
    fn advance(
        &mut self,
        leaving: Option<&FlowNodeId>,
        from: &FlowNodeId,
        params: Option<&Params>,
    ) -> WorkflowResult<()> {
        let definition = match &self.origin {
            Some(definition) => Arc::clone(definition),
            None => {
                return Err(WorkflowError::AlreadyCompleted {
                    instance_id: self.id.clone(),
                })
            }
        };
        let next = self
            .state_machine
            .advance(&definition, &self.id, from, params)?;

        if let Some(task_id) = leaving {
            self.leave(task_id)?;
        }
        if let InstanceState::Active(task_id) = &next {
            self.enter(task_id)?;
        }
        self.store.save_instance_state(&self.id, &next)?;
        self.state = next;

        match &self.state {
            InstanceState::Active(task_id) => {
                tracing::debug!(instance_id = %self.id, task_id = %task_id, "Task activated");
            }
            InstanceState::Completed => {
                tracing::info!(instance_id = %self.id, "Workflow instance completed");
            }
        }
        Ok(())
    }

    /// Seed the active rosters of a task from its assigned rosters
    fn enter(&self, task_id: &FlowNodeId) -> WorkflowResult<()> {
        for kind in ActorKind::ALL {
            let assigned = self.store.assigned(&self.id, task_id, kind)?;
            self.store
                .save_active_tasks(&self.id, task_id, kind, &assigned)?;
        }
        Ok(())
    }

    fn leave(&self, task_id: &FlowNodeId) -> WorkflowResult<()> {
        for kind in ActorKind::ALL {
            self.store.delete_active_tasks(&self.id, task_id, kind)?;
        }
        Ok(())
    }

    fn assigned(&self, kind: ActorKind, task_id: &FlowNodeId) -> WorkflowResult<Vec<ActorId>> {
        let definition = match (&self.state, &self.origin) {
            (InstanceState::Active(_), Some(definition)) => definition,
            _ => return Ok(Vec::new()),
        };
        definition.find_task(task_id)?;
        Ok(self.store.assigned(&self.id, task_id, kind)?)
    }

    fn has_active(&self, kind: ActorKind, actor: &ActorId) -> WorkflowResult<bool> {
        match &self.state {
            InstanceState::Active(task_id) => Ok(self
                .store
                .active_task_count_by_actor(&self.id, task_id, kind, actor)?
                > 0),
            InstanceState::Completed => Ok(false),
        }
    }

    fn assign(&self, kind: ActorKind, task_id: &FlowNodeId, actors: &[ActorId]) -> WorkflowResult<()> {
        let (definition, _) = self.require_active()?;
        let task = definition.find_task(task_id)?;
        self.check_roster(kind, task, actors)?;
        self.write_roster(kind, task_id, actors)
    }

    fn assign_to_lane(
        &self,
        kind: ActorKind,
        lane_id: &LaneId,
        actors: &[ActorId],
    ) -> WorkflowResult<()> {
        let (definition, _) = self.require_active()?;
        if definition.find_lane(lane_id).is_none() {
            return Err(WorkflowError::LaneNotFound {
                definition: definition.key().clone(),
                lane_id: lane_id.clone(),
            });
        }

        let tasks: Vec<&Task> = definition.tasks_in_lane(lane_id).collect();
        for task in &tasks {
            self.check_roster(kind, task, actors)?;
        }
        for task in &tasks {
            self.write_roster(kind, &task.id, actors)?;
        }
        tracing::debug!(
            instance_id = %self.id,
            lane_id = %lane_id,
            tasks = tasks.len(),
            %kind,
            "Lane roster assigned"
        );
        Ok(())
    }

    /// One actor for a single-instance task, and no actor twice
    fn check_roster(&self, kind: ActorKind, task: &Task, actors: &[ActorId]) -> WorkflowResult<()> {
        if !task.is_multi_instance() && actors.len() > 1 {
            return Err(WorkflowError::TooManyActors {
                instance_id: self.id.clone(),
                task_id: task.id.clone(),
                count: actors.len(),
            });
        }
        let mut seen = HashSet::with_capacity(actors.len());
        if let Some(actor) = actors.iter().find(|actor| !seen.insert(*actor)) {
            return Err(self.duplicate(kind, &task.id, actor));
        }
        Ok(())
    }

    fn duplicate(&self, kind: ActorKind, task_id: &FlowNodeId, actor: &ActorId) -> WorkflowError {
        WorkflowError::DuplicateActor {
            instance_id: self.id.clone(),
            task_id: task_id.clone(),
            kind,
            actor: actor.clone(),
        }
    }

    fn write_roster(
        &self,
        kind: ActorKind,
        task_id: &FlowNodeId,
        actors: &[ActorId],
    ) -> WorkflowResult<()> {
        self.store.save_assigned(&self.id, task_id, kind, actors)?;
        if self.is_active(task_id) {
            self.store.save_active_tasks(&self.id, task_id, kind, actors)?;
        }
        Ok(())
    }

    fn change_assigned(
        &self,
        kind: ActorKind,
        task_id: &FlowNodeId,
        old: &ActorId,
        new: &ActorId,
    ) -> WorkflowResult<()> {
        let (definition, _) = self.require_active()?;
        definition.find_task(task_id)?;

        if old != new && self.store.assigned(&self.id, task_id, kind)?.contains(new) {
            return Err(self.duplicate(kind, task_id, new));
        }
        if !self.store.change_assigned(&self.id, task_id, kind, old, new)? {
            return Err(WorkflowError::ActorNotAssigned {
                instance_id: self.id.clone(),
                task_id: task_id.clone(),
                kind,
                actor: old.clone(),
            });
        }
        if self.is_active(task_id) {
            self.store
                .change_active_task(&self.id, task_id, kind, old, new)?;
        }
        Ok(())
    }
}
