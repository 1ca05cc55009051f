//! In-memory reference implementation of the state store port.
//!
//! Deterministic and test-friendly. Each map sits behind its own `RwLock`;
//! a poisoned lock is reported as a backend error. Saving the `Completed`
//! state purges the instance's rosters and active rows but keeps its header.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use workflow_types::{
    ActiveTask, ActorId, ActorKind, FlowNodeId, InstanceId, InstanceRecord, InstanceState,
    StateStore, StoreError, StoreResult, WorkflowId,
};

type RosterKey = (InstanceId, FlowNodeId, ActorKind);

/// In-memory workflow state store.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    instances: RwLock<HashMap<InstanceId, InstanceRecord>>,
    assigned: RwLock<HashMap<RosterKey, Vec<ActorId>>>,
    active: RwLock<HashMap<RosterKey, Vec<ActiveTask>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instance headers held, completed ones included
    pub fn instance_count(&self) -> StoreResult<usize> {
        Ok(read(&self.instances, "instances")?.len())
    }

    fn ensure_instance(&self, instance_id: &InstanceId) -> StoreResult<()> {
        if read(&self.instances, "instances")?.contains_key(instance_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!(
                "workflow instance {instance_id} not found"
            )))
        }
    }

    fn purge(&self, instance_id: &InstanceId) -> StoreResult<()> {
        write(&self.assigned, "assigned")?.retain(|(id, _, _), _| id != instance_id);
        write(&self.active, "active")?.retain(|(id, _, _), _| id != instance_id);
        tracing::debug!(instance_id = %instance_id, "Purged instance rosters");
        Ok(())
    }
}

fn key(instance_id: &InstanceId, task_id: &FlowNodeId, kind: ActorKind) -> RosterKey {
    (instance_id.clone(), task_id.clone(), kind)
}

fn read<'a, T>(lock: &'a RwLock<T>, name: &str) -> StoreResult<RwLockReadGuard<'a, T>> {
    lock.read()
        .map_err(|_| StoreError::Backend(format!("{name} lock poisoned")))
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &str) -> StoreResult<RwLockWriteGuard<'a, T>> {
    lock.write()
        .map_err(|_| StoreError::Backend(format!("{name} lock poisoned")))
}

impl StateStore for InMemoryStateStore {
    fn create_instance(
        &self,
        workflow_id: &WorkflowId,
        version: u32,
        task_ids: &[FlowNodeId],
    ) -> StoreResult<InstanceId> {
        let instance_id = InstanceId::generate();
        {
            let mut guard = write(&self.instances, "instances")?;
            if guard.contains_key(&instance_id) {
                return Err(StoreError::Conflict(format!(
                    "workflow instance {instance_id} already exists"
                )));
            }
            // Not placed yet; the engine saves the first resting state after
            // traversal, or deletes the header when traversal fails.
            guard.insert(
                instance_id.clone(),
                InstanceRecord {
                    instance_id: instance_id.clone(),
                    workflow_id: workflow_id.clone(),
                    version,
                    state: InstanceState::Completed,
                },
            );
        }

        let mut assigned = write(&self.assigned, "assigned")?;
        for task_id in task_ids {
            for kind in ActorKind::ALL {
                assigned.insert(key(&instance_id, task_id, kind), Vec::new());
            }
        }
        Ok(instance_id)
    }

    fn find_instance(&self, instance_id: &InstanceId) -> StoreResult<Option<InstanceRecord>> {
        Ok(read(&self.instances, "instances")?.get(instance_id).cloned())
    }

    fn save_instance_state(
        &self,
        instance_id: &InstanceId,
        state: &InstanceState,
    ) -> StoreResult<()> {
        {
            let mut guard = write(&self.instances, "instances")?;
            let record = guard.get_mut(instance_id).ok_or_else(|| {
                StoreError::NotFound(format!("workflow instance {instance_id} not found"))
            })?;
            record.state = state.clone();
        }
        if state.is_completed() {
            self.purge(instance_id)?;
        }
        Ok(())
    }

    fn delete_instance(&self, instance_id: &InstanceId) -> StoreResult<()> {
        write(&self.instances, "instances")?.remove(instance_id);
        self.purge(instance_id)
    }

    fn save_assigned(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actors: &[ActorId],
    ) -> StoreResult<()> {
        self.ensure_instance(instance_id)?;
        write(&self.assigned, "assigned")?.insert(key(instance_id, task_id, kind), actors.to_vec());
        Ok(())
    }

    fn assigned(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<Vec<ActorId>> {
        Ok(read(&self.assigned, "assigned")?
            .get(&key(instance_id, task_id, kind))
            .cloned()
            .unwrap_or_default())
    }

    fn change_assigned(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        old: &ActorId,
        new: &ActorId,
    ) -> StoreResult<bool> {
        let mut guard = write(&self.assigned, "assigned")?;
        let slot = guard
            .get_mut(&key(instance_id, task_id, kind))
            .and_then(|roster| roster.iter_mut().find(|a| *a == old));
        Ok(match slot {
            Some(actor) => {
                *actor = new.clone();
                true
            }
            None => false,
        })
    }

    fn save_active_task(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actor: &ActorId,
        sequence: u32,
    ) -> StoreResult<()> {
        self.ensure_instance(instance_id)?;
        let mut guard = write(&self.active, "active")?;
        let rows = guard.entry(key(instance_id, task_id, kind)).or_default();
        rows.retain(|row| &row.actor != actor);
        rows.push(ActiveTask {
            actor: actor.clone(),
            sequence,
        });
        rows.sort_by_key(|row| row.sequence);
        Ok(())
    }

    fn delete_active_task(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actor: &ActorId,
    ) -> StoreResult<bool> {
        let mut guard = write(&self.active, "active")?;
        let Some(rows) = guard.get_mut(&key(instance_id, task_id, kind)) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| &row.actor != actor);
        Ok(rows.len() != before)
    }

    fn delete_active_tasks(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<()> {
        write(&self.active, "active")?.remove(&key(instance_id, task_id, kind));
        Ok(())
    }

    fn active_tasks(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
    ) -> StoreResult<Vec<ActiveTask>> {
        Ok(read(&self.active, "active")?
            .get(&key(instance_id, task_id, kind))
            .cloned()
            .unwrap_or_default())
    }

    fn active_task_count(
        &self,
        instance_id: &InstanceId,
        task_id: Option<&FlowNodeId>,
        kind: ActorKind,
    ) -> StoreResult<usize> {
        let guard = read(&self.active, "active")?;
        Ok(guard
            .iter()
            .filter(|((id, task, k), _)| {
                id == instance_id && *k == kind && task_id.map_or(true, |t| t == task)
            })
            .map(|(_, rows)| rows.len())
            .sum())
    }

    fn active_task_count_by_actor(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        actor: &ActorId,
    ) -> StoreResult<usize> {
        Ok(read(&self.active, "active")?
            .get(&key(instance_id, task_id, kind))
            .map_or(0, |rows| rows.iter().filter(|row| &row.actor == actor).count()))
    }

    fn change_active_task(
        &self,
        instance_id: &InstanceId,
        task_id: &FlowNodeId,
        kind: ActorKind,
        old: &ActorId,
        new: &ActorId,
    ) -> StoreResult<bool> {
        let mut guard = write(&self.active, "active")?;
        let slot = guard
            .get_mut(&key(instance_id, task_id, kind))
            .and_then(|rows| rows.iter_mut().find(|row| &row.actor == old));
        Ok(match slot {
            Some(row) => {
                row.actor = new.clone();
                true
            }
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn actors(names: &[&str]) -> Vec<ActorId> {
        names.iter().map(|n| ActorId::new(*n)).collect()
    }

    fn started(store: &InMemoryStateStore) -> InstanceId {
        let id = store
            .create_instance(
                &WorkflowId::new("expense"),
                1,
                &[FlowNodeId::new("f02"), FlowNodeId::new("f03")],
            )
            .unwrap();
        store
            .save_instance_state(&id, &InstanceState::Active(FlowNodeId::new("f02")))
            .unwrap();
        id
    }

    #[test]
    fn test_create_and_find_instance() {
        let store = InMemoryStateStore::new();
        let id = started(&store);

        let record = store.find_instance(&id).unwrap().unwrap();
        assert_eq!(record.workflow_id.as_str(), "expense");
        assert_eq!(record.version, 1);
        assert_eq!(
            store.find_active_flow_node_id(&id).unwrap(),
            Some(FlowNodeId::new("f02"))
        );
        assert!(store.assigned(&id, &FlowNodeId::new("f03"), ActorKind::User).unwrap().is_empty());
        assert!(store.find_instance(&InstanceId::new("unknown")).unwrap().is_none());
        assert_eq!(store.instance_count().unwrap(), 1);
    }

    #[test]
    fn test_assigned_roster_replaced_and_changed() {
        let store = InMemoryStateStore::new();
        let id = started(&store);
        let task = FlowNodeId::new("f03");

        store
            .save_assigned(&id, &task, ActorKind::User, &actors(&["alice", "bob"]))
            .unwrap();
        store
            .save_assigned(&id, &task, ActorKind::User, &actors(&["carol", "dave", "erin"]))
            .unwrap();
        assert_eq!(store.task_assigned_count(&id, &task, ActorKind::User).unwrap(), 3);
        assert_eq!(store.task_assigned_count(&id, &task, ActorKind::Group).unwrap(), 0);

        let changed = store
            .change_assigned(&id, &task, ActorKind::User, &ActorId::new("dave"), &ActorId::new("zoe"))
            .unwrap();
        assert!(changed);
        assert_eq!(
            store.assigned(&id, &task, ActorKind::User).unwrap(),
            actors(&["carol", "zoe", "erin"])
        );

        let missing = store
            .change_assigned(&id, &task, ActorKind::User, &ActorId::new("nobody"), &ActorId::new("x"))
            .unwrap();
        assert!(!missing);
    }

    #[test]
    fn test_save_assigned_unknown_instance() {
        let store = InMemoryStateStore::new();
        let err = store
            .save_assigned(
                &InstanceId::new("ghost"),
                &FlowNodeId::new("f02"),
                ActorKind::User,
                &actors(&["alice"]),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_active_rows_keep_sequence() {
        let store = InMemoryStateStore::new();
        let id = started(&store);
        let task = FlowNodeId::new("f02");

        store
            .save_active_tasks(&id, &task, ActorKind::User, &actors(&["alice", "bob", "carol"]))
            .unwrap();
        let rows = store.active_tasks(&id, &task, ActorKind::User).unwrap();
        let seqs: Vec<(String, u32)> = rows
            .iter()
            .map(|r| (r.actor.to_string(), r.sequence))
            .collect();
        assert_eq!(
            seqs,
            vec![
                ("alice".to_string(), 1),
                ("bob".to_string(), 2),
                ("carol".to_string(), 3)
            ]
        );

        assert!(store
            .delete_active_task(&id, &task, ActorKind::User, &ActorId::new("bob"))
            .unwrap());
        assert!(!store
            .delete_active_task(&id, &task, ActorKind::User, &ActorId::new("bob"))
            .unwrap());
        assert_eq!(store.active_task_count(&id, Some(&task), ActorKind::User).unwrap(), 2);

        assert!(store
            .change_active_task(&id, &task, ActorKind::User, &ActorId::new("carol"), &ActorId::new("dan"))
            .unwrap());
        let rows = store.active_tasks(&id, &task, ActorKind::User).unwrap();
        assert_eq!(rows[1].actor.as_str(), "dan");
        assert_eq!(rows[1].sequence, 3);
        assert_eq!(
            store
                .active_task_count_by_actor(&id, &task, ActorKind::User, &ActorId::new("dan"))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_active_count_scopes() {
        let store = InMemoryStateStore::new();
        let id = started(&store);
        let other = started(&store);
        let f02 = FlowNodeId::new("f02");
        let f03 = FlowNodeId::new("f03");

        store.save_active_tasks(&id, &f02, ActorKind::User, &actors(&["a", "b"])).unwrap();
        store.save_active_tasks(&id, &f03, ActorKind::User, &actors(&["c"])).unwrap();
        store.save_active_tasks(&id, &f02, ActorKind::Group, &actors(&["g"])).unwrap();
        store.save_active_tasks(&other, &f02, ActorKind::User, &actors(&["z"])).unwrap();

        assert_eq!(store.active_task_count(&id, None, ActorKind::User).unwrap(), 3);
        assert_eq!(store.active_task_count(&id, Some(&f03), ActorKind::User).unwrap(), 1);
        assert_eq!(store.active_task_count(&id, None, ActorKind::Group).unwrap(), 1);

        store.delete_active_tasks(&id, &f02, ActorKind::User).unwrap();
        assert_eq!(store.active_task_count(&id, None, ActorKind::User).unwrap(), 1);
    }

    #[test]
    fn test_completion_purges_assignments() {
        let store = InMemoryStateStore::new();
        let id = started(&store);
        let task = FlowNodeId::new("f02");
        store.save_assigned(&id, &task, ActorKind::User, &actors(&["alice"])).unwrap();
        store.save_active_tasks(&id, &task, ActorKind::User, &actors(&["alice"])).unwrap();

        store.save_instance_state(&id, &InstanceState::Completed).unwrap();

        let record = store.find_instance(&id).unwrap().unwrap();
        assert!(record.state.is_completed());
        assert!(store.assigned(&id, &task, ActorKind::User).unwrap().is_empty());
        assert_eq!(store.active_task_count(&id, None, ActorKind::User).unwrap(), 0);
        assert_eq!(store.find_active_flow_node_id(&id).unwrap(), None);
    }

    #[test]
    fn test_delete_instance_removes_everything() {
        let store = InMemoryStateStore::new();
        let id = started(&store);
        let kept = started(&store);
        let task = FlowNodeId::new("f02");
        store.save_assigned(&id, &task, ActorKind::User, &actors(&["alice"])).unwrap();
        store.save_active_tasks(&id, &task, ActorKind::User, &actors(&["alice"])).unwrap();

        store.delete_instance(&id).unwrap();

        assert!(store.find_instance(&id).unwrap().is_none());
        assert!(store.find_instance(&kept).unwrap().is_some());
        assert!(store.assigned(&id, &task, ActorKind::User).unwrap().is_empty());
        assert_eq!(store.active_task_count(&id, None, ActorKind::User).unwrap(), 0);
        assert_eq!(store.instance_count().unwrap(), 1);
        store.delete_instance(&InstanceId::new("unknown")).unwrap();
    }

    #[test]
    fn test_shared_across_threads() {
        let store = Arc::new(InMemoryStateStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || started(&store))
            })
            .collect();
        let ids: Vec<InstanceId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(store.instance_count().unwrap(), 4);
        assert_eq!(ids.len(), 4);
    }
}
