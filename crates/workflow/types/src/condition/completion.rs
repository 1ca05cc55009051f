use super::CompletionCondition;
use crate::{ActorKind, InstanceId, Params, StateStore, StoreResult, Task};

/// Finished after the first completion; implied for single-instance tasks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SingleCompletionCondition;

impl CompletionCondition for SingleCompletionCondition {
    fn is_completed(
        &self,
        _: &dyn StateStore,
        _: ActorKind,
        _: Option<&Params>,
        _: &InstanceId,
        _: &Task,
    ) -> StoreResult<bool> {
        Ok(true)
    }
}

/// Finished once no actor of the kind is still active on the instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllCompletionCondition;

impl CompletionCondition for AllCompletionCondition {
    fn is_completed(
        &self,
        store: &dyn StateStore,
        kind: ActorKind,
        _: Option<&Params>,
        instance_id: &InstanceId,
        _: &Task,
    ) -> StoreResult<bool> {
        Ok(store.active_task_count(instance_id, None, kind)? == 0)
    }
}

/// Finished when `threshold` actors have completed, or when nobody is left
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrCompletionCondition {
    threshold: usize,
}

impl OrCompletionCondition {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn parse(threshold: &str) -> Result<Self, String> {
        threshold
            .parse::<usize>()
            .map(Self::new)
            .map_err(|e| format!("threshold '{threshold}' is not an unsigned integer: {e}"))
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn decide(&self, assigned: usize, active: usize) -> bool {
        active == 0 || assigned.saturating_sub(active) >= self.threshold
    }
}

impl CompletionCondition for OrCompletionCondition {
    fn is_completed(
        &self,
        store: &dyn StateStore,
        kind: ActorKind,
        _: Option<&Params>,
        instance_id: &InstanceId,
        task: &Task,
    ) -> StoreResult<bool> {
        let active = store.active_task_count(instance_id, Some(&task.id), kind)?;
        if active == 0 {
            return Ok(true);
        }
        let assigned = store.task_assigned_count(instance_id, &task.id, kind)?;
        Ok(self.decide(assigned, active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ActiveTask, ActorId, FlowNodeId, InstanceRecord, InstanceState, MultiInstanceType,
        WorkflowId,
    };
    use proptest::prelude::*;
    use std::sync::Arc;

    /// Store answering count queries from fixed numbers
    #[derive(Debug, Default)]
    struct CountingStore {
        assigned: usize,
        active_on_task: usize,
        active_on_instance: usize,
    }

    impl StateStore for CountingStore {
        fn create_instance(&self, _: &WorkflowId, _: u32, _: &[FlowNodeId]) -> StoreResult<InstanceId> {
            Ok(InstanceId::new("i-1"))
        }

        fn find_instance(&self, _: &InstanceId) -> StoreResult<Option<InstanceRecord>> {
            Ok(None)
        }

        fn save_instance_state(&self, _: &InstanceId, _: &InstanceState) -> StoreResult<()> {
            Ok(())
        }

        fn delete_instance(&self, _: &InstanceId) -> StoreResult<()> {
            Ok(())
        }

        fn save_assigned(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind, _: &[ActorId]) -> StoreResult<()> {
            Ok(())
        }

        fn assigned(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind) -> StoreResult<Vec<ActorId>> {
            Ok((0..self.assigned).map(|i| ActorId::new(format!("u{i}"))).collect())
        }

        fn change_assigned(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind, _: &ActorId, _: &ActorId) -> StoreResult<bool> {
            Ok(false)
        }

        fn save_active_task(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind, _: &ActorId, _: u32) -> StoreResult<()> {
            Ok(())
        }

        fn delete_active_task(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind, _: &ActorId) -> StoreResult<bool> {
            Ok(false)
        }

        fn delete_active_tasks(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind) -> StoreResult<()> {
            Ok(())
        }

        fn active_tasks(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind) -> StoreResult<Vec<ActiveTask>> {
            Ok(Vec::new())
        }

        fn active_task_count(&self, _: &InstanceId, task_id: Option<&FlowNodeId>, _: ActorKind) -> StoreResult<usize> {
            Ok(match task_id {
                Some(_) => self.active_on_task,
                None => self.active_on_instance,
            })
        }

        fn active_task_count_by_actor(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind, _: &ActorId) -> StoreResult<usize> {
            Ok(0)
        }

        fn change_active_task(&self, _: &InstanceId, _: &FlowNodeId, _: ActorKind, _: &ActorId, _: &ActorId) -> StoreResult<bool> {
            Ok(false)
        }
    }

    fn task() -> Task {
        Task::new(
            "f03",
            "Approve",
            MultiInstanceType::Parallel,
            Some(Arc::new(AllCompletionCondition)),
        )
        .unwrap()
    }

    fn store(assigned: usize, active: usize) -> CountingStore {
        CountingStore {
            assigned,
            active_on_task: active,
            active_on_instance: active,
        }
    }

    #[test]
    fn test_single_always_completes() {
        let id = InstanceId::new("i-1");
        let done = SingleCompletionCondition
            .is_completed_user_task(&store(3, 3), None, &id, &task())
            .unwrap();
        assert!(done);
    }

    #[test]
    fn test_all_waits_for_every_actor() {
        let id = InstanceId::new("i-1");
        let all = AllCompletionCondition;
        assert!(!all.is_completed_user_task(&store(3, 1), None, &id, &task()).unwrap());
        assert!(all.is_completed_user_task(&store(3, 0), None, &id, &task()).unwrap());
        assert!(!all.is_completed_group_task(&store(2, 2), None, &id, &task()).unwrap());
    }

    #[test]
    fn test_all_counts_the_whole_instance() {
        let id = InstanceId::new("i-1");
        let s = CountingStore {
            assigned: 3,
            active_on_task: 0,
            active_on_instance: 1,
        };
        assert!(!AllCompletionCondition
            .is_completed_user_task(&s, None, &id, &task())
            .unwrap());
    }

    #[test]
    fn test_or_threshold() {
        let id = InstanceId::new("i-1");
        let two = OrCompletionCondition::new(2);
        let three = OrCompletionCondition::parse("3").unwrap();

        assert!(two.is_completed_user_task(&store(3, 1), None, &id, &task()).unwrap());
        assert!(!three.is_completed_user_task(&store(3, 1), None, &id, &task()).unwrap());
        assert!(three.is_completed_user_task(&store(3, 0), None, &id, &task()).unwrap());
        assert!(OrCompletionCondition::new(100)
            .is_completed_group_task(&store(3, 0), None, &id, &task())
            .unwrap());
    }

    #[test]
    fn test_or_parse_rejects_garbage() {
        assert!(OrCompletionCondition::parse("two").is_err());
        assert!(OrCompletionCondition::parse("-1").is_err());
        assert_eq!(OrCompletionCondition::parse("2").unwrap().threshold(), 2);
    }

    proptest! {
        #[test]
        fn prop_or_matches_formula(
            assigned in 0usize..20,
            active in 0usize..20,
            threshold in 0usize..25,
        ) {
            let active = active.min(assigned);
            let id = InstanceId::new("i-1");
            let got = OrCompletionCondition::new(threshold)
                .is_completed_user_task(&store(assigned, active), None, &id, &task())
                .unwrap();
            prop_assert_eq!(got, active == 0 || assigned - active >= threshold);
        }
    }
}
