//! Condition strategies
//!
//! Two independent families:
//! - [`FlowProceedCondition`] decides whether a sequence flow may be taken.
//! - [`CompletionCondition`] decides whether a multi-actor task is finished.
//!
//! Strategies hold only the configuration they were constructed with and are
//! shared between instances and threads through `Arc`.

mod completion;
mod proceed;

pub use completion::*;
pub use proceed::*;

use crate::{ActorKind, InstanceId, Params, SequenceFlow, StateStore, StoreResult, Task};

/// Branch selection on a sequence flow
pub trait FlowProceedCondition: Send + Sync + std::fmt::Debug {
    fn is_match(
        &self,
        instance_id: &InstanceId,
        params: Option<&Params>,
        sequence_flow: &SequenceFlow,
    ) -> bool;
}

/// Completion rule of a task worked by several actors
pub trait CompletionCondition: Send + Sync + std::fmt::Debug {
    /// Whether `task` is finished for actors of `kind`
    fn is_completed(
        &self,
        store: &dyn StateStore,
        kind: ActorKind,
        params: Option<&Params>,
        instance_id: &InstanceId,
        task: &Task,
    ) -> StoreResult<bool>;

    fn is_completed_user_task(
        &self,
        store: &dyn StateStore,
        params: Option<&Params>,
        instance_id: &InstanceId,
        task: &Task,
    ) -> StoreResult<bool> {
        self.is_completed(store, ActorKind::User, params, instance_id, task)
    }

    fn is_completed_group_task(
        &self,
        store: &dyn StateStore,
        params: Option<&Params>,
        instance_id: &InstanceId,
        task: &Task,
    ) -> StoreResult<bool> {
        self.is_completed(store, ActorKind::Group, params, instance_id, task)
    }
}
