use crate::{WorkflowDefinition, WorkflowResult};

/// Source of workflow definitions, read once at startup.
///
/// Each entry is loaded independently, so one broken definition does not
/// hide the others. The caller decides whether a failure is fatal.
pub trait DefinitionLoader {
    fn load(&self) -> Vec<WorkflowResult<WorkflowDefinition>>;
}
