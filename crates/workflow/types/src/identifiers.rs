//! String identifiers used throughout the workflow graph and its instances.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id! {
    /// Identifier of a workflow; combined with a version it names one definition
    WorkflowId
}

string_id! {
    /// Identifier of a flow node, unique within its definition
    FlowNodeId
}

string_id! {
    /// Identifier of a sequence flow
    SequenceFlowId
}

string_id! {
    /// Identifier of a lane (a grouping of tasks by responsible role)
    LaneId
}

string_id! {
    /// Identifier of a boundary-event trigger
    TriggerId
}

string_id! {
    /// A user or group identity
    ActorId
}

string_id! {
    /// Opaque identifier of a running workflow instance
    InstanceId
}

impl InstanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}
