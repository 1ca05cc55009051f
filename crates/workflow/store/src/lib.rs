//! Workflow state storage.
//!
//! The engine delegates every piece of durable instance state to the
//! [`StateStore`](workflow_types::StateStore) port:
//! - instance headers (workflow id, version, active node or completed)
//! - assigned rosters per task and actor kind
//! - active-task rows, each carrying its roster sequence
//!
//! [`InMemoryStateStore`] is the reference adapter. Production deployments
//! plug a transactional backend in behind the same trait and take over
//! serializing concurrent writes to one instance.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod memory;

pub use memory::InMemoryStateStore;
