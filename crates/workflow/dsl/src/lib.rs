//! Workflow definition language
//!
//! Turns definition documents into validated [`WorkflowDefinition`]s.
//!
//! # Pipeline
//!
//! ```text
//! JSON document → DefinitionDocument → compile (resolve declarations) → WorkflowDefinition
//! ```
//!
//! Conditions are written as strategy declarations, `Name` or
//! `Name(arg, ...)`, and resolved through a [`StrategyLoader`]:
//!
//! ```rust
//! use workflow_dsl::StrategyLoader;
//!
//! let loader = StrategyLoader::with_builtins();
//! assert!(loader.proceed_condition("proceed.Ge(amount, 100)").is_ok());
//! assert!(loader.completion_condition("completion.Or(2)").is_ok());
//! assert!(loader.completion_condition("main()").is_err());
//! ```
//!
//! [`WorkflowDefinition`]: workflow_types::WorkflowDefinition

#![deny(unsafe_code)]

pub mod compiler;
pub mod declaration;
pub mod document;
pub mod source;
pub mod strategy;

pub use compiler::compile;
pub use declaration::Declaration;
pub use document::{DefinitionDocument, FlowNodeDocument, LaneDocument, SequenceFlowDocument};
pub use source::JsonDefinitionLoader;
pub use strategy::{Constructed, Constructor, StrategyLoader, StrategyRegistry};
