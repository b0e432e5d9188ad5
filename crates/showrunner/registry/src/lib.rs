//! Agent and tool registries for Showrunner
//!
//! Maps agents to the tools they expose and hands the execution engine
//! invocable [`ToolHandle`]s. Registration is explicit and validated up
//! front: a tool cannot be registered without a live implementation,
//! and resolution refuses agents that are not currently available.
//!
//! Registries are plain instances passed into the engine at
//! construction — there is no process-wide mutable state.

#![deny(unsafe_code)]

pub mod agent;
pub mod tool;

pub use agent::AgentRegistry;
pub use tool::{Tool, ToolHandle};
