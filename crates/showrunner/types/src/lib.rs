//! Workflow domain types for Showrunner
//!
//! This crate defines the declarative side of the orchestration core:
//! typed parameter values and tool schemas, input bindings, the
//! immutable [`WorkflowDefinition`] step graph with load-time
//! validation, the escalation policy vocabulary, and the runtime
//! execution records (step states, ledger entries, run reports).
//!
//! Definitions are validated once, when loaded — structural errors such
//! as binding cycles or references to unknown steps never reach the
//! execution engine.

#![deny(unsafe_code)]

pub mod binding;
pub mod definition;
pub mod errors;
pub mod escalation;
pub mod execution;
pub mod schema;
pub mod value;

pub use binding::InputBinding;
pub use definition::{OutputKey, Step, StepId, WorkflowDefinition};
pub use errors::{OrchestrationError, OrchestrationResult};
pub use escalation::{Backoff, FailureKind, OnFailure, StepError, TerminalAction};
pub use execution::{
    BoundInputs, LedgerEntry, RunReport, RunStatus, StepExecution, StepReport, StepState,
    ToolOutput, WorkflowRunId,
};
pub use schema::{
    AgentId, Availability, InputSchema, OutputField, OutputSchema, ParamSpec, ToolName, ToolSpec,
};
pub use value::{ParamType, ParamValue};
