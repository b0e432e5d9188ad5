//! Error types for the orchestration core
//!
//! The taxonomy follows the failure-handling design: definition errors
//! (never retried, surfaced before or instead of execution), availability
//! errors (transient, eligible for retry), and workflow-level errors.

use crate::definition::StepId;
use crate::escalation::FailureKind;
use crate::schema::{AgentId, ToolName};

/// Errors that can occur in orchestration operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestrationError {
    // ── Definition errors ────────────────────────────────────────────
    #[error("Agent already registered with a conflicting tool set: {0}")]
    DuplicateAgent(AgentId),

    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("Duplicate tool '{tool_name}' under agent '{agent_id}'")]
    DuplicateTool {
        agent_id: AgentId,
        tool_name: ToolName,
    },

    #[error("Tool '{tool_name}' not declared by agent '{agent_id}'")]
    UndeclaredTool {
        agent_id: AgentId,
        tool_name: ToolName,
    },

    #[error("Workflow validation failed at step '{step_id}': {reason}")]
    WorkflowValidation { step_id: StepId, reason: String },

    #[error("Failed to parse workflow definition: {0}")]
    DefinitionParse(String),

    #[error(
        "Type mismatch at step '{step_id}' parameter '{parameter}': expected {expected}, got {actual}"
    )]
    TypeMismatch {
        step_id: StepId,
        parameter: String,
        expected: String,
        actual: String,
    },

    #[error("Step '{step_id}' has no binding for required parameter '{parameter}'")]
    MissingParameter { step_id: StepId, parameter: String },

    #[error("Missing entry input '{key}'")]
    MissingEntryInput { key: String },

    #[error("Entry input '{key}' has the wrong type: expected {expected}, got {actual}")]
    EntryInputMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("Output key '{0}' already written with different content")]
    ContextOverwrite(crate::definition::OutputKey),

    // ── Availability errors ──────────────────────────────────────────
    #[error("Tool '{tool_name}' not found on agent '{agent_id}'")]
    ToolNotFound {
        agent_id: AgentId,
        tool_name: ToolName,
    },

    #[error("Agent '{0}' is unavailable")]
    AgentUnavailable(AgentId),

    // ── Workflow-level errors ────────────────────────────────────────
    #[error("Workflow run exceeded its wall-clock budget")]
    WorkflowTimeout,

    #[error("No ledger entries found for run '{0}'")]
    RunNotFound(crate::execution::WorkflowRunId),
}

impl OrchestrationError {
    /// How this error is classified when it occurs during execution.
    ///
    /// Availability errors are transient (the agent can recover);
    /// everything else in this enum is a definition or workflow bug.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            OrchestrationError::ToolNotFound { .. }
            | OrchestrationError::AgentUnavailable(_) => FailureKind::Transient,
            _ => FailureKind::Validation,
        }
    }
}

/// Result type alias for orchestration operations
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
