//! Runtime execution records: step states, ledger entries, run reports
//!
//! Steps themselves are declarative; all runtime state lives in the
//! `StepExecution` record. Every state transition is mirrored by an
//! immutable `LedgerEntry`, which is what makes runs auditable and
//! resumable.

use crate::definition::StepId;
use crate::escalation::StepError;
use crate::value::ParamValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The success map returned by a tool, matching its output schema
pub type ToolOutput = BTreeMap<String, ParamValue>;

/// Fully-resolved inputs handed to a tool, matching its input schema
pub type BoundInputs = BTreeMap<String, ParamValue>;

// ── Run identifier ───────────────────────────────────────────────────

/// Unique identifier for one execution of a workflow definition
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowRunId(pub String);

impl WorkflowRunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for WorkflowRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Step state ───────────────────────────────────────────────────────

/// The lifecycle state of one step within a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Dependencies not yet satisfied
    Pending,
    /// All input bindings resolved; awaiting dispatch
    Ready,
    /// Dispatched to the owning agent
    Running,
    /// Tool returned success; output published
    Succeeded,
    /// Tool failed; escalation policy decides what happens next
    Failed,
    /// Retries exhausted or failure permanent; paused for human review
    Escalated,
    /// Terminally stopped: validation bug, dependency failure, or
    /// workflow-level abort
    Aborted,
}

impl StepState {
    /// Whether this state ends the step's participation in the run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Succeeded | StepState::Escalated | StepState::Aborted
        )
    }
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepState::Pending => "pending",
            StepState::Ready => "ready",
            StepState::Running => "running",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
            StepState::Escalated => "escalated",
            StepState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

// ── Step execution record ────────────────────────────────────────────

/// The runtime record of one step's attempts within one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepExecution {
    pub step_id: StepId,
    /// Number of tool invocations so far
    pub attempt_count: u32,
    pub state: StepState,
    /// The most recent failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<StepError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl StepExecution {
    /// A fresh record in `Pending`
    pub fn pending(step_id: StepId) -> Self {
        Self {
            step_id,
            attempt_count: 0,
            state: StepState::Pending,
            last_error: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// ── Ledger entry ─────────────────────────────────────────────────────

/// One immutable record per step state transition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub run_id: WorkflowRunId,
    pub step_id: StepId,
    /// `None` marks the creation of the execution record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_state: Option<StepState>,
    pub to_state: StepState,
    pub timestamp: DateTime<Utc>,
    /// Present on transitions caused by a failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// Present only on transitions into `Succeeded`; carries the tool's
    /// output map so `replay` can reconstruct the context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ToolOutput>,
}

impl LedgerEntry {
    pub fn new(
        run_id: WorkflowRunId,
        step_id: StepId,
        from_state: Option<StepState>,
        to_state: StepState,
    ) -> Self {
        Self {
            run_id,
            step_id,
            from_state,
            to_state,
            timestamp: Utc::now(),
            error: None,
            output: None,
        }
    }

    pub fn with_error(mut self, error: StepError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_output(mut self, output: ToolOutput) -> Self {
        self.output = Some(output);
        self
    }
}

// ── Run status and report ────────────────────────────────────────────

/// The aggregated outcome of one workflow run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every step succeeded
    Succeeded,
    /// Some steps succeeded, some reached a failure-terminal state
    PartiallySucceeded,
    /// Nothing useful completed, or the run was aborted outright
    Aborted,
}

/// Per-step summary in a run report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepReport {
    pub step_id: StepId,
    pub state: StepState,
    pub attempt_count: u32,
    /// The classified failure, for steps that did not succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

/// The final status report for one run — enough for an operator to
/// decide whether to resume, patch inputs, or discard the run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: WorkflowRunId,
    pub workflow_name: String,
    pub status: RunStatus,
    pub steps: Vec<StepReport>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl RunReport {
    /// The report for one step
    pub fn step(&self, step_id: &StepId) -> Option<&StepReport> {
        self.steps.iter().find(|s| &s.step_id == step_id)
    }

    /// Number of steps in a given state
    pub fn count_in(&self, state: StepState) -> usize {
        self.steps.iter().filter(|s| s.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::StepError;

    #[test]
    fn test_terminal_states() {
        assert!(StepState::Succeeded.is_terminal());
        assert!(StepState::Escalated.is_terminal());
        assert!(StepState::Aborted.is_terminal());
        assert!(!StepState::Pending.is_terminal());
        assert!(!StepState::Ready.is_terminal());
        assert!(!StepState::Running.is_terminal());
        assert!(!StepState::Failed.is_terminal());
    }

    #[test]
    fn test_pending_record() {
        let exec = StepExecution::pending(StepId::new("edit_video"));
        assert_eq!(exec.state, StepState::Pending);
        assert_eq!(exec.attempt_count, 0);
        assert!(!exec.is_terminal());
        assert!(exec.last_error.is_none());
    }

    #[test]
    fn test_ledger_entry_builders() {
        let run_id = WorkflowRunId::generate();
        let entry = LedgerEntry::new(
            run_id.clone(),
            StepId::new("publish"),
            Some(StepState::Running),
            StepState::Failed,
        )
        .with_error(StepError::transient("socket reset"));

        assert_eq!(entry.from_state, Some(StepState::Running));
        assert_eq!(entry.to_state, StepState::Failed);
        assert!(entry.error.is_some());
        assert!(entry.output.is_none());
    }

    #[test]
    fn test_run_id() {
        let id = WorkflowRunId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);
        assert_eq!(format!("{}", WorkflowRunId::new("run-1")), "run-1");
    }

    #[test]
    fn test_report_queries() {
        let report = RunReport {
            run_id: WorkflowRunId::generate(),
            workflow_name: "episode-production".into(),
            status: RunStatus::PartiallySucceeded,
            steps: vec![
                StepReport {
                    step_id: StepId::new("a"),
                    state: StepState::Succeeded,
                    attempt_count: 1,
                    error: None,
                },
                StepReport {
                    step_id: StepId::new("b"),
                    state: StepState::Escalated,
                    attempt_count: 3,
                    error: Some(StepError::transient("flaky upstream")),
                },
            ],
            started_at: Utc::now(),
            ended_at: Utc::now(),
        };

        assert_eq!(report.count_in(StepState::Succeeded), 1);
        assert_eq!(report.step(&StepId::new("b")).unwrap().attempt_count, 3);
        assert!(report.step(&StepId::new("zzz")).is_none());
    }
}
