//! Execution ledger: append-only audit log of step state transitions
//!
//! One entry per transition, never mutated after append. The ledger
//! serves two purposes: status queries for operators, and replay — a
//! partially-succeeded run can be resumed by reconstructing the
//! context outputs from its `Succeeded` entries instead of re-running
//! the steps that already finished.

use showrunner_types::{
    LedgerEntry, OrchestrationError, OrchestrationResult, OutputKey, StepId, StepState,
    ToolOutput, WorkflowDefinition, WorkflowRunId,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Append-only record of step state transitions across runs
///
/// Cheap to clone; clones share the same underlying log, which is how
/// the engine and its spawned tasks append to one ledger.
#[derive(Clone, Default)]
pub struct ExecutionLedger {
    entries: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl ExecutionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one transition record
    pub fn append(&self, entry: LedgerEntry) {
        tracing::debug!(
            run_id = %entry.run_id,
            step_id = %entry.step_id,
            from = ?entry.from_state,
            to = %entry.to_state,
            "Ledger append"
        );
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
    }

    /// All entries for one run, in append order
    pub fn entries_for(&self, run_id: &WorkflowRunId) -> Vec<LedgerEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| &e.run_id == run_id)
            .cloned()
            .collect()
    }

    /// Entries for one step within one run, in append order
    pub fn entries_for_step(&self, run_id: &WorkflowRunId, step_id: &StepId) -> Vec<LedgerEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| &e.run_id == run_id && &e.step_id == step_id)
            .cloned()
            .collect()
    }

    /// The last recorded state per step for one run
    pub fn last_states(&self, run_id: &WorkflowRunId) -> BTreeMap<StepId, StepState> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut states = BTreeMap::new();
        for entry in entries.iter().filter(|e| &e.run_id == run_id) {
            states.insert(entry.step_id.clone(), entry.to_state);
        }
        states
    }

    /// Reconstruct the outputs map of a run from its `Succeeded`
    /// entries.
    ///
    /// Fails when the run has no ledger entries at all. Steps no longer
    /// present in the definition are skipped.
    pub fn replay_outputs(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
    ) -> OrchestrationResult<BTreeMap<OutputKey, ToolOutput>> {
        let entries = self.entries_for(run_id);
        if entries.is_empty() {
            return Err(OrchestrationError::RunNotFound(run_id.clone()));
        }

        let mut outputs = BTreeMap::new();
        for entry in &entries {
            if entry.to_state != StepState::Succeeded {
                continue;
            }
            let Some(step) = definition.get_step(&entry.step_id) else {
                continue;
            };
            if let Some(output) = &entry.output {
                outputs.insert(step.produces.clone(), output.clone());
            }
        }
        Ok(outputs)
    }

    /// Total number of entries across all runs
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
