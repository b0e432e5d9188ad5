//! The workflow context: per-run, write-once store of step outputs
//!
//! The context is the only mutable object shared across steps within a
//! run. Each output key is written exactly once; a retried step that
//! re-produces an identical output is tolerated, a differing rewrite is
//! an error. Readers (the binder) treat a missing key as "not yet
//! produced", never as a partial value.

use showrunner_types::{
    OrchestrationError, OrchestrationResult, OutputKey, ParamValue, ToolOutput,
};
use std::collections::BTreeMap;

/// The mutable key→value store produced during one workflow run
#[derive(Clone, Debug, Default)]
pub struct WorkflowContext {
    entry_inputs: BTreeMap<String, ParamValue>,
    outputs: BTreeMap<OutputKey, ToolOutput>,
}

impl WorkflowContext {
    /// Create a context seeded with the caller-supplied entry inputs
    pub fn new(entry_inputs: BTreeMap<String, ParamValue>) -> Self {
        Self {
            entry_inputs,
            outputs: BTreeMap::new(),
        }
    }

    /// A caller-supplied entry input
    pub fn entry_input(&self, key: &str) -> Option<&ParamValue> {
        self.entry_inputs.get(key)
    }

    /// The output published under a key, if the producing step has
    /// succeeded
    pub fn output(&self, key: &OutputKey) -> Option<&ToolOutput> {
        self.outputs.get(key)
    }

    /// Publish a step's output under its `produces` key.
    ///
    /// Write-once: publishing the identical output again is a no-op
    /// (idempotent retry); publishing different content under an
    /// existing key fails.
    pub fn publish(&mut self, key: OutputKey, output: ToolOutput) -> OrchestrationResult<()> {
        if let Some(existing) = self.outputs.get(&key) {
            if existing == &output {
                return Ok(());
            }
            return Err(OrchestrationError::ContextOverwrite(key));
        }
        self.outputs.insert(key, output);
        Ok(())
    }

    /// Number of published outputs
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// All published outputs, for reports and archiving
    pub fn outputs(&self) -> &BTreeMap<OutputKey, ToolOutput> {
        &self.outputs
    }
}
