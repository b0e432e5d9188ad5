//! The tool invocation contract
//!
//! Every external collaborator — video processor, audio pipeline,
//! social publisher — sits behind the [`Tool`] trait. A tool receives a
//! fully-resolved input map matching its declared schema and resolves
//! to either a success map matching its output schema or a classified
//! failure. Invocations must be idempotent-on-retry: a failed call must
//! not leave partial caller-visible state behind, because the
//! escalation policy may call again.

use async_trait::async_trait;
use showrunner_types::{AgentId, BoundInputs, StepError, ToolOutput, ToolSpec};
use std::sync::Arc;

/// An externally-implemented unit of work
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with fully-bound inputs.
    ///
    /// May block or await for as long as it needs; the engine applies
    /// its own per-step timeout around this call.
    async fn invoke(&self, inputs: BoundInputs) -> Result<ToolOutput, StepError>;
}

/// A resolved tool: the declared spec plus its live implementation
///
/// Handed out by the registry once the owning agent has been confirmed
/// available. Cheap to clone.
#[derive(Clone)]
pub struct ToolHandle {
    /// The agent that owns this tool
    pub agent_id: AgentId,
    /// The declared input/output contract
    pub spec: ToolSpec,
    implementation: Arc<dyn Tool>,
}

impl ToolHandle {
    pub(crate) fn new(agent_id: AgentId, spec: ToolSpec, implementation: Arc<dyn Tool>) -> Self {
        Self {
            agent_id,
            spec,
            implementation,
        }
    }

    /// Invoke the underlying implementation
    pub async fn invoke(&self, inputs: BoundInputs) -> Result<ToolOutput, StepError> {
        self.implementation.invoke(inputs).await
    }
}

impl std::fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandle")
            .field("agent_id", &self.agent_id)
            .field("tool_name", &self.spec.tool_name)
            .finish()
    }
}
