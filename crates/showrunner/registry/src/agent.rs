//! Agent registry: who is known, what they expose, whether they are up
//!
//! Agents declare their exposed tool names when they register; each
//! tool is then attached with its schema and a live implementation.
//! There is no way to register a declared-but-unimplemented tool — a
//! missing implementation is a registration-time error, never an
//! invocation-time surprise.
//!
//! Reads are concurrent: the execution engine resolves tools for
//! independent ready steps from multiple tasks at once.

use crate::tool::{Tool, ToolHandle};
use showrunner_types::{
    AgentId, Availability, OrchestrationError, OrchestrationResult, ToolName, ToolSpec,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

struct ToolRecord {
    spec: ToolSpec,
    implementation: Arc<dyn Tool>,
}

struct AgentRecord {
    /// The tool names the agent declared at registration
    declared_tools: BTreeSet<ToolName>,
    /// Tools with schema and implementation attached
    tools: HashMap<ToolName, ToolRecord>,
    availability: Availability,
}

/// Registry of agents and the tools they expose
///
/// Thread-safe; cheap shared reads, exclusive writes only on
/// registration and availability changes.
pub struct AgentRegistry {
    inner: RwLock<HashMap<AgentId, AgentRecord>>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register an agent and the tool names it exposes.
    ///
    /// Re-registering with the identical tool set is a no-op;
    /// re-registering with a conflicting set fails.
    pub fn register_agent(
        &self,
        agent_id: AgentId,
        exposed_tools: impl IntoIterator<Item = ToolName>,
    ) -> OrchestrationResult<()> {
        let declared: BTreeSet<ToolName> = exposed_tools.into_iter().collect();
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = inner.get(&agent_id) {
            if existing.declared_tools == declared {
                return Ok(());
            }
            return Err(OrchestrationError::DuplicateAgent(agent_id));
        }

        tracing::info!(agent_id = %agent_id, tools = declared.len(), "Agent registered");
        inner.insert(
            agent_id,
            AgentRecord {
                declared_tools: declared,
                tools: HashMap::new(),
                availability: Availability::Available,
            },
        );
        Ok(())
    }

    /// Attach a tool's schema and implementation to its owning agent.
    ///
    /// The tool name must have been declared when the agent registered.
    pub fn register_tool(
        &self,
        agent_id: &AgentId,
        spec: ToolSpec,
        implementation: Arc<dyn Tool>,
    ) -> OrchestrationResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let record = inner
            .get_mut(agent_id)
            .ok_or_else(|| OrchestrationError::UnknownAgent(agent_id.clone()))?;

        if !record.declared_tools.contains(&spec.tool_name) {
            return Err(OrchestrationError::UndeclaredTool {
                agent_id: agent_id.clone(),
                tool_name: spec.tool_name,
            });
        }
        if record.tools.contains_key(&spec.tool_name) {
            return Err(OrchestrationError::DuplicateTool {
                agent_id: agent_id.clone(),
                tool_name: spec.tool_name,
            });
        }

        tracing::info!(agent_id = %agent_id, tool = %spec.tool_name, "Tool registered");
        record.tools.insert(
            spec.tool_name.clone(),
            ToolRecord {
                spec,
                implementation,
            },
        );
        Ok(())
    }

    /// Resolve `(agent_id, tool_name)` to an invocable handle.
    ///
    /// Fails when the tool is absent, or when the agent's availability
    /// state is anything other than `Available`.
    pub fn resolve(
        &self,
        agent_id: &AgentId,
        tool_name: &ToolName,
    ) -> OrchestrationResult<ToolHandle> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let record = inner
            .get(agent_id)
            .ok_or_else(|| OrchestrationError::ToolNotFound {
                agent_id: agent_id.clone(),
                tool_name: tool_name.clone(),
            })?;

        let tool = record
            .tools
            .get(tool_name)
            .ok_or_else(|| OrchestrationError::ToolNotFound {
                agent_id: agent_id.clone(),
                tool_name: tool_name.clone(),
            })?;

        if record.availability != Availability::Available {
            return Err(OrchestrationError::AgentUnavailable(agent_id.clone()));
        }

        Ok(ToolHandle::new(
            agent_id.clone(),
            tool.spec.clone(),
            Arc::clone(&tool.implementation),
        ))
    }

    /// The declared spec of a tool, regardless of agent availability.
    ///
    /// Used by the parameter binder, which needs the input schema even
    /// while the owning agent is down.
    pub fn spec_of(
        &self,
        agent_id: &AgentId,
        tool_name: &ToolName,
    ) -> OrchestrationResult<ToolSpec> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .get(agent_id)
            .and_then(|r| r.tools.get(tool_name))
            .map(|t| t.spec.clone())
            .ok_or_else(|| OrchestrationError::ToolNotFound {
                agent_id: agent_id.clone(),
                tool_name: tool_name.clone(),
            })
    }

    /// Set an agent's availability. Intended for health-check
    /// collaborators; the execution engine never calls this.
    pub fn set_availability(
        &self,
        agent_id: &AgentId,
        availability: Availability,
    ) -> OrchestrationResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let record = inner
            .get_mut(agent_id)
            .ok_or_else(|| OrchestrationError::UnknownAgent(agent_id.clone()))?;
        tracing::info!(agent_id = %agent_id, ?availability, "Agent availability changed");
        record.availability = availability;
        Ok(())
    }

    /// Current availability of an agent
    pub fn availability_of(&self, agent_id: &AgentId) -> OrchestrationResult<Availability> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .get(agent_id)
            .map(|r| r.availability)
            .ok_or_else(|| OrchestrationError::UnknownAgent(agent_id.clone()))
    }

    /// All registered agent ids
    pub fn agents(&self) -> Vec<AgentId> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<AgentId> = inner.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The specs of every implemented tool on an agent
    pub fn tools_for(&self, agent_id: &AgentId) -> OrchestrationResult<Vec<ToolSpec>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let record = inner
            .get(agent_id)
            .ok_or_else(|| OrchestrationError::UnknownAgent(agent_id.clone()))?;
        let mut specs: Vec<ToolSpec> = record.tools.values().map(|t| t.spec.clone()).collect();
        specs.sort_by(|a, b| a.tool_name.cmp(&b.tool_name));
        Ok(specs)
    }

    pub fn contains_agent(&self, agent_id: &AgentId) -> bool {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.contains_key(agent_id)
    }

    pub fn agent_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.len()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use showrunner_types::{BoundInputs, InputSchema, OutputSchema, StepError, ToolOutput};
    use std::collections::BTreeMap;

    struct NoopTool;

    #[async_trait]
    impl Tool for NoopTool {
        async fn invoke(&self, _inputs: BoundInputs) -> Result<ToolOutput, StepError> {
            Ok(BTreeMap::new())
        }
    }

    fn make_registry_with_agent() -> AgentRegistry {
        let registry = AgentRegistry::new();
        registry
            .register_agent(
                AgentId::new("video-agent"),
                vec![ToolName::new("analyze_video"), ToolName::new("edit_video")],
            )
            .unwrap();
        registry
    }

    fn make_spec(name: &str) -> ToolSpec {
        ToolSpec::new(name, InputSchema::empty(), OutputSchema::empty())
    }

    #[test]
    fn test_register_agent_idempotent_with_same_tools() {
        let registry = make_registry_with_agent();
        let result = registry.register_agent(
            AgentId::new("video-agent"),
            vec![ToolName::new("analyze_video"), ToolName::new("edit_video")],
        );
        assert!(result.is_ok());
        assert_eq!(registry.agent_count(), 1);
    }

    #[test]
    fn test_register_agent_conflicting_tools_rejected() {
        let registry = make_registry_with_agent();
        let result = registry.register_agent(
            AgentId::new("video-agent"),
            vec![ToolName::new("something_else")],
        );
        assert!(matches!(
            result,
            Err(OrchestrationError::DuplicateAgent(_))
        ));
    }

    #[test]
    fn test_register_tool_requires_agent() {
        let registry = AgentRegistry::new();
        let result = registry.register_tool(
            &AgentId::new("ghost"),
            make_spec("analyze_video"),
            Arc::new(NoopTool),
        );
        assert!(matches!(result, Err(OrchestrationError::UnknownAgent(_))));
    }

    #[test]
    fn test_register_tool_must_be_declared() {
        let registry = make_registry_with_agent();
        let result = registry.register_tool(
            &AgentId::new("video-agent"),
            make_spec("undeclared_tool"),
            Arc::new(NoopTool),
        );
        assert!(matches!(
            result,
            Err(OrchestrationError::UndeclaredTool { .. })
        ));
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        let registry = make_registry_with_agent();
        let agent = AgentId::new("video-agent");
        registry
            .register_tool(&agent, make_spec("analyze_video"), Arc::new(NoopTool))
            .unwrap();
        let result = registry.register_tool(&agent, make_spec("analyze_video"), Arc::new(NoopTool));
        assert!(matches!(
            result,
            Err(OrchestrationError::DuplicateTool { .. })
        ));
    }

    #[test]
    fn test_resolve() {
        let registry = make_registry_with_agent();
        let agent = AgentId::new("video-agent");
        registry
            .register_tool(&agent, make_spec("analyze_video"), Arc::new(NoopTool))
            .unwrap();

        let handle = registry
            .resolve(&agent, &ToolName::new("analyze_video"))
            .unwrap();
        assert_eq!(handle.agent_id, agent);

        // declared but not implemented: not resolvable
        let result = registry.resolve(&agent, &ToolName::new("edit_video"));
        assert!(matches!(result, Err(OrchestrationError::ToolNotFound { .. })));

        // unknown agent
        let result = registry.resolve(&AgentId::new("ghost"), &ToolName::new("analyze_video"));
        assert!(matches!(result, Err(OrchestrationError::ToolNotFound { .. })));
    }

    #[test]
    fn test_resolve_respects_availability() {
        let registry = make_registry_with_agent();
        let agent = AgentId::new("video-agent");
        registry
            .register_tool(&agent, make_spec("analyze_video"), Arc::new(NoopTool))
            .unwrap();

        registry
            .set_availability(&agent, Availability::Degraded)
            .unwrap();
        assert!(matches!(
            registry.resolve(&agent, &ToolName::new("analyze_video")),
            Err(OrchestrationError::AgentUnavailable(_))
        ));

        registry
            .set_availability(&agent, Availability::Available)
            .unwrap();
        assert!(registry
            .resolve(&agent, &ToolName::new("analyze_video"))
            .is_ok());
    }

    #[test]
    fn test_introspection() {
        let registry = make_registry_with_agent();
        let agent = AgentId::new("video-agent");
        registry
            .register_tool(&agent, make_spec("analyze_video"), Arc::new(NoopTool))
            .unwrap();
        registry
            .register_tool(&agent, make_spec("edit_video"), Arc::new(NoopTool))
            .unwrap();

        assert!(registry.contains_agent(&agent));
        assert_eq!(registry.agents(), vec![agent.clone()]);
        let specs = registry.tools_for(&agent).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].tool_name, ToolName::new("analyze_video"));
        assert_eq!(
            registry.availability_of(&agent).unwrap(),
            Availability::Available
        );
    }
}
