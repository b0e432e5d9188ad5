//! Workflow definitions: the declarative step graph
//!
//! A WorkflowDefinition is an immutable, acyclic graph of steps. Each
//! step names an agent and a tool, binds the tool's parameters to entry
//! inputs or prior step outputs, and contributes one output key to the
//! workflow context. Definitions are validated once, at load time —
//! structural errors never surface during execution.

use crate::binding::InputBinding;
use crate::errors::{OrchestrationError, OrchestrationResult};
use crate::escalation::OnFailure;
use crate::schema::{AgentId, InputSchema, ToolName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a step within a workflow
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The key under which a step's output lands in the workflow context
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputKey(pub String);

impl OutputKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl std::fmt::Display for OutputKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Step ─────────────────────────────────────────────────────────────

/// One node in the workflow graph — purely declarative, never holds
/// runtime state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique within the workflow
    pub step_id: StepId,
    /// The agent that owns the tool
    pub agent_id: AgentId,
    /// The tool to invoke
    pub tool_name: ToolName,
    /// Map from tool parameter name to its binding source
    #[serde(default)]
    pub input_bindings: BTreeMap<String, InputBinding>,
    /// The output key this step contributes to the workflow context
    pub produces: OutputKey,
    /// Override of the workflow-level failure policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<OnFailure>,
    /// Per-step timeout; the workflow default applies when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Step {
    pub fn new(
        step_id: impl Into<String>,
        agent_id: impl Into<String>,
        tool_name: impl Into<String>,
        produces: impl Into<String>,
    ) -> Self {
        Self {
            step_id: StepId::new(step_id),
            agent_id: AgentId::new(agent_id),
            tool_name: ToolName::new(tool_name),
            input_bindings: BTreeMap::new(),
            produces: OutputKey::new(produces),
            on_failure: None,
            timeout_ms: None,
        }
    }

    /// Bind one tool parameter
    pub fn with_input(mut self, param: impl Into<String>, binding: InputBinding) -> Self {
        self.input_bindings.insert(param.into(), binding);
        self
    }

    pub fn with_on_failure(mut self, on_failure: OnFailure) -> Self {
        self.on_failure = Some(on_failure);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// The steps this step's bindings depend on
    pub fn dependencies(&self) -> HashSet<&StepId> {
        self.input_bindings
            .values()
            .filter_map(|b| b.depends_on())
            .collect()
    }
}

// ── Workflow Definition ──────────────────────────────────────────────

/// An immutable, acyclic graph of steps, identified by name and version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Human-meaningful workflow name
    pub workflow_name: String,
    /// Version for tracking definition evolution
    pub version: u32,
    /// Schema of the values the caller must supply at launch
    #[serde(default)]
    pub entry_inputs: InputSchema,
    /// The steps, in declaration order
    pub steps: Vec<Step>,
    /// Workflow-level failure policy for steps without an override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_on_failure: Option<OnFailure>,
    /// Default per-step timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_step_timeout_ms: Option<u64>,
    /// Wall-clock budget for the whole run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<u64>,
    /// Cancel independent branches as soon as any step fails terminally
    #[serde(default)]
    pub abort_on_any_failure: bool,
}

impl WorkflowDefinition {
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            version: 1,
            entry_inputs: InputSchema::empty(),
            steps: Vec::new(),
            default_on_failure: None,
            default_step_timeout_ms: None,
            max_duration_ms: None,
            abort_on_any_failure: false,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_entry_inputs(mut self, entry_inputs: InputSchema) -> Self {
        self.entry_inputs = entry_inputs;
        self
    }

    pub fn with_default_on_failure(mut self, on_failure: OnFailure) -> Self {
        self.default_on_failure = Some(on_failure);
        self
    }

    pub fn with_default_step_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_step_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_max_duration_ms(mut self, max_duration_ms: u64) -> Self {
        self.max_duration_ms = Some(max_duration_ms);
        self
    }

    pub fn with_abort_on_any_failure(mut self) -> Self {
        self.abort_on_any_failure = true;
        self
    }

    /// Add a step to the graph
    pub fn add_step(&mut self, step: Step) -> OrchestrationResult<()> {
        if self.steps.iter().any(|s| s.step_id == step.step_id) {
            return Err(OrchestrationError::WorkflowValidation {
                step_id: step.step_id,
                reason: "duplicate step id".into(),
            });
        }
        self.steps.push(step);
        Ok(())
    }

    /// Builder-style `add_step`; duplicate ids are caught by `validate`
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Get a step by id
    pub fn get_step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.step_id == id)
    }

    /// The step producing a given output key
    pub fn producer_of(&self, key: &OutputKey) -> Option<&Step> {
        self.steps.iter().find(|s| &s.produces == key)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Direct dependencies per step, induced by the input bindings
    pub fn dependency_map(&self) -> HashMap<StepId, HashSet<StepId>> {
        self.steps
            .iter()
            .map(|s| {
                (
                    s.step_id.clone(),
                    s.dependencies().into_iter().cloned().collect(),
                )
            })
            .collect()
    }

    /// Validate the definition for structural correctness.
    ///
    /// Checks, in order: non-empty graph, unique step ids, unique
    /// `produces` keys (the context is write-once), every entry-input
    /// reference declared in `entry_inputs`, every step-output reference
    /// naming an existing step whose `produces` matches, and acyclicity
    /// of the binding-induced graph. Runs once at load time.
    pub fn validate(&self) -> OrchestrationResult<()> {
        if self.steps.is_empty() {
            return Err(OrchestrationError::WorkflowValidation {
                step_id: StepId::new("__workflow__"),
                reason: "workflow must have at least one step".into(),
            });
        }

        let mut seen_ids = HashSet::new();
        for step in &self.steps {
            if !seen_ids.insert(&step.step_id) {
                return Err(OrchestrationError::WorkflowValidation {
                    step_id: step.step_id.clone(),
                    reason: "duplicate step id".into(),
                });
            }
        }

        let mut seen_keys: HashMap<&OutputKey, &StepId> = HashMap::new();
        for step in &self.steps {
            if let Some(prior) = seen_keys.insert(&step.produces, &step.step_id) {
                return Err(OrchestrationError::WorkflowValidation {
                    step_id: step.step_id.clone(),
                    reason: format!(
                        "output key '{}' already produced by step '{}'",
                        step.produces, prior
                    ),
                });
            }
        }

        for step in &self.steps {
            for (param, binding) in &step.input_bindings {
                match binding {
                    InputBinding::Literal { .. } => {}
                    InputBinding::EntryInput { key } => {
                        if !self.entry_inputs.contains(key) {
                            return Err(OrchestrationError::WorkflowValidation {
                                step_id: step.step_id.clone(),
                                reason: format!(
                                    "parameter '{}' references undeclared entry input '{}'",
                                    param, key
                                ),
                            });
                        }
                    }
                    InputBinding::StepOutput {
                        step_id,
                        output_key,
                        ..
                    } => {
                        let Some(producer) = self.get_step(step_id) else {
                            return Err(OrchestrationError::WorkflowValidation {
                                step_id: step.step_id.clone(),
                                reason: format!(
                                    "parameter '{}' references unknown step '{}'",
                                    param, step_id
                                ),
                            });
                        };
                        if &producer.produces != output_key {
                            return Err(OrchestrationError::WorkflowValidation {
                                step_id: step.step_id.clone(),
                                reason: format!(
                                    "parameter '{}' expects output key '{}' but step '{}' produces '{}'",
                                    param, output_key, step_id, producer.produces
                                ),
                            });
                        }
                    }
                }
            }
        }

        self.check_acyclic()
    }

    /// Depth-first cycle detection over the binding-induced graph
    fn check_acyclic(&self) -> OrchestrationResult<()> {
        let deps = self.dependency_map();

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            node: &StepId,
            deps: &HashMap<StepId, HashSet<StepId>>,
            marks: &mut HashMap<StepId, Mark>,
        ) -> Result<(), StepId> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(node.clone()),
                None => {}
            }
            marks.insert(node.clone(), Mark::Visiting);
            if let Some(children) = deps.get(node) {
                for child in children {
                    visit(child, deps, marks)?;
                }
            }
            marks.insert(node.clone(), Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for step in &self.steps {
            if let Err(offender) = visit(&step.step_id, &deps, &mut marks) {
                return Err(OrchestrationError::WorkflowValidation {
                    step_id: offender,
                    reason: "cycle detected among step bindings".into(),
                });
            }
        }
        Ok(())
    }

    /// Parse a definition from a JSON document and validate it
    pub fn from_json(json: &str) -> OrchestrationResult<Self> {
        let definition: WorkflowDefinition = serde_json::from_str(json)
            .map_err(|e| OrchestrationError::DefinitionParse(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Serialize the definition to a JSON document
    pub fn to_json(&self) -> OrchestrationResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OrchestrationError::DefinitionParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamSpec;
    use crate::value::ParamType;

    fn make_pipeline() -> WorkflowDefinition {
        WorkflowDefinition::new("episode-production")
            .with_entry_inputs(InputSchema::new(vec![ParamSpec::required(
                "raw_video",
                ParamType::String,
            )]))
            .with_step(
                Step::new("analyze_video", "video-agent", "analyze_video", "video_analysis")
                    .with_input("source", InputBinding::entry("raw_video")),
            )
            .with_step(
                Step::new("edit_video", "video-agent", "edit_video", "edited_video")
                    .with_input("analysis", InputBinding::step_output("analyze_video", "video_analysis")),
            )
    }

    #[test]
    fn test_valid_pipeline() {
        assert!(make_pipeline().validate().is_ok());
    }

    #[test]
    fn test_empty_workflow_rejected() {
        let def = WorkflowDefinition::new("empty");
        assert!(matches!(
            def.validate(),
            Err(OrchestrationError::WorkflowValidation { .. })
        ));
    }

    #[test]
    fn test_duplicate_step_id_rejected() {
        let mut def = make_pipeline();
        let result = def.add_step(Step::new("edit_video", "a", "t", "other"));
        assert!(matches!(
            result,
            Err(OrchestrationError::WorkflowValidation { step_id, .. }) if step_id == StepId::new("edit_video")
        ));
    }

    #[test]
    fn test_duplicate_produces_rejected() {
        let def = make_pipeline().with_step(Step::new("shadow", "a", "t", "video_analysis"));
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("video_analysis"));
    }

    #[test]
    fn test_undeclared_entry_input_rejected() {
        let def = WorkflowDefinition::new("bad").with_step(
            Step::new("s1", "a", "t", "out").with_input("x", InputBinding::entry("missing")),
        );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_unknown_step_reference_rejected() {
        let def = WorkflowDefinition::new("bad").with_step(
            Step::new("s1", "a", "t", "out")
                .with_input("x", InputBinding::step_output("ghost", "out2")),
        );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_produces_mismatch_rejected() {
        let def = make_pipeline().with_step(
            Step::new("publish", "pub-agent", "publish", "published")
                // analyze_video produces video_analysis, not renders
                .with_input("x", InputBinding::step_output("analyze_video", "renders")),
        );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("renders"));
    }

    #[test]
    fn test_cycle_rejected() {
        let def = WorkflowDefinition::new("cyclic")
            .with_step(
                Step::new("a", "agent", "t", "out_a")
                    .with_input("x", InputBinding::step_output("b", "out_b")),
            )
            .with_step(
                Step::new("b", "agent", "t", "out_b")
                    .with_input("x", InputBinding::step_output("a", "out_a")),
            );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let def = WorkflowDefinition::new("selfie").with_step(
            Step::new("a", "agent", "t", "out_a")
                .with_input("x", InputBinding::step_output("a", "out_a")),
        );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_dependency_map() {
        let deps = make_pipeline().dependency_map();
        assert!(deps[&StepId::new("analyze_video")].is_empty());
        assert!(deps[&StepId::new("edit_video")].contains(&StepId::new("analyze_video")));
    }

    #[test]
    fn test_json_round_trip() {
        let def = make_pipeline();
        let json = def.to_json().unwrap();
        let back = WorkflowDefinition::from_json(&json).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_from_json_validates() {
        let def = WorkflowDefinition::new("cyclic")
            .with_step(
                Step::new("a", "agent", "t", "out_a")
                    .with_input("x", InputBinding::step_output("b", "out_b")),
            )
            .with_step(
                Step::new("b", "agent", "t", "out_b")
                    .with_input("x", InputBinding::step_output("a", "out_a")),
            );
        // serializes fine, but fails validation on load
        let json = serde_json::to_string(&def).unwrap();
        assert!(WorkflowDefinition::from_json(&json).is_err());
    }

    #[test]
    fn test_producer_lookup() {
        let def = make_pipeline();
        let producer = def.producer_of(&OutputKey::new("video_analysis")).unwrap();
        assert_eq!(producer.step_id, StepId::new("analyze_video"));
        assert!(def.producer_of(&OutputKey::new("nope")).is_none());
    }
}
