//! Tool schemas: the declared contract of an externally-implemented tool
//!
//! A tool is a unit of work owned by exactly one agent. Its input schema
//! is an ordered list of named, typed parameters (required or optional
//! with a default); its output schema names the typed fields of the
//! result map. Tool identity is `(agent_id, tool_name)`.

use crate::value::{ParamType, ParamValue};
use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for an agent (a named capability provider)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a tool, unique within its owning agent
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolName(pub String);

impl ToolName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Availability ─────────────────────────────────────────────────────

/// Availability state of an agent
///
/// Mutated only by health-check collaborators through the registry,
/// never by the execution engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The agent accepts tool invocations
    Available,
    /// The agent is up but impaired; resolution is refused until it
    /// recovers
    Degraded,
    /// The agent cannot accept invocations
    Unavailable,
}

// ── Parameter specification ──────────────────────────────────────────

/// One named, typed parameter in a tool's input schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub param_type: ParamType,
    /// Whether a binding must be supplied
    pub required: bool,
    /// Default applied when an optional parameter is unbound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    /// A required parameter
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default value
    pub fn optional(name: impl Into<String>, param_type: ParamType, default: ParamValue) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: Some(default),
        }
    }
}

/// The ordered input parameters of a tool
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    pub params: Vec<ParamSpec>,
}

impl InputSchema {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// The named, typed result fields of a tool
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub fields: Vec<OutputField>,
}

/// One named, typed field in a tool's output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputField {
    pub name: String,
    pub field_type: ParamType,
}

impl OutputSchema {
    pub fn new(fields: Vec<OutputField>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// A single-field output schema
    pub fn single(name: impl Into<String>, field_type: ParamType) -> Self {
        Self {
            fields: vec![OutputField {
                name: name.into(),
                field_type,
            }],
        }
    }

    pub fn get(&self, name: &str) -> Option<&OutputField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ── Tool specification ───────────────────────────────────────────────

/// The declared contract of one tool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name, unique within the owning agent
    pub tool_name: ToolName,
    /// Ordered input parameters
    pub input_schema: InputSchema,
    /// Named result fields
    pub output_schema: OutputSchema,
}

impl ToolSpec {
    pub fn new(tool_name: impl Into<String>, input_schema: InputSchema, output_schema: OutputSchema) -> Self {
        Self {
            tool_name: ToolName::new(tool_name),
            input_schema,
            output_schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_publish_spec() -> ToolSpec {
        ToolSpec::new(
            "publish_episode",
            InputSchema::new(vec![
                ParamSpec::required("title", ParamType::String),
                ParamSpec::required("duration", ParamType::Integer),
                ParamSpec::optional("visibility", ParamType::Choice(vec!["public".into(), "unlisted".into()]), ParamValue::from("public")),
            ]),
            OutputSchema::single("episode_url", ParamType::String),
        )
    }

    #[test]
    fn test_schema_lookup() {
        let spec = make_publish_spec();
        assert!(spec.input_schema.contains("title"));
        assert!(spec.input_schema.contains("visibility"));
        assert!(!spec.input_schema.contains("thumbnail"));
        assert_eq!(spec.input_schema.params.len(), 3);
    }

    #[test]
    fn test_optional_param_carries_default() {
        let spec = make_publish_spec();
        let visibility = spec.input_schema.get("visibility").unwrap();
        assert!(!visibility.required);
        assert_eq!(visibility.default, Some(ParamValue::from("public")));

        let title = spec.input_schema.get("title").unwrap();
        assert!(title.required);
        assert!(title.default.is_none());
    }

    #[test]
    fn test_output_schema() {
        let spec = make_publish_spec();
        assert!(spec.output_schema.get("episode_url").is_some());
        assert!(spec.output_schema.get("nonexistent").is_none());
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(format!("{}", AgentId::new("video-agent")), "video-agent");
        assert_eq!(format!("{}", ToolName::new("edit_video")), "edit_video");
    }
}
