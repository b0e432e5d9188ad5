//! Input bindings: where a step's parameters come from
//!
//! Each entry in a step's `input_bindings` maps a tool parameter name to
//! one of three sources: a literal value, a key in the caller-supplied
//! entry inputs, or the output of a prior step. Step-output bindings may
//! select a single named field from the producing step's output map.

use crate::definition::{OutputKey, StepId};
use crate::value::ParamValue;
use serde::{Deserialize, Serialize};

/// The source of one bound tool parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputBinding {
    /// A literal value written directly in the definition
    Literal { value: ParamValue },
    /// A key in the workflow's caller-supplied entry inputs
    EntryInput { key: String },
    /// The output of a prior step
    StepOutput {
        /// The producing step
        step_id: StepId,
        /// Must equal the producing step's `produces` key
        output_key: OutputKey,
        /// Select one named field from the output map; `None` binds the
        /// whole output map
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },
}

impl InputBinding {
    /// A literal binding
    pub fn literal(value: impl Into<ParamValue>) -> Self {
        InputBinding::Literal {
            value: value.into(),
        }
    }

    /// A binding to a caller-supplied entry input
    pub fn entry(key: impl Into<String>) -> Self {
        InputBinding::EntryInput { key: key.into() }
    }

    /// A binding to a prior step's whole output map
    pub fn step_output(step_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        InputBinding::StepOutput {
            step_id: StepId::new(step_id),
            output_key: OutputKey::new(output_key),
            field: None,
        }
    }

    /// A binding to one field of a prior step's output
    pub fn step_output_field(
        step_id: impl Into<String>,
        output_key: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        InputBinding::StepOutput {
            step_id: StepId::new(step_id),
            output_key: OutputKey::new(output_key),
            field: Some(field.into()),
        }
    }

    /// The producing step, when this binding depends on one
    pub fn depends_on(&self) -> Option<&StepId> {
        match self {
            InputBinding::StepOutput { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}
