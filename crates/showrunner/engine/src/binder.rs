//! Step parameter binder: resolves a step's inputs against the context
//!
//! `bind` is a pure function of `(step, tool spec, context)`. It walks
//! the tool's input schema in declaration order and resolves each
//! parameter from its binding source. A reference to an output that has
//! not been produced yet is *not* an error — it yields
//! [`BindOutcome::Pending`], which is how the engine decides readiness.
//! A value of the wrong runtime type is a genuine bind-time error and
//! is never retried.

use crate::context::WorkflowContext;
use showrunner_types::{
    BoundInputs, InputBinding, OrchestrationError, OrchestrationResult, ParamValue, Step, StepId,
    ToolSpec,
};

/// The result of attempting to bind a step's parameters
#[derive(Clone, Debug)]
pub enum BindOutcome {
    /// Every parameter resolved and type-checked
    Bound(BoundInputs),
    /// A referenced step has not produced its output yet
    Pending {
        /// The step whose output is still missing
        waiting_on: StepId,
    },
}

/// Resolve a step's declared inputs against already-produced outputs
/// and the workflow's entry inputs.
pub fn bind(
    step: &Step,
    spec: &ToolSpec,
    context: &WorkflowContext,
) -> OrchestrationResult<BindOutcome> {
    // A binding that names no parameter in the schema is a definition bug
    for param in step.input_bindings.keys() {
        if !spec.input_schema.contains(param) {
            return Err(OrchestrationError::WorkflowValidation {
                step_id: step.step_id.clone(),
                reason: format!(
                    "binding for '{}' does not match any parameter of tool '{}'",
                    param, spec.tool_name
                ),
            });
        }
    }

    let mut bound = BoundInputs::new();
    for param in &spec.input_schema.params {
        let value = match step.input_bindings.get(&param.name) {
            None => match &param.default {
                Some(default) if !param.required => default.clone(),
                _ => {
                    return Err(OrchestrationError::MissingParameter {
                        step_id: step.step_id.clone(),
                        parameter: param.name.clone(),
                    })
                }
            },
            Some(InputBinding::Literal { value }) => value.clone(),
            Some(InputBinding::EntryInput { key }) => match context.entry_input(key) {
                Some(value) => value.clone(),
                None => {
                    return Err(OrchestrationError::MissingEntryInput { key: key.clone() });
                }
            },
            Some(InputBinding::StepOutput {
                step_id,
                output_key,
                field,
            }) => {
                let Some(output) = context.output(output_key) else {
                    return Ok(BindOutcome::Pending {
                        waiting_on: step_id.clone(),
                    });
                };
                match field {
                    None => ParamValue::Map(output.clone()),
                    Some(field) => match output.get(field) {
                        Some(value) => value.clone(),
                        None => {
                            return Err(OrchestrationError::WorkflowValidation {
                                step_id: step.step_id.clone(),
                                reason: format!(
                                    "output '{}' of step '{}' has no field '{}'",
                                    output_key, step_id, field
                                ),
                            });
                        }
                    },
                }
            }
        };

        if !param.param_type.matches(&value) {
            return Err(OrchestrationError::TypeMismatch {
                step_id: step.step_id.clone(),
                parameter: param.name.clone(),
                expected: param.param_type.to_string(),
                actual: value.type_name().to_string(),
            });
        }
        bound.insert(param.name.clone(), value);
    }

    Ok(BindOutcome::Bound(bound))
}
