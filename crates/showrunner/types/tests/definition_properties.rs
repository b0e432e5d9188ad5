//! Property tests for values and definition validation

use proptest::prelude::*;
use showrunner_types::{
    Backoff, InputBinding, ParamType, ParamValue, Step, WorkflowDefinition,
};

fn arb_param_value() -> impl Strategy<Value = ParamValue> {
    let leaf = prop_oneof![
        "[a-z0-9 ]{0,12}".prop_map(ParamValue::from),
        any::<i64>().prop_map(ParamValue::from),
        any::<bool>().prop_map(ParamValue::from),
        proptest::collection::vec("[a-z]{1,6}", 0..4).prop_map(ParamValue::from),
    ];
    leaf.prop_recursive(2, 12, 4, |inner| {
        proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(ParamValue::Map)
    })
}

fn declared_type_of(value: &ParamValue) -> ParamType {
    match value {
        ParamValue::String(_) => ParamType::String,
        ParamValue::Integer(_) => ParamType::Integer,
        ParamValue::Boolean(_) => ParamType::Boolean,
        ParamValue::StringList(_) => ParamType::StringList,
        ParamValue::Map(_) => ParamType::Map,
    }
}

/// A linear pipeline where each step consumes its predecessor's output
fn chain(length: usize) -> WorkflowDefinition {
    let mut definition = WorkflowDefinition::new("chain");
    for i in 0..length {
        let mut step = Step::new(
            format!("s{}", i),
            "agent",
            "tool",
            format!("out{}", i),
        );
        if i > 0 {
            step = step.with_input(
                "prev",
                InputBinding::step_output(format!("s{}", i - 1), format!("out{}", i - 1)),
            );
        }
        definition = definition.with_step(step);
    }
    definition
}

proptest! {
    #[test]
    fn param_value_json_round_trips(value in arb_param_value()) {
        let json = serde_json::to_string(&value).unwrap();
        let back: ParamValue = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn value_matches_its_own_declared_type(value in arb_param_value()) {
        prop_assert!(declared_type_of(&value).matches(&value));
    }

    #[test]
    fn mismatched_scalar_types_never_match(n in any::<i64>(), s in "[a-z]{1,8}") {
        prop_assert!(!ParamType::Integer.matches(&ParamValue::from(s.as_str())));
        prop_assert!(!ParamType::String.matches(&ParamValue::from(n)));
        prop_assert!(!ParamType::Boolean.matches(&ParamValue::from(n)));
    }

    #[test]
    fn linear_pipelines_always_validate(length in 1usize..8) {
        prop_assert!(chain(length).validate().is_ok());
    }

    #[test]
    fn back_edge_makes_pipeline_cyclic(length in 2usize..8) {
        let mut definition = chain(length);
        // close the loop: the first step now consumes the last output
        let last = length - 1;
        definition.steps[0] = definition.steps[0].clone().with_input(
            "loop",
            InputBinding::step_output(format!("s{}", last), format!("out{}", last)),
        );
        prop_assert!(definition.validate().is_err());
    }

    #[test]
    fn duplicate_step_ids_rejected(length in 1usize..6) {
        let definition = chain(length)
            .with_step(Step::new("s0", "agent", "tool", "shadow_out"));
        prop_assert!(definition.validate().is_err());
    }

    #[test]
    fn definition_json_round_trips(length in 1usize..8) {
        let definition = chain(length);
        let json = definition.to_json().unwrap();
        let back = WorkflowDefinition::from_json(&json).unwrap();
        prop_assert_eq!(back, definition);
    }

    #[test]
    fn backoff_is_monotonic(initial in 0u64..10_000, factor in 1u32..5, retry in 1u32..10) {
        let backoff = Backoff::new(initial, factor);
        prop_assert!(backoff.delay_for(retry + 1) >= backoff.delay_for(retry));
    }
}
