//! Escalation policy: the fixed retry → human-review → abort ladder
//!
//! Applied uniformly to every step failure. The classifier does not act
//! on anything itself — it returns a decision for the engine to carry
//! out. A step's `on_failure` override replaces the whole workflow
//! default (its own retry budget and terminal action); validation-class
//! failures bypass the ladder entirely, because retrying a
//! definitionally wrong binding cannot succeed.

use showrunner_types::{FailureKind, OnFailure, Step, StepError, TerminalAction};
use std::time::Duration;

/// What the engine should do about one step failure
#[derive(Clone, Debug, PartialEq)]
pub enum EscalationDecision {
    /// Re-dispatch the step after the backoff delay
    Retry { delay: Duration },
    /// Pause the step for human intervention; independent steps continue
    HumanReview { reason: String },
    /// Stop the step terminally; dependents become unreachable
    Abort { reason: String },
}

/// The per-run escalation classifier
#[derive(Clone, Debug)]
pub struct EscalationPolicy {
    default: OnFailure,
}

impl EscalationPolicy {
    /// A policy with the given workflow-level default
    pub fn new(default: OnFailure) -> Self {
        Self { default }
    }

    /// The effective failure policy for a step
    pub fn policy_for<'a>(&'a self, step: &'a Step) -> &'a OnFailure {
        step.on_failure.as_ref().unwrap_or(&self.default)
    }

    /// Classify a failure.
    ///
    /// `attempt_count` is the number of invocations made so far,
    /// including the one that just failed. A step whose policy allows
    /// `max_retries = N` is invoked exactly N times before the terminal
    /// action fires.
    pub fn decide(
        &self,
        step: &Step,
        error: &StepError,
        attempt_count: u32,
    ) -> EscalationDecision {
        let policy = self.policy_for(step);

        match error.kind {
            FailureKind::Validation => EscalationDecision::Abort {
                reason: error.message.clone(),
            },
            FailureKind::Permanent => self.terminal(policy, error),
            FailureKind::Transient => {
                if attempt_count < policy.max_retries {
                    EscalationDecision::Retry {
                        delay: policy.backoff.delay_for(attempt_count),
                    }
                } else {
                    self.terminal(policy, error)
                }
            }
        }
    }

    fn terminal(&self, policy: &OnFailure, error: &StepError) -> EscalationDecision {
        match policy.terminal_action {
            TerminalAction::HumanReview => EscalationDecision::HumanReview {
                reason: error.message.clone(),
            },
            TerminalAction::Abort => EscalationDecision::Abort {
                reason: error.message.clone(),
            },
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(OnFailure::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showrunner_types::Backoff;

    fn make_step() -> Step {
        Step::new("upload", "publisher-agent", "upload_episode", "uploaded")
    }

    #[test]
    fn test_transient_retries_until_budget_spent() {
        let policy = EscalationPolicy::new(OnFailure::retry_then_review(3));
        let step = make_step();
        let err = StepError::transient("connection reset");

        assert!(matches!(
            policy.decide(&step, &err, 1),
            EscalationDecision::Retry { .. }
        ));
        assert!(matches!(
            policy.decide(&step, &err, 2),
            EscalationDecision::Retry { .. }
        ));
        // third failed attempt exhausts the budget of 3
        assert!(matches!(
            policy.decide(&step, &err, 3),
            EscalationDecision::HumanReview { .. }
        ));
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = EscalationPolicy::new(
            OnFailure::retry_then_review(4).with_backoff(Backoff::new(100, 2)),
        );
        let step = make_step();
        let err = StepError::transient("flaky");

        let EscalationDecision::Retry { delay } = policy.decide(&step, &err, 1) else {
            panic!("expected retry");
        };
        assert_eq!(delay, Duration::from_millis(100));

        let EscalationDecision::Retry { delay } = policy.decide(&step, &err, 3) else {
            panic!("expected retry");
        };
        assert_eq!(delay, Duration::from_millis(400));
    }

    #[test]
    fn test_validation_never_retries() {
        let policy = EscalationPolicy::new(OnFailure::retry_then_review(5));
        let step = make_step();
        let err = StepError::validation("duration bound to a string");

        assert!(matches!(
            policy.decide(&step, &err, 1),
            EscalationDecision::Abort { .. }
        ));
    }

    #[test]
    fn test_permanent_goes_straight_to_terminal() {
        let policy = EscalationPolicy::new(OnFailure::retry_then_review(5));
        let step = make_step();
        let err = StepError::permanent("account suspended");

        assert!(matches!(
            policy.decide(&step, &err, 1),
            EscalationDecision::HumanReview { .. }
        ));
    }

    #[test]
    fn test_step_override_replaces_default() {
        let policy = EscalationPolicy::new(OnFailure::retry_then_review(5));
        let step = make_step().with_on_failure(OnFailure::retry_then_abort(1));
        let err = StepError::transient("flaky");

        // override budget of 1 is already spent; override terminal action applies
        assert!(matches!(
            policy.decide(&step, &err, 1),
            EscalationDecision::Abort { .. }
        ));
    }
}
