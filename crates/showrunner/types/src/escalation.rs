//! Failure classification and the per-step escalation policy
//!
//! Every step failure carries a `FailureKind`. The kind, together with
//! the step's `OnFailure` policy (or the workflow default), determines
//! what happens next: bounded retry with exponential backoff, pause for
//! human review, or abort. Validation-class failures are never retried —
//! a definitionally wrong binding cannot succeed on a second attempt.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a step failure is classified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A definition or data bug: type mismatch, schema violation,
    /// malformed output. Never retried.
    Validation,
    /// A failure that can recover on its own: tool-reported transient
    /// errors, timeouts, agent unavailability. Eligible for retry.
    Transient,
    /// A failure that will not recover by retrying the same call.
    /// Goes to the terminal action directly.
    Permanent,
}

/// A structured step failure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepError {
    /// Classification driving the escalation policy
    pub kind: FailureKind,
    /// Human-readable description
    pub message: String,
}

impl StepError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Permanent, message)
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// What happens when a step exhausts its retries (or fails permanently)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalAction {
    /// Pause the step for human intervention; independent steps continue
    HumanReview,
    /// Abort the step (and block its dependents)
    Abort,
}

/// Exponential backoff between retry attempts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backoff {
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Multiplier applied per subsequent retry
    pub factor: u32,
}

impl Backoff {
    pub fn new(initial_delay_ms: u64, factor: u32) -> Self {
        Self {
            initial_delay_ms,
            factor,
        }
    }

    /// No delay between attempts (used in tests and for cheap local tools)
    pub fn none() -> Self {
        Self::new(0, 1)
    }

    /// The delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1);
        let factor = (self.factor as u64).saturating_pow(exp);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

impl Default for Backoff {
    // base-2 exponential starting at one second
    fn default() -> Self {
        Self::new(1_000, 2)
    }
}

/// Per-step failure policy; the workflow default applies when absent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnFailure {
    /// Total transient attempts allowed before the terminal action fires
    pub max_retries: u32,
    /// Backoff between attempts
    pub backoff: Backoff,
    /// What to do once retries are exhausted or the failure is permanent
    pub terminal_action: TerminalAction,
}

impl OnFailure {
    pub fn new(max_retries: u32, backoff: Backoff, terminal_action: TerminalAction) -> Self {
        Self {
            max_retries,
            backoff,
            terminal_action,
        }
    }

    /// Retry up to `max_retries` attempts, then pause for human review
    pub fn retry_then_review(max_retries: u32) -> Self {
        Self::new(max_retries, Backoff::default(), TerminalAction::HumanReview)
    }

    /// Retry up to `max_retries` attempts, then abort
    pub fn retry_then_abort(max_retries: u32) -> Self {
        Self::new(max_retries, Backoff::default(), TerminalAction::Abort)
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for OnFailure {
    // 3 attempts, base-2 backoff, then human review
    fn default() -> Self {
        Self::retry_then_review(3)
    }
}
