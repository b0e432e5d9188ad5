//! Showrunner execution engine
//!
//! Drives validated workflow definitions against the agent registry:
//! binds step parameters from the shared run context, dispatches
//! independent steps concurrently, escalates failures through the
//! retry / human-review / abort ladder, and records every state
//! transition in an append-only execution ledger.

#![deny(unsafe_code)]

pub mod binder;
pub mod context;
pub mod engine;
pub mod escalation;
pub mod ledger;

pub use binder::{bind, BindOutcome};
pub use context::WorkflowContext;
pub use engine::{EngineConfig, ExecutionEngine};
pub use escalation::{EscalationDecision, EscalationPolicy};
pub use ledger::ExecutionLedger;
