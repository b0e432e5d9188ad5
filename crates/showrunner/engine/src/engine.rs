//! Execution engine: walks the workflow graph to completion
//!
//! The engine is the single scheduling authority for a run. It promotes
//! steps to ready as their bindings resolve, dispatches independent
//! ready steps concurrently, applies the escalation policy to every
//! failure, and appends a ledger entry for every state transition. The
//! ledger entry for a success is appended *before* the output becomes
//! visible to dependent binds, so no dependent step ever observes a
//! partially-recorded result.
//!
//! The engine never executes work itself. Tools are opaque async
//! collaborators resolved through the registry at dispatch time.

use crate::binder::{bind, BindOutcome};
use crate::context::WorkflowContext;
use crate::escalation::{EscalationDecision, EscalationPolicy};
use crate::ledger::ExecutionLedger;
use chrono::Utc;
use showrunner_registry::AgentRegistry;
use showrunner_types::{
    BoundInputs, InputBinding, LedgerEntry, OnFailure, OrchestrationError, OrchestrationResult,
    OutputKey, ParamValue, RunReport, RunStatus, Step, StepError, StepExecution, StepId,
    StepReport, StepState, ToolOutput, WorkflowDefinition, WorkflowRunId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

// ── Configuration ────────────────────────────────────────────────────

/// Engine-level defaults; definitions may override the timeouts and
/// the failure policy per workflow or per step
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Concurrency cap for dispatched steps within one run
    pub max_concurrent_steps: usize,
    /// Per-step timeout when neither the step nor the workflow sets one
    pub default_step_timeout: Duration,
    /// Wall-clock budget when the definition sets no `max_duration_ms`
    pub default_workflow_timeout: Duration,
    /// Failure policy when the definition sets no default
    pub default_on_failure: OnFailure,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_steps: 4,
            default_step_timeout: Duration::from_secs(60),
            default_workflow_timeout: Duration::from_secs(3600),
            default_on_failure: OnFailure::default(),
        }
    }
}

// ── Runtime bookkeeping ──────────────────────────────────────────────

struct StepRuntime {
    exec: StepExecution,
    /// Resolved inputs, cached between bind and dispatch; bind is
    /// deterministic for an unchanged context, so a retry reuses them
    bound: Option<BoundInputs>,
    /// Earliest dispatch time, set by retry backoff
    not_before: Option<Instant>,
}

impl StepRuntime {
    fn new(exec: StepExecution) -> Self {
        Self {
            exec,
            bound: None,
            not_before: None,
        }
    }
}

/// What a spawned invocation task reports back
struct StepOutcome {
    step_id: StepId,
    result: Result<ToolOutput, StepError>,
}

// ── Execution engine ─────────────────────────────────────────────────

/// Schedules and runs workflow definitions to completion or terminal
/// failure
pub struct ExecutionEngine {
    registry: Arc<AgentRegistry>,
    ledger: ExecutionLedger,
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(registry: Arc<AgentRegistry>, ledger: ExecutionLedger, config: EngineConfig) -> Self {
        Self {
            registry,
            ledger,
            config,
        }
    }

    /// The ledger this engine appends to
    pub fn ledger(&self) -> &ExecutionLedger {
        &self.ledger
    }

    /// Execute a workflow definition with the given entry inputs.
    ///
    /// Validates the definition and the entry inputs before any step
    /// runs. Step-local failures never surface as an `Err` here; they
    /// are aggregated into the returned [`RunReport`].
    pub async fn run(
        &self,
        definition: &WorkflowDefinition,
        entry_inputs: BTreeMap<String, ParamValue>,
    ) -> OrchestrationResult<RunReport> {
        definition.validate()?;
        let entry = self.validate_entry_inputs(definition, entry_inputs)?;
        let run_id = WorkflowRunId::generate();
        self.execute(definition, entry, run_id, BTreeMap::new()).await
    }

    /// Resume a partially-succeeded run without re-executing the steps
    /// that already succeeded.
    ///
    /// Outputs of succeeded steps are reconstructed from the run's
    /// ledger entries; the remaining steps get fresh attempts. New
    /// transitions are appended under the same run id.
    pub async fn resume(
        &self,
        definition: &WorkflowDefinition,
        entry_inputs: BTreeMap<String, ParamValue>,
        run_id: &WorkflowRunId,
    ) -> OrchestrationResult<RunReport> {
        definition.validate()?;
        let entry = self.validate_entry_inputs(definition, entry_inputs)?;
        let preloaded = self.ledger.replay_outputs(definition, run_id)?;
        self.execute(definition, entry, run_id.clone(), preloaded).await
    }

    // ── Entry input validation ───────────────────────────────────────

    fn validate_entry_inputs(
        &self,
        definition: &WorkflowDefinition,
        mut supplied: BTreeMap<String, ParamValue>,
    ) -> OrchestrationResult<BTreeMap<String, ParamValue>> {
        for param in &definition.entry_inputs.params {
            match supplied.get(&param.name) {
                Some(value) => {
                    if !param.param_type.matches(value) {
                        return Err(OrchestrationError::EntryInputMismatch {
                            key: param.name.clone(),
                            expected: param.param_type.to_string(),
                            actual: value.type_name().to_string(),
                        });
                    }
                }
                None => match &param.default {
                    Some(default) if !param.required => {
                        supplied.insert(param.name.clone(), default.clone());
                    }
                    _ => {
                        return Err(OrchestrationError::MissingEntryInput {
                            key: param.name.clone(),
                        })
                    }
                },
            }
        }
        Ok(supplied)
    }

    // ── Run driver ───────────────────────────────────────────────────

    async fn execute(
        &self,
        definition: &WorkflowDefinition,
        entry: BTreeMap<String, ParamValue>,
        run_id: WorkflowRunId,
        preloaded: BTreeMap<OutputKey, ToolOutput>,
    ) -> OrchestrationResult<RunReport> {
        let started_at = Utc::now();
        let policy = EscalationPolicy::new(
            definition
                .default_on_failure
                .clone()
                .unwrap_or_else(|| self.config.default_on_failure.clone()),
        );
        let workflow_timeout = definition
            .max_duration_ms
            .map(Duration::from_millis)
            .unwrap_or(self.config.default_workflow_timeout);
        let deadline = Instant::now() + workflow_timeout;

        let mut context = WorkflowContext::new(entry);
        let mut steps: HashMap<StepId, StepRuntime> = HashMap::new();

        for step in &definition.steps {
            let mut runtime = StepRuntime::new(StepExecution::pending(step.step_id.clone()));
            if let Some(output) = preloaded.get(&step.produces) {
                // already succeeded in a prior attempt of this run
                runtime.exec.state = StepState::Succeeded;
                context.publish(step.produces.clone(), output.clone())?;
            } else {
                self.append(&run_id, &step.step_id, None, StepState::Pending, None, None);
            }
            steps.insert(step.step_id.clone(), runtime);
        }

        tracing::info!(
            run_id = %run_id,
            workflow = %definition.workflow_name,
            steps = definition.step_count(),
            "Workflow run started"
        );

        let mut tasks: JoinSet<StepOutcome> = JoinSet::new();
        let mut task_ids: HashMap<tokio::task::Id, StepId> = HashMap::new();
        let mut timed_out = false;
        let mut run_aborted = false;

        'driver: loop {
            // Make all cheap progress before waiting on anything
            let mut terminal_failure = false;
            loop {
                let mut progressed = false;
                progressed |= self.propagate_dependency_failures(definition, &run_id, &mut steps);
                progressed |= self.bind_phase(
                    definition,
                    &run_id,
                    &policy,
                    &context,
                    &mut steps,
                    &mut terminal_failure,
                );
                progressed |= self.dispatch_phase(
                    definition,
                    &run_id,
                    &mut steps,
                    &mut tasks,
                    &mut task_ids,
                );
                if !progressed {
                    break;
                }
            }
            if terminal_failure && definition.abort_on_any_failure {
                run_aborted = true;
                self.abort_remaining(definition, &run_id, &mut steps, "another step failed terminally");
                tasks.abort_all();
                break;
            }

            if !tasks.is_empty() {
                match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                    Err(_) => {
                        timed_out = true;
                        self.abort_remaining(
                            definition,
                            &run_id,
                            &mut steps,
                            &OrchestrationError::WorkflowTimeout.to_string(),
                        );
                        tasks.abort_all();
                        break;
                    }
                    Ok(Some(Ok((task_id, outcome)))) => {
                        task_ids.remove(&task_id);
                        let terminal = self.handle_completion(
                            definition,
                            &run_id,
                            &policy,
                            &mut context,
                            &mut steps,
                            outcome,
                        );
                        if terminal && definition.abort_on_any_failure {
                            run_aborted = true;
                            self.abort_remaining(
                                definition,
                                &run_id,
                                &mut steps,
                                "another step failed terminally",
                            );
                            tasks.abort_all();
                            break 'driver;
                        }
                    }
                    Ok(Some(Err(join_error))) => {
                        // a tool implementation panicked; the step fails permanently
                        if let Some(step_id) = task_ids.remove(&join_error.id()) {
                            let terminal = self.handle_completion(
                                definition,
                                &run_id,
                                &policy,
                                &mut context,
                                &mut steps,
                                StepOutcome {
                                    step_id,
                                    result: Err(StepError::permanent(format!(
                                        "tool task failed: {}",
                                        join_error
                                    ))),
                                },
                            );
                            if terminal && definition.abort_on_any_failure {
                                run_aborted = true;
                                self.abort_remaining(
                                    definition,
                                    &run_id,
                                    &mut steps,
                                    "another step failed terminally",
                                );
                                tasks.abort_all();
                                break 'driver;
                            }
                        }
                    }
                    Ok(None) => {}
                }
                continue;
            }

            // No tasks in flight: either wait out a retry backoff or stop
            if let Some(wake) = self.earliest_retry(&steps) {
                if wake >= deadline {
                    timed_out = true;
                    self.abort_remaining(
                        definition,
                        &run_id,
                        &mut steps,
                        &OrchestrationError::WorkflowTimeout.to_string(),
                    );
                    break;
                }
                tokio::time::sleep_until(wake).await;
                continue;
            }

            // No tasks, no pending retries, nothing bindable: whatever
            // is still pending is blocked behind an escalated step and
            // stays pending for a later resume
            break;
        }

        let report =
            self.build_report(definition, &run_id, &steps, started_at, timed_out || run_aborted);
        tracing::info!(
            run_id = %run_id,
            status = ?report.status,
            succeeded = report.count_in(StepState::Succeeded),
            "Workflow run finished"
        );
        Ok(report)
    }

    // ── Phases ───────────────────────────────────────────────────────

    /// Abort pending/ready steps whose direct dependency ended in
    /// `Aborted`. Dependents of an `Escalated` step are left pending;
    /// they become runnable again if the run is resumed after review.
    fn propagate_dependency_failures(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
        steps: &mut HashMap<StepId, StepRuntime>,
    ) -> bool {
        let mut progressed = false;
        for step in &definition.steps {
            let Some(state) = steps.get(&step.step_id).map(|rt| rt.exec.state) else {
                continue;
            };
            if !matches!(state, StepState::Pending | StepState::Ready) {
                continue;
            }
            let failed_dep = step.dependencies().into_iter().find(|dep| {
                steps.get(*dep).map(|rt| rt.exec.state) == Some(StepState::Aborted)
            });
            if let Some(dep) = failed_dep {
                let error = StepError::permanent(format!("dependency '{}' did not succeed", dep));
                let Some(runtime) = steps.get_mut(&step.step_id) else {
                    continue;
                };
                runtime.exec.last_error = Some(error.clone());
                runtime.exec.ended_at = Some(Utc::now());
                self.transition(run_id, runtime, StepState::Aborted, Some(error), None);
                tracing::warn!(
                    run_id = %run_id,
                    step_id = %step.step_id,
                    "Step aborted: dependency failed"
                );
                progressed = true;
            }
        }
        progressed
    }

    /// Attempt to bind every pending step. A successful bind promotes
    /// the step to ready; a bind error aborts it with zero attempts; a
    /// missing tool spec counts as a transient availability failure once
    /// the step's data dependencies are satisfied.
    fn bind_phase(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
        policy: &EscalationPolicy,
        context: &WorkflowContext,
        steps: &mut HashMap<StepId, StepRuntime>,
        terminal_failure: &mut bool,
    ) -> bool {
        let mut progressed = false;
        for step in &definition.steps {
            let Some(runtime) = steps.get(&step.step_id) else {
                continue;
            };
            if runtime.exec.state != StepState::Pending {
                continue;
            }
            if let Some(not_before) = runtime.not_before {
                if Instant::now() < not_before {
                    continue;
                }
            }

            match self.registry.spec_of(&step.agent_id, &step.tool_name) {
                Ok(spec) => match bind(step, &spec, context) {
                    Ok(BindOutcome::Bound(inputs)) => {
                        let Some(runtime) = steps.get_mut(&step.step_id) else {
                            continue;
                        };
                        runtime.bound = Some(inputs);
                        runtime.not_before = None;
                        self.transition(run_id, runtime, StepState::Ready, None, None);
                        progressed = true;
                    }
                    Ok(BindOutcome::Pending { .. }) => {}
                    Err(error) => {
                        // definition/data bug: straight to aborted, zero attempts
                        let step_error = StepError::validation(error.to_string());
                        let Some(runtime) = steps.get_mut(&step.step_id) else {
                            continue;
                        };
                        runtime.exec.last_error = Some(step_error.clone());
                        runtime.exec.ended_at = Some(Utc::now());
                        self.transition(run_id, runtime, StepState::Aborted, Some(step_error), None);
                        tracing::error!(
                            run_id = %run_id,
                            step_id = %step.step_id,
                            %error,
                            "Step aborted at bind time"
                        );
                        *terminal_failure = true;
                        progressed = true;
                    }
                },
                Err(error) if Self::data_dependencies_satisfied(step, context) => {
                    // the tool is missing or its agent is gone; counts as
                    // a failed attempt so availability recovery is retried
                    let step_error = StepError::new(error.failure_kind(), error.to_string());
                    *terminal_failure |= self.record_failure(
                        run_id,
                        policy,
                        step,
                        steps,
                        step_error,
                        StepState::Pending,
                    );
                    progressed = true;
                }
                Err(_) => {}
            }
        }
        progressed
    }

    /// Dispatch ready steps whose backoff has elapsed, up to the
    /// concurrency cap. Independent ready steps run concurrently.
    fn dispatch_phase(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
        steps: &mut HashMap<StepId, StepRuntime>,
        tasks: &mut JoinSet<StepOutcome>,
        task_ids: &mut HashMap<tokio::task::Id, StepId>,
    ) -> bool {
        let mut progressed = false;
        for step in &definition.steps {
            if tasks.len() >= self.config.max_concurrent_steps {
                break;
            }
            let Some(runtime) = steps.get(&step.step_id) else {
                continue;
            };
            if runtime.exec.state != StepState::Ready {
                continue;
            }
            if let Some(not_before) = runtime.not_before {
                if Instant::now() < not_before {
                    continue;
                }
            }
            let Some(inputs) = runtime.bound.clone() else {
                continue;
            };

            let Some(runtime) = steps.get_mut(&step.step_id) else {
                continue;
            };
            runtime.exec.attempt_count += 1;
            runtime.not_before = None;
            if runtime.exec.started_at.is_none() {
                runtime.exec.started_at = Some(Utc::now());
            }
            self.transition(run_id, runtime, StepState::Running, None, None);
            tracing::info!(
                run_id = %run_id,
                step_id = %step.step_id,
                agent_id = %step.agent_id,
                tool = %step.tool_name,
                attempt = runtime.exec.attempt_count,
                "Step dispatched"
            );

            let registry = Arc::clone(&self.registry);
            let step_id = step.step_id.clone();
            let agent_id = step.agent_id.clone();
            let tool_name = step.tool_name.clone();
            let step_timeout = step
                .timeout_ms
                .or(definition.default_step_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(self.config.default_step_timeout);

            let handle = tasks.spawn(async move {
                // availability is re-checked here, so an agent that
                // recovered since the last attempt is usable again
                let tool = match registry.resolve(&agent_id, &tool_name) {
                    Ok(tool) => tool,
                    Err(error) => {
                        return StepOutcome {
                            step_id,
                            result: Err(StepError::new(error.failure_kind(), error.to_string())),
                        }
                    }
                };
                let result = match tokio::time::timeout(step_timeout, tool.invoke(inputs)).await {
                    Ok(result) => result,
                    Err(_) => Err(StepError::transient(format!(
                        "step timed out after {} ms",
                        step_timeout.as_millis()
                    ))),
                };
                StepOutcome { step_id, result }
            });
            task_ids.insert(handle.id(), step.step_id.clone());
            progressed = true;
        }
        progressed
    }

    /// Process one finished invocation. Returns whether the step ended
    /// in a failure-terminal state.
    fn handle_completion(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
        policy: &EscalationPolicy,
        context: &mut WorkflowContext,
        steps: &mut HashMap<StepId, StepRuntime>,
        outcome: StepOutcome,
    ) -> bool {
        let Some(step) = definition.get_step(&outcome.step_id) else {
            return false;
        };

        match outcome.result {
            Ok(output) => {
                if let Err(message) = self.check_output(step, &output) {
                    return self.record_failure(
                        run_id,
                        policy,
                        step,
                        steps,
                        StepError::validation(message),
                        StepState::Running,
                    );
                }
                let Some(runtime) = steps.get_mut(&step.step_id) else {
                    return false;
                };
                // ledger append happens-before context visibility
                self.transition(
                    run_id,
                    runtime,
                    StepState::Succeeded,
                    None,
                    Some(output.clone()),
                );
                runtime.exec.ended_at = Some(Utc::now());
                if let Err(error) = context.publish(step.produces.clone(), output) {
                    // a retried step produced different content for an
                    // already-published key
                    let step_error = StepError::validation(error.to_string());
                    let Some(runtime) = steps.get_mut(&step.step_id) else {
                        return true;
                    };
                    runtime.exec.last_error = Some(step_error.clone());
                    self.transition(run_id, runtime, StepState::Aborted, Some(step_error), None);
                    return true;
                }
                tracing::info!(run_id = %run_id, step_id = %step.step_id, "Step succeeded");
                false
            }
            Err(error) => {
                self.record_failure(run_id, policy, step, steps, error, StepState::Running)
            }
        }
    }

    /// Record a failed attempt and apply the escalation decision.
    /// `failed_from` is the state the failure happened in: `Pending`
    /// for availability failures before binding (which consume an
    /// attempt here), `Running` for invocation failures. Returns whether
    /// the step ended terminally.
    fn record_failure(
        &self,
        run_id: &WorkflowRunId,
        policy: &EscalationPolicy,
        step: &Step,
        steps: &mut HashMap<StepId, StepRuntime>,
        error: StepError,
        failed_from: StepState,
    ) -> bool {
        let Some(runtime) = steps.get_mut(&step.step_id) else {
            return false;
        };
        if failed_from == StepState::Pending {
            runtime.exec.attempt_count += 1;
        }
        runtime.exec.last_error = Some(error.clone());
        self.transition(run_id, runtime, StepState::Failed, Some(error.clone()), None);

        match policy.decide(step, &error, runtime.exec.attempt_count) {
            EscalationDecision::Retry { delay } => {
                let retry_state = if failed_from == StepState::Pending {
                    StepState::Pending
                } else {
                    StepState::Ready
                };
                runtime.not_before = Some(Instant::now() + delay);
                self.transition(run_id, runtime, retry_state, None, None);
                tracing::warn!(
                    run_id = %run_id,
                    step_id = %step.step_id,
                    attempt = runtime.exec.attempt_count,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Step failed; will retry"
                );
                false
            }
            EscalationDecision::HumanReview { reason } => {
                runtime.exec.ended_at = Some(Utc::now());
                self.transition(run_id, runtime, StepState::Escalated, Some(error), None);
                tracing::warn!(
                    run_id = %run_id,
                    step_id = %step.step_id,
                    reason = %reason,
                    "Step escalated for human review"
                );
                true
            }
            EscalationDecision::Abort { reason } => {
                runtime.exec.ended_at = Some(Utc::now());
                self.transition(run_id, runtime, StepState::Aborted, Some(error), None);
                tracing::error!(
                    run_id = %run_id,
                    step_id = %step.step_id,
                    reason = %reason,
                    "Step aborted"
                );
                true
            }
        }
    }

    /// Workflow-level stop: abort every non-terminal step
    fn abort_remaining(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
        steps: &mut HashMap<StepId, StepRuntime>,
        reason: &str,
    ) {
        for step in &definition.steps {
            let Some(runtime) = steps.get_mut(&step.step_id) else {
                continue;
            };
            if runtime.exec.is_terminal() {
                continue;
            }
            let error = StepError::transient(reason);
            runtime.exec.last_error = Some(error.clone());
            runtime.exec.ended_at = Some(Utc::now());
            self.transition(run_id, runtime, StepState::Aborted, Some(error), None);
        }
        tracing::warn!(run_id = %run_id, reason = %reason, "Workflow run aborted");
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn data_dependencies_satisfied(step: &Step, context: &WorkflowContext) -> bool {
        step.input_bindings.values().all(|binding| match binding {
            InputBinding::StepOutput { output_key, .. } => context.output(output_key).is_some(),
            _ => true,
        })
    }

    /// Declared output fields must be present with conforming types;
    /// undeclared extra fields are tolerated
    fn check_output(&self, step: &Step, output: &ToolOutput) -> Result<(), String> {
        let spec = match self.registry.spec_of(&step.agent_id, &step.tool_name) {
            Ok(spec) => spec,
            Err(_) => return Ok(()),
        };
        for field in &spec.output_schema.fields {
            match output.get(&field.name) {
                None => {
                    return Err(format!(
                        "tool '{}' output is missing declared field '{}'",
                        step.tool_name, field.name
                    ))
                }
                Some(value) if !field.field_type.matches(value) => {
                    return Err(format!(
                        "tool '{}' output field '{}' has type {}, expected {}",
                        step.tool_name,
                        field.name,
                        value.type_name(),
                        field.field_type
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn earliest_retry(&self, steps: &HashMap<StepId, StepRuntime>) -> Option<Instant> {
        steps
            .values()
            .filter(|rt| matches!(rt.exec.state, StepState::Pending | StepState::Ready))
            .filter_map(|rt| rt.not_before)
            .min()
    }

    fn transition(
        &self,
        run_id: &WorkflowRunId,
        runtime: &mut StepRuntime,
        to_state: StepState,
        error: Option<StepError>,
        output: Option<ToolOutput>,
    ) {
        self.append(
            run_id,
            &runtime.exec.step_id,
            Some(runtime.exec.state),
            to_state,
            error,
            output,
        );
        runtime.exec.state = to_state;
    }

    fn append(
        &self,
        run_id: &WorkflowRunId,
        step_id: &StepId,
        from_state: Option<StepState>,
        to_state: StepState,
        error: Option<StepError>,
        output: Option<ToolOutput>,
    ) {
        let mut entry = LedgerEntry::new(run_id.clone(), step_id.clone(), from_state, to_state);
        if let Some(error) = error {
            entry = entry.with_error(error);
        }
        if let Some(output) = output {
            entry = entry.with_output(output);
        }
        self.ledger.append(entry);
    }

    fn build_report(
        &self,
        definition: &WorkflowDefinition,
        run_id: &WorkflowRunId,
        steps: &HashMap<StepId, StepRuntime>,
        started_at: chrono::DateTime<Utc>,
        aborted_outright: bool,
    ) -> RunReport {
        let step_reports: Vec<StepReport> = definition
            .steps
            .iter()
            .filter_map(|step| {
                steps.get(&step.step_id).map(|runtime| StepReport {
                    step_id: step.step_id.clone(),
                    state: runtime.exec.state,
                    attempt_count: runtime.exec.attempt_count,
                    error: runtime.exec.last_error.clone(),
                })
            })
            .collect();

        let succeeded = step_reports
            .iter()
            .filter(|s| s.state == StepState::Succeeded)
            .count();
        let status = if aborted_outright {
            RunStatus::Aborted
        } else if succeeded == step_reports.len() {
            RunStatus::Succeeded
        } else if succeeded > 0 {
            RunStatus::PartiallySucceeded
        } else {
            RunStatus::Aborted
        };

        RunReport {
            run_id: run_id.clone(),
            workflow_name: definition.workflow_name.clone(),
            status,
            steps: step_reports,
            started_at,
            ended_at: Utc::now(),
        }
    }
}
