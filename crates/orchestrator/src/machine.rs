//! The turn state machine.

use std::time::Duration;

use reasoner_core::{PromptContext, Reasoner, ReasonerError};
use sandbox::{ExecutionResult, Sandbox};
use tabular::Dataset;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::TurnError;
use crate::prompts;
use crate::state::{RoutingDecision, TurnState};

/// Default ceiling on a single reasoner call.
pub const DEFAULT_REASONER_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs one turn through `INGEST -> ROUTE -> {GENERATE_AND_EXECUTE |
/// SYNTHESIZE | TERMINAL}`.
///
/// The orchestrator:
/// - Profiles the dataset once per dataset lifetime (INGEST passes through
///   when a profile is already present)
/// - Classifies each turn through the reasoner, failing closed into `End`
/// - Runs generated code in the sandbox and keeps the outcome regardless of
///   success
/// - Converts every step failure into data on the returned state
///
/// Every branch converges on TERMINAL; a misclassification costs at most one
/// wasted execution, never a loop.
pub struct Orchestrator<R: Reasoner> {
    reasoner: R,
    sandbox: Sandbox,
    reasoner_timeout: Duration,
}

impl<R: Reasoner> Orchestrator<R> {
    /// Create an orchestrator over the given reasoner and sandbox.
    pub fn new(reasoner: R, sandbox: Sandbox) -> Self {
        Self {
            reasoner,
            sandbox,
            reasoner_timeout: DEFAULT_REASONER_TIMEOUT,
        }
    }

    /// Set the per-call reasoner timeout.
    pub fn with_reasoner_timeout(mut self, timeout: Duration) -> Self {
        self.reasoner_timeout = timeout;
        self
    }

    /// Get the reasoner.
    pub fn reasoner(&self) -> &R {
        &self.reasoner
    }

    /// Get the sandbox.
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Run one turn to TERMINAL and return the updated state.
    pub async fn run_turn(&self, dataset: &Dataset, mut state: TurnState) -> TurnState {
        info!(
            "turn started via {}: {:?}",
            self.reasoner.name(),
            state.user_question
        );

        // INGEST: profile once per dataset lifetime.
        if state.profile.is_none() {
            state.profile = Some(tabular::profile(dataset));
            debug!("profiled dataset: {} rows", dataset.row_count());
        }

        // ROUTE: classify through the reasoner; a failed call is a
        // turn-level error and the turn terminates without synthesis.
        let decision = match self.infer(prompts::routing_context(&state)).await {
            Ok(reply) => RoutingDecision::parse(&reply),
            Err(e) => {
                state.record_error(TurnError::ReasoningService(e));
                state.routing_decision = Some(RoutingDecision::End);
                return state;
            }
        };
        state.routing_decision = Some(decision);
        info!("routing decision: {}", decision.as_str());

        match decision {
            RoutingDecision::End => {
                // Intentional short-circuit: no synthesis, no error.
                info!("routing chose end; terminating turn");
            }
            RoutingDecision::GenerateCode => {
                self.generate_and_execute(dataset, &mut state).await;
                self.synthesize(&mut state).await;
            }
            RoutingDecision::Synthesize => {
                self.synthesize(&mut state).await;
            }
        }

        state
    }

    /// One reasoner call under the configured timeout.
    async fn infer(&self, context: PromptContext) -> Result<String, ReasonerError> {
        match timeout(self.reasoner_timeout, self.reasoner.infer(&context)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "reasoner call exceeded {:?} timeout",
                    self.reasoner_timeout
                );
                Err(ReasonerError::Timeout)
            }
        }
    }

    /// GENERATE_AND_EXECUTE: obtain a code fragment and run it.
    ///
    /// Unusable code is a turn-level error but never stops the machine: the
    /// synthesis step still runs and explains the absence of results.
    async fn generate_and_execute(&self, dataset: &Dataset, state: &mut TurnState) {
        let reply = match self.infer(prompts::codegen_context(state)).await {
            Ok(reply) => reply,
            Err(e) => {
                state.record_error(TurnError::CodeGeneration(e.to_string()));
                return;
            }
        };

        let code = prompts::strip_code_fences(&reply);
        if code.is_empty() {
            state.record_error(TurnError::CodeGeneration(
                "reasoner returned no usable code".to_string(),
            ));
            return;
        }

        debug!("generated code:\n{}", code);
        state.generated_code = Some(code.clone());

        // mlua is synchronous; run it off the async worker.
        let sandbox = self.sandbox.clone();
        let dataset = dataset.clone();
        let result =
            match tokio::task::spawn_blocking(move || sandbox.execute(&code, &dataset)).await {
                Ok(result) => result,
                Err(e) => ExecutionResult::failed(format!("sandbox task failed: {}", e), vec![]),
            };

        if result.success() {
            info!(
                "sandbox execution succeeded (chart: {})",
                result.image().is_some()
            );
        } else {
            warn!("sandbox execution failed: {:?}", result.error());
        }

        // Stored regardless of success; synthesis explains failures.
        state.execution_result = Some(result);
    }

    /// SYNTHESIZE: produce the user-visible answer.
    async fn synthesize(&self, state: &mut TurnState) {
        match self.infer(prompts::synthesis_context(state)).await {
            Ok(text) => {
                info!("synthesis produced: {} chars", text.len());
                state.synthesis = Some(text);
            }
            Err(e) => state.record_error(TurnError::ReasoningService(e)),
        }
    }
}
