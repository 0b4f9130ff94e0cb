use super::{
    agent::ToolAgent,
    decision::{RoutingDecision, WorkerRole},
    log::MessageLog,
    router::Router,
    turn::Turn,
    worker::WorkerSet,
};
use crate::{
    config::CrewConfig,
    error::{CrewError, Result},
    services::{
        model::ChatModel,
        openai_client::{call_deadline, OpenAIClient},
    },
    tools::{FetchPage, FunctionFactory, WebSearchTool},
    types::report::{RunFailure, RunReport},
};
use std::{sync::Arc, time::Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Router invocations allowed per run unless configured otherwise
pub const DEFAULT_MAX_STEPS: usize = 150;

/// What to do when a worker's agent loop fails to produce an answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerFailurePolicy {
    /// End the run with the worker's error
    #[default]
    Abort,
    /// Record a failure turn and let the router decide again
    Reroute,
}

/// Where the run currently is. Aborts leave the loop as a `RunFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Routing,
    Dispatch(WorkerRole),
    Done,
}

/// Mutable state of one run, owned by the loop
#[derive(Debug, Clone)]
pub struct RunState {
    pub log: MessageLog,
    pub next: Option<RoutingDecision>,
    /// Router invocations so far
    pub step_count: usize,
}

impl RunState {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            log: MessageLog::with_request(request),
            next: None,
            step_count: 0,
        }
    }
}

/// Supervisor loop: router and workers alternate over one shared log until
/// the router says `finish` or the step ceiling is hit.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    router: Router,
    workers: WorkerSet,
    max_steps: usize,
    failure_policy: WorkerFailurePolicy,
}

impl Orchestrator {
    pub fn new(router: Router, workers: WorkerSet) -> Self {
        Self {
            router,
            workers,
            max_steps: DEFAULT_MAX_STEPS,
            failure_policy: WorkerFailurePolicy::default(),
        }
    }

    /// Wire a router and three workers over a single model client.
    pub fn with_model_client(model_client: Arc<dyn ChatModel>, config: &CrewConfig) -> Self {
        let mut function_factory = FunctionFactory::new().with_call_timeout(config.tool_timeout);
        function_factory.register_tool(FetchPage);
        if let Some(search_api_key) = &config.search_api_key {
            function_factory.register_tool(WebSearchTool::new(search_api_key.clone()));
        } else {
            warn!(
                target: "tinycrew::orchestrator",
                "no search API key configured, workers run without web_search"
            );
        }
        info!(
            target: "tinycrew::orchestrator",
            tools = ?function_factory.tool_names(),
            "worker tools registered"
        );

        // `model_timeout` bounds each HTTP attempt; a call may retry
        let model_deadline = call_deadline(config.model_timeout);
        let agent = ToolAgent::new(model_client.clone(), Arc::new(function_factory))
            .with_model(config.model.clone())
            .with_max_iterations(config.max_iterations)
            .with_max_tool_calls(config.max_tool_calls)
            .with_timeout(model_deadline);

        let router = Router::new(model_client)
            .with_model(config.model.clone())
            .with_timeout(model_deadline);

        let failure_policy = if config.reroute_on_worker_failure {
            WorkerFailurePolicy::Reroute
        } else {
            WorkerFailurePolicy::Abort
        };

        Self::new(router, WorkerSet::uniform(agent))
            .with_max_steps(config.max_steps)
            .with_failure_policy(failure_policy)
    }

    /// Build everything against the configured OpenAI-compatible endpoint.
    pub fn from_config(config: &CrewConfig) -> Result<Self> {
        config.validate()?;

        let client = OpenAIClient::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.model_timeout);

        Ok(Self::with_model_client(Arc::new(client), config))
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: WorkerFailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub async fn run(&self, request: impl Into<String>) -> std::result::Result<RunReport, RunFailure> {
        self.drive(request.into(), None).await
    }

    /// Same as [`Orchestrator::run`], also sending every turn to `sink` as
    /// soon as it lands in the log. A closed receiver does not stop the run.
    pub async fn run_streaming(
        &self,
        request: impl Into<String>,
        sink: UnboundedSender<Turn>,
    ) -> std::result::Result<RunReport, RunFailure> {
        self.drive(request.into(), Some(&sink)).await
    }

    async fn drive(
        &self,
        request: String,
        sink: Option<&UnboundedSender<Turn>>,
    ) -> std::result::Result<RunReport, RunFailure> {
        let started = Instant::now();
        let mut state = RunState::new(request);
        let mut emitted = 0;
        let mut phase = RunPhase::Routing;

        info!(
            target: "tinycrew::orchestrator",
            max_steps = self.max_steps,
            "starting run"
        );
        emit_new_turns(sink, &state.log, &mut emitted);

        loop {
            phase = match phase {
                RunPhase::Routing => {
                    if state.step_count >= self.max_steps {
                        warn!(
                            target: "tinycrew::orchestrator",
                            steps = state.step_count,
                            "step ceiling reached before finish"
                        );
                        let err = CrewError::StepLimitExceeded(state.step_count);
                        return Err(abort(err, state, started));
                    }

                    state.step_count += 1;
                    let decision = match self.router.route(&mut state.log).await {
                        Ok(decision) => decision,
                        Err(err) => return Err(abort(err, state, started)),
                    };
                    state.next = Some(decision);
                    emit_new_turns(sink, &state.log, &mut emitted);

                    match decision {
                        RoutingDecision::Finish => RunPhase::Done,
                        RoutingDecision::Researcher => RunPhase::Dispatch(WorkerRole::Researcher),
                        RoutingDecision::Editor => RunPhase::Dispatch(WorkerRole::Editor),
                        RoutingDecision::Publisher => RunPhase::Dispatch(WorkerRole::Publisher),
                    }
                }
                RunPhase::Dispatch(role) => {
                    debug!(
                        target: "tinycrew::orchestrator",
                        step = state.step_count,
                        worker = %role,
                        "dispatching"
                    );

                    match self.workers.get(role).act(&state.log).await {
                        Ok(turn) => state.log.push(turn),
                        Err(err @ CrewError::Agent(_))
                            if self.failure_policy == WorkerFailurePolicy::Reroute =>
                        {
                            warn!(
                                target: "tinycrew::orchestrator",
                                worker = %role,
                                error = %err,
                                "worker failed, returning to the router"
                            );
                            state.log.push(Turn::worker_failure(role, &err));
                        }
                        Err(err) => return Err(abort(err, state, started)),
                    }
                    emit_new_turns(sink, &state.log, &mut emitted);

                    RunPhase::Routing
                }
                RunPhase::Done => break,
            };
        }

        info!(
            target: "tinycrew::orchestrator",
            steps = state.step_count,
            turns = state.log.len(),
            "run finished"
        );
        Ok(RunReport::new(state.log, state.step_count, started.elapsed()))
    }
}

fn abort(error: CrewError, state: RunState, started: Instant) -> RunFailure {
    warn!(
        target: "tinycrew::orchestrator",
        code = error.error_code(),
        steps = state.step_count,
        "run aborted: {}",
        error
    );
    RunFailure::new(error, state.log, state.step_count, started.elapsed())
}

fn emit_new_turns(sink: Option<&UnboundedSender<Turn>>, log: &MessageLog, emitted: &mut usize) {
    let Some(sink) = sink else {
        *emitted = log.len();
        return;
    };

    for turn in &log.turns()[*emitted..] {
        if sink.send(turn.clone()).is_err() {
            debug!(target: "tinycrew::orchestrator", "turn receiver dropped");
        }
    }
    *emitted = log.len();
}
