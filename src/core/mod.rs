pub mod agent;
pub mod decision;
pub mod graph;
pub mod log;
pub mod orchestrator;
pub mod prompts;
pub mod router;
pub mod tool_call;
pub mod turn;
pub mod worker;

pub use agent::{AgentAnswer, ToolAgent};
pub use decision::{RoutingDecision, WorkerRole};
pub use log::MessageLog;
pub use orchestrator::{Orchestrator, RunPhase, RunState, WorkerFailurePolicy};
pub use router::Router;
pub use tool_call::{ToolCall, ToolExecution, ToolOutput};
pub use turn::{Author, Turn};
pub use worker::{Worker, WorkerSet};
