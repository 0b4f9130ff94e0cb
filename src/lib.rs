//! tiny-crew-rs: a supervisor loop routing one request between tool-using
//! LLM workers
//!
//! A router model picks the next worker (researcher, editor, publisher) or
//! `finish` through a forced `route` function call. Each worker runs a small
//! tool-calling agent over the shared conversation and appends exactly one
//! turn. The loop stops on `finish` or when the step ceiling is reached.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tiny_crew_rs::{CrewConfig, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrewConfig::from_env()?;
//!     let orchestrator = Orchestrator::from_config(&config)?;
//!
//!     let report = orchestrator.run("Write a short post about Nano Health").await?;
//!     println!("{}", report.deliverable.unwrap_or_default());
//!     Ok(())
//! }
//! ```

extern crate self as tiny_crew_rs;

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod tools;
pub mod types;

pub use config::CrewConfig;
pub use core::{
    AgentAnswer, Author, MessageLog, Orchestrator, Router, RoutingDecision, RunPhase, RunState,
    ToolAgent, ToolCall, ToolExecution, ToolOutput, Turn, Worker, WorkerFailurePolicy, WorkerRole,
    WorkerSet,
};
pub use error::{CrewError, Result};
pub use schemas::validator::Validator;
pub use services::{
    model::ChatModel,
    openai_client::{ChatCompletionRequest, OpenAIClient},
};
pub use tinycrew_macros::tool;
pub use tools::{FunctionFactory, Tool};
pub use types::{RunFailure, RunReport};

#[cfg(feature = "cli")]
pub mod cli;
