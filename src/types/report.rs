use crate::{
    core::{
        decision::{RoutingDecision, WorkerRole},
        log::MessageLog,
        turn::{Author, Turn},
    },
    error::CrewError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a run that reached `finish`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Last successful worker answer, if any worker ever spoke
    pub deliverable: Option<String>,
    /// Every turn of the run, in order
    pub log: MessageLog,
    /// Routing steps taken, including the final `finish`
    pub steps: usize,
    /// Total execution duration
    pub duration: Duration,
}

impl RunReport {
    pub fn new(log: MessageLog, steps: usize, duration: Duration) -> Self {
        let deliverable = log.last_worker_turn().map(|turn| turn.content.clone());
        Self {
            deliverable,
            log,
            steps,
            duration,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        self.log.turns()
    }

    /// Count of turns a given worker authored.
    pub fn worker_turns(&self, role: WorkerRole) -> usize {
        self.log
            .count_by(|turn| turn.author == Author::Worker(role))
    }

    /// Decisions in the order the router made them.
    pub fn decisions(&self) -> Vec<RoutingDecision> {
        self.log
            .turns()
            .iter()
            .filter_map(|turn| turn.decision)
            .collect()
    }

    /// Worker turns that recorded a failure instead of an answer
    pub fn failures(&self) -> Vec<&Turn> {
        self.log
            .turns()
            .iter()
            .filter(|turn| turn.is_error)
            .collect()
    }

    /// Generate a human-readable replay of the run
    pub fn replay(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Crew Run Trace ===".to_string());
        lines.push(format!("Duration: {:.2}s", self.duration.as_secs_f64()));
        lines.push(format!("Steps: {}", self.steps));
        lines.push(format!(
            "Worker turns: {} researcher, {} editor, {} publisher",
            self.worker_turns(WorkerRole::Researcher),
            self.worker_turns(WorkerRole::Editor),
            self.worker_turns(WorkerRole::Publisher)
        ));

        lines.push(String::new());
        lines.push("--- Turns ---".to_string());

        for (idx, turn) in self.log.turns().iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, turn.describe()));
        }

        lines.push(String::new());
        lines.push("--- Deliverable ---".to_string());
        lines.push(
            self.deliverable
                .clone()
                .unwrap_or_else(|| "(no worker produced output)".to_string()),
        );

        lines.join("\n")
    }
}

/// A run that stopped on an error, with the log accumulated so far
#[derive(Debug, thiserror::Error)]
#[error("run aborted after {steps} steps: {error}")]
pub struct RunFailure {
    #[source]
    pub error: CrewError,
    pub log: MessageLog,
    pub steps: usize,
    pub duration: Duration,
}

impl RunFailure {
    pub fn new(error: CrewError, log: MessageLog, steps: usize, duration: Duration) -> Self {
        Self {
            error,
            log,
            steps,
            duration,
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.error.error_code()
    }

    /// Partial report over whatever the run produced before failing
    pub fn partial_report(&self) -> RunReport {
        RunReport::new(self.log.clone(), self.steps, self.duration)
    }
}
