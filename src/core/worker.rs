use super::{
    agent::ToolAgent,
    decision::WorkerRole,
    log::MessageLog,
    prompts::{self, PUBLISH_CHAR_LIMIT},
    turn::Turn,
};
use crate::error::Result;
use serde_json::{json, Value};
use tracing::{info, warn};

/// One worker: a role, its instructions and the agent that does the work
#[derive(Debug, Clone)]
pub struct Worker {
    role: WorkerRole,
    agent: ToolAgent,
    system_prompt: String,
    char_limit: Option<usize>,
}

impl Worker {
    pub fn new(role: WorkerRole, agent: ToolAgent) -> Self {
        let char_limit = match role {
            WorkerRole::Publisher => Some(PUBLISH_CHAR_LIMIT),
            WorkerRole::Researcher | WorkerRole::Editor => None,
        };

        Self {
            role,
            agent,
            system_prompt: prompts::worker_system_prompt(role),
            char_limit,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub fn format_messages(&self, log: &MessageLog) -> Vec<Value> {
        let mut messages = vec![json!({
            "role": "system",
            "content": self.system_prompt
        })];
        messages.extend(log.as_messages());
        messages
    }

    /// Produce exactly one turn authored by this worker.
    pub async fn act(&self, log: &MessageLog) -> Result<Turn> {
        let answer = self
            .agent
            .run_with_messages(self.format_messages(log))
            .await?;

        info!(
            target: "tinycrew::worker",
            worker = %self.role,
            iterations = answer.iterations,
            tool_calls = answer.tool_outputs.len(),
            failed_tool_calls = answer.tool_outputs.iter().filter(|o| o.is_error).count(),
            "worker finished"
        );

        let content = match self.char_limit {
            Some(limit) => self.enforce_char_limit(answer.answer, limit),
            None => answer.answer,
        };

        Ok(Turn::worker(self.role, content))
    }

    fn enforce_char_limit(&self, answer: String, limit: usize) -> String {
        let length = answer.chars().count();
        if length <= limit {
            return answer;
        }

        warn!(
            target: "tinycrew::worker",
            worker = %self.role,
            length,
            limit,
            "answer over the character limit, truncating"
        );
        let mut truncated: String = answer.chars().take(limit.saturating_sub(1)).collect();
        truncated.push('…');
        truncated
    }
}

/// The fixed roster, looked up by an exhaustive match on the role
#[derive(Debug, Clone)]
pub struct WorkerSet {
    researcher: Worker,
    editor: Worker,
    publisher: Worker,
}

impl WorkerSet {
    pub fn new(researcher: Worker, editor: Worker, publisher: Worker) -> Self {
        Self {
            researcher,
            editor,
            publisher,
        }
    }

    /// Three workers sharing one agent configuration.
    pub fn uniform(agent: ToolAgent) -> Self {
        Self::new(
            Worker::new(WorkerRole::Researcher, agent.clone()),
            Worker::new(WorkerRole::Editor, agent.clone()),
            Worker::new(WorkerRole::Publisher, agent),
        )
    }

    pub fn get(&self, role: WorkerRole) -> &Worker {
        match role {
            WorkerRole::Researcher => &self.researcher,
            WorkerRole::Editor => &self.editor,
            WorkerRole::Publisher => &self.publisher,
        }
    }
}
