use super::{
    decision::{RoutingDecision, WorkerRole},
    tool_call::ToolCall,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Who wrote a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum Author {
    User,
    Router,
    Worker(WorkerRole),
}

impl Author {
    pub fn label(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Router => "router",
            Author::Worker(role) => role.name(),
        }
    }
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub author: Author,
    pub content: String,
    /// Set on router turns only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<RoutingDecision>,
    /// The `route` call the decision was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    /// Marks a worker turn recording a failure instead of an answer
    #[serde(default)]
    pub is_error: bool,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            content: content.into(),
            decision: None,
            tool_call: None,
            is_error: false,
        }
    }

    pub fn worker(role: WorkerRole, content: impl Into<String>) -> Self {
        Self {
            author: Author::Worker(role),
            content: content.into(),
            decision: None,
            tool_call: None,
            is_error: false,
        }
    }

    /// Worker turn recording that `role` gave up, e.g. "editor failed: ..."
    pub fn worker_failure(role: WorkerRole, reason: impl std::fmt::Display) -> Self {
        Self {
            is_error: true,
            ..Self::worker(role, format!("{} failed: {}", role, reason))
        }
    }

    pub fn routing(decision: RoutingDecision, tool_call: ToolCall, raw: impl Into<String>) -> Self {
        Self {
            author: Author::Router,
            content: raw.into(),
            decision: Some(decision),
            tool_call: Some(tool_call),
            is_error: false,
        }
    }

    pub fn is_worker(&self) -> bool {
        matches!(self.author, Author::Worker(_))
    }

    /// Render as chat-completion messages.
    ///
    /// Router turns become an assistant `route` call followed by its tool
    /// result, so the provider sees a well-formed call/response pair.
    /// Worker turns are attributed user messages carrying the worker name.
    pub fn to_messages(&self) -> Vec<Value> {
        match self.author {
            Author::User => vec![json!({
                "role": "user",
                "content": self.content
            })],
            Author::Worker(role) => vec![json!({
                "role": "user",
                "name": role.name(),
                "content": self.content
            })],
            Author::Router => match (&self.tool_call, self.decision) {
                (Some(call), Some(decision)) => vec![
                    json!({
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [call.to_openai_format()]
                    }),
                    json!({
                        "role": "tool",
                        "tool_call_id": call.id,
                        "content": decision.as_str()
                    }),
                ],
                _ => vec![json!({
                    "role": "assistant",
                    "content": self.content
                })],
            },
        }
    }

    /// Get a human-readable description of the turn
    pub fn describe(&self) -> String {
        match (self.author, self.decision) {
            (Author::User, _) => format!("🧭 Request: {}", self.content),
            (Author::Router, Some(decision)) => format!("🔀 Route: {}", decision),
            (Author::Router, None) => format!("🔀 Router: {}", self.content),
            (Author::Worker(_), _) if self.is_error => format!("❌ {}", self.content),
            (Author::Worker(role), _) => format!("🧠 {}: {}", role, self.content),
        }
    }
}
