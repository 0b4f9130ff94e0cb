#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Mutex};
use tiny_crew_rs::{ChatModel, CrewError, Result};

/// Chat model double that answers router calls and worker calls from two
/// separate queues and records every request it saw.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    routes: Mutex<VecDeque<String>>,
    repeat_route: Option<String>,
    worker_replies: Mutex<VecDeque<Value>>,
    pub requests: Mutex<Vec<Value>>,
}

impl ScriptedModel {
    pub fn new(routes: &[&str], worker_replies: &[&str]) -> Self {
        Self {
            routes: Mutex::new(routes.iter().map(|route| route.to_string()).collect()),
            repeat_route: None,
            worker_replies: Mutex::new(
                worker_replies
                    .iter()
                    .map(|reply| json!({"role": "assistant", "content": reply}))
                    .collect(),
            ),
            requests: Mutex::default(),
        }
    }

    /// Router returns `route` forever.
    pub fn always_route(route: &str) -> Self {
        Self {
            repeat_route: Some(route.to_string()),
            ..Self::default()
        }
    }

    /// Queue a raw assistant message for the next worker call.
    pub fn with_worker_message(self, message: Value) -> Self {
        self.worker_replies.lock().unwrap().push_back(message);
        self
    }

    pub fn router_calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| is_router_request(request))
            .count()
    }

    pub fn worker_calls(&self) -> usize {
        let total = self.requests.lock().unwrap().len();
        total - self.router_calls()
    }
}

pub fn is_router_request(request: &Value) -> bool {
    request["tool_choice"]["function"]["name"] == "route"
}

pub fn route_message(next: &str) -> Value {
    json!({
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": format!("route_{}", next),
            "type": "function",
            "function": {
                "name": "route",
                "arguments": json!({"next": next}).to_string()
            }
        }]
    })
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat_completion(&self, body: &Value) -> Result<Value> {
        self.requests.lock().unwrap().push(body.clone());

        let message = if is_router_request(body) {
            let next = self
                .routes
                .lock()
                .unwrap()
                .pop_front()
                .or_else(|| self.repeat_route.clone())
                .ok_or_else(|| CrewError::Unknown("router script exhausted".to_string()))?;
            route_message(&next)
        } else {
            self.worker_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| json!({"role": "assistant", "content": "worker output"}))
        };

        Ok(json!({"choices": [{"index": 0, "message": message, "finish_reason": "stop"}]}))
    }
}
