//! Content team demo with a scripted model, no API key needed.
//!
//! The router sends the request to the researcher, the editor and the
//! publisher in turn, then finishes. Run with:
//!
//! ```sh
//! cargo run --example content_team
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Arc, sync::Mutex};
use tiny_crew_rs::{Author, ChatModel, CrewConfig, CrewError, Orchestrator, Result, Turn};
use tokio::sync::mpsc;

/// Plays the router and the three workers from fixed scripts
#[derive(Debug)]
struct ScriptedTeam {
    routes: Mutex<VecDeque<&'static str>>,
    answers: Mutex<VecDeque<&'static str>>,
}

impl ScriptedTeam {
    fn new() -> Self {
        Self {
            routes: Mutex::new(VecDeque::from(["researcher", "editor", "publisher", "finish"])),
            answers: Mutex::new(VecDeque::from([
                "Nanoparticles under 100 nm can carry drugs straight to tumour cells; \
                 trials report fewer side effects than systemic chemotherapy.",
                "Tiny carriers, targeted treatment: nanoparticles deliver cancer drugs \
                 directly to tumours, and early trials show gentler side effects.",
                "Nanoparticles are shrinking cancer treatment side effects by delivering \
                 drugs straight to tumours. #nanotech #health",
            ])),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedTeam {
    async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let message = if body["tool_choice"]["function"]["name"] == "route" {
            let next = self
                .routes
                .lock()
                .map_err(|_| CrewError::Unknown("route script poisoned".to_string()))?
                .pop_front()
                .unwrap_or("finish");
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": format!("route_{next}"),
                    "type": "function",
                    "function": {"name": "route", "arguments": json!({"next": next}).to_string()}
                }]
            })
        } else {
            let answer = self
                .answers
                .lock()
                .map_err(|_| CrewError::Unknown("answer script poisoned".to_string()))?
                .pop_front()
                .unwrap_or("Nothing more to add.");
            json!({"role": "assistant", "content": answer})
        };

        Ok(json!({"choices": [{"index": 0, "message": message, "finish_reason": "stop"}]}))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("🤖 Content Team Demo");
    println!("====================");

    let config = CrewConfig::new("demo-key");
    let orchestrator = Orchestrator::with_model_client(Arc::new(ScriptedTeam::new()), &config);

    let (sender, mut receiver) = mpsc::unbounded_channel::<Turn>();
    let printer = async move {
        while let Some(turn) = receiver.recv().await {
            if let Author::Worker(role) = turn.author {
                println!("\n{} says:\n{}", role, turn.content);
            }
        }
    };

    let request = "Research nanoparticles in cancer treatment and write a short post about it";
    let (outcome, _) = tokio::join!(orchestrator.run_streaming(request, sender), printer);
    let report = outcome?;

    println!(
        "\n✅ Deliverable:\n{}",
        report.deliverable.as_deref().unwrap_or("(none)")
    );
    println!("\n{}", report.replay());
    Ok(())
}
