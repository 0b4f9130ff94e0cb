use super::decision::{RoutingDecision, WorkerRole};

/// Character budget for the publisher's post.
pub const PUBLISH_CHAR_LIMIT: usize = 280;

pub fn roster() -> String {
    WorkerRole::ALL
        .iter()
        .map(|role| role.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Opening system message for the router.
pub fn router_system_prompt() -> String {
    format!(
        "You are the editor-in-chief supervising these workers: {}. \
         Based on the user's request, decide which worker should act next. \
         Each worker performs one task and reports back its results. \
         When the request has been fully handled, answer finish.",
        roster()
    )
}

/// Closing system message that asks for the decision.
pub fn router_decision_prompt() -> String {
    format!(
        "Given the conversation above, who should act next? Or should we finish? \
         Select one of: {:?}",
        RoutingDecision::option_names()
    )
}

/// System prompt for a worker's agent.
pub fn worker_system_prompt(role: WorkerRole) -> String {
    match role {
        WorkerRole::Researcher => "You are an online researcher. Use the web_search tool to find \
             current, relevant sources on the requested topic and fetch_page to read the most \
             promising ones. Report your findings as a structured draft with the key facts and \
             the URLs you relied on. If a tool fails, say which sources could not be checked."
            .to_string(),
        WorkerRole::Editor => "You are a blog editor. Turn the research draft in the \
             conversation into a polished article: a clear headline, short sections with \
             headers, an engaging introduction and a conclusion. Keep every claim grounded in \
             the research; use the tools only to verify facts."
            .to_string(),
        WorkerRole::Publisher => format!(
            "You are a social media publisher. Condense the article in the conversation into a \
             single post of at most {} characters, with one or two relevant hashtags. Reply with \
             the post text only.",
            PUBLISH_CHAR_LIMIT
        ),
    }
}

/// Sent when a worker's model returns neither tool calls nor text.
pub fn empty_answer_reminder() -> &'static str {
    "Reminder: reply with your final answer as plain text, or call one of the available tools."
}
