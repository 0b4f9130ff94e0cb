use super::turn::Turn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Append-only conversation shared by the router and the workers.
///
/// Insertion order is the model's only memory, so turns are never edited,
/// reordered or removed once pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageLog {
    turns: Vec<Turn>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a log from the caller's request.
    pub fn with_request(request: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.push(Turn::user(request));
        log
    }

    pub fn push(&mut self, turn: Turn) {
        info!(target: "tinycrew::log", "{}", turn.describe());
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Most recent successful worker answer.
    pub fn last_worker_turn(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.is_worker() && !turn.is_error)
    }

    pub fn count_by<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Turn) -> bool,
    {
        self.turns.iter().filter(|turn| predicate(turn)).count()
    }

    /// Render every turn in order as chat-completion messages.
    pub fn as_messages(&self) -> Vec<Value> {
        self.turns.iter().flat_map(Turn::to_messages).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decision::WorkerRole, turn::Author};

    #[test]
    fn test_log_starts_with_request() {
        let log = MessageLog::with_request("research topic X");
        assert_eq!(log.len(), 1);
        assert_eq!(log.turns()[0].author, Author::User);
        assert!(log.last_worker_turn().is_none());
    }

    #[test]
    fn test_last_worker_turn_skips_failures() {
        let mut log = MessageLog::with_request("task");
        log.push(Turn::worker(WorkerRole::Researcher, "findings"));
        log.push(Turn::worker_failure(WorkerRole::Editor, "gave up"));

        let last = log.last_worker_turn().unwrap();
        assert_eq!(last.content, "findings");
        assert_eq!(log.count_by(|turn| turn.is_worker()), 2);
    }

    #[test]
    fn test_as_messages_preserves_order() {
        let mut log = MessageLog::with_request("first");
        log.push(Turn::worker(WorkerRole::Researcher, "second"));

        let messages = log.as_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "first");
        assert_eq!(messages[1]["content"], "second");
    }
}
