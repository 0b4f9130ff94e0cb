use crate::error::{CrewError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three workers the router can hand the conversation to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerRole {
    Researcher,
    Editor,
    Publisher,
}

impl WorkerRole {
    /// Roster in the order it is presented to the router.
    pub const ALL: [WorkerRole; 3] = [
        WorkerRole::Researcher,
        WorkerRole::Editor,
        WorkerRole::Publisher,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WorkerRole::Researcher => "researcher",
            WorkerRole::Editor => "editor",
            WorkerRole::Publisher => "publisher",
        }
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Next actor chosen by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingDecision {
    Finish,
    Researcher,
    Editor,
    Publisher,
}

impl RoutingDecision {
    pub const ALL: [RoutingDecision; 4] = [
        RoutingDecision::Finish,
        RoutingDecision::Researcher,
        RoutingDecision::Editor,
        RoutingDecision::Publisher,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoutingDecision::Finish => "finish",
            RoutingDecision::Researcher => "researcher",
            RoutingDecision::Editor => "editor",
            RoutingDecision::Publisher => "publisher",
        }
    }

    /// The worker this decision dispatches to, `None` for `finish`.
    pub fn worker(self) -> Option<WorkerRole> {
        match self {
            RoutingDecision::Finish => None,
            RoutingDecision::Researcher => Some(WorkerRole::Researcher),
            RoutingDecision::Editor => Some(WorkerRole::Editor),
            RoutingDecision::Publisher => Some(WorkerRole::Publisher),
        }
    }

    pub fn option_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|decision| decision.as_str()).collect()
    }
}

impl From<WorkerRole> for RoutingDecision {
    fn from(role: WorkerRole) -> Self {
        match role {
            WorkerRole::Researcher => RoutingDecision::Researcher,
            WorkerRole::Editor => RoutingDecision::Editor,
            WorkerRole::Publisher => RoutingDecision::Publisher,
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingDecision {
    type Err = CrewError;

    /// Exact match only. Anything else is a routing error, never a default.
    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|decision| decision.as_str() == value)
            .ok_or_else(|| {
                CrewError::Routing(format!(
                    "`{}` is not one of {:?}",
                    value,
                    Self::option_names()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_option() {
        for decision in RoutingDecision::ALL {
            assert_eq!(decision.as_str().parse::<RoutingDecision>().unwrap(), decision);
        }
    }

    #[test]
    fn test_unknown_decision_is_rejected() {
        let err = "unknown_worker".parse::<RoutingDecision>().unwrap_err();
        assert!(matches!(err, CrewError::Routing(_)));
        assert!("FINISH".parse::<RoutingDecision>().is_err());
        assert!("".parse::<RoutingDecision>().is_err());
    }

    #[test]
    fn test_decision_worker_mapping() {
        assert_eq!(RoutingDecision::Finish.worker(), None);
        for role in WorkerRole::ALL {
            assert_eq!(RoutingDecision::from(role).worker(), Some(role));
        }
    }
}
