use super::decision::{RoutingDecision, WorkerRole};

/// Mermaid flowchart of the supervisor loop: every worker reports back to
/// the router, and the router fans out to each worker or to the end node.
pub fn mermaid() -> String {
    let mut lines = vec![
        "graph TD".to_string(),
        "    __start__([start]) --> router".to_string(),
    ];

    for role in WorkerRole::ALL {
        lines.push(format!(
            "    router -. {} .-> {}",
            RoutingDecision::from(role),
            role.name()
        ));
    }
    lines.push(format!(
        "    router -. {} .-> __end__([end])",
        RoutingDecision::Finish
    ));

    for role in WorkerRole::ALL {
        lines.push(format!("    {} --> router", role.name()));
    }

    lines.join("\n")
}
