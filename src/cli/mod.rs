use crate::{
    config::CrewConfig,
    core::{graph, turn::Author},
    Orchestrator, Turn,
};
use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

fn command() -> Command {
    Command::new("tiny-crew")
        .version("0.1.0")
        .about("Route a request between researcher, editor and publisher agents")
        .arg(
            Arg::new("prompt")
                .help("The request to hand to the crew")
                .required_unless_present("graph")
                .index(1),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model used by the router and the workers (or set ORCHESTRATOR_MODEL)"),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("API key for the completion service (or set OPENAI_API_KEY)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("Completion service base URL (or set ORCHESTRATOR_BASE_URL / OPENAI_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Timeout for each model HTTP attempt in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("120"),
        )
        .arg(
            Arg::new("max-steps")
                .short('s')
                .long("max-steps")
                .value_name("COUNT")
                .help("Router invocations allowed before the run is aborted (or set CREW_MAX_STEPS)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-tool-calls")
                .long("max-tool-calls")
                .value_name("COUNT")
                .help("Tool invocations a worker may make per turn")
                .value_parser(clap::value_parser!(usize))
                .default_value("8"),
        )
        .arg(
            Arg::new("reroute-on-worker-failure")
                .long("reroute-on-worker-failure")
                .help("Record failed worker turns and keep routing instead of aborting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("graph")
                .long("graph")
                .help("Print the supervisor graph as Mermaid and exit")
                .action(ArgAction::SetTrue),
        )
}

/// Flags win over the environment; `lookup` reads environment variables.
fn resolve_config<F>(matches: &ArgMatches, lookup: F) -> anyhow::Result<CrewConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = matches.get_one::<String>("api-key").cloned();
    let missing_key = api_key.is_none();
    let mut config = CrewConfig::from_lookup(api_key, lookup).map_err(|err| {
        if missing_key {
            anyhow!("{err}. Set OPENAI_API_KEY or pass --api-key")
        } else {
            err.into()
        }
    })?;

    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model.clone());
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config = config.with_model_timeout(Duration::from_secs(*timeout));
    }
    if let Some(max_steps) = matches.get_one::<usize>("max-steps") {
        config = config.with_max_steps(*max_steps);
    }
    if let Some(max_tool_calls) = matches.get_one::<usize>("max-tool-calls") {
        config = config.with_max_tool_calls(*max_tool_calls);
    }

    Ok(config.with_reroute_on_worker_failure(matches.get_flag("reroute-on-worker-failure")))
}

/// CLI entry point for the tiny-crew binary
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = command().get_matches();

    if matches.get_flag("graph") {
        println!("{}", graph::mermaid());
        return Ok(());
    }

    let prompt = matches
        .get_one::<String>("prompt")
        .cloned()
        .ok_or_else(|| anyhow!("A prompt is required"))?;
    let config = resolve_config(&matches, |name| std::env::var(name).ok())?;

    info!("Running crew with prompt: {}", prompt);
    info!("Using model: {}", config.model);
    info!("Base URL: {}", config.base_url);

    let orchestrator = Orchestrator::from_config(&config)?;
    let (sender, mut receiver) = mpsc::unbounded_channel::<Turn>();

    let printer = async move {
        let mut step = 0;
        while let Some(turn) = receiver.recv().await {
            if let Author::Worker(role) = turn.author {
                step += 1;
                println!("\nStep {}: {} says:\n{}", step, role, turn.content);
            }
        }
    };

    let (outcome, _) = tokio::join!(orchestrator.run_streaming(prompt, sender), printer);

    match outcome {
        Ok(report) => {
            println!(
                "\nDeliverable:\n{}",
                report.deliverable.as_deref().unwrap_or("(none)")
            );
            println!("\n{}", report.replay());
            info!("Crew run completed successfully");
            Ok(())
        }
        Err(failure) => {
            error!("Crew run failed: {}", failure);
            println!("\n{}", failure.partial_report().replay());
            Err(failure.into())
        }
    }
}
