//! CLI entry point for nanoagent.

mod cli;

use clap::Parser;
use nanoagent::agent::{run_task, Agent};
use nanoagent::config::{ensure_default_global_config, load_config};
use nanoagent::render;
use nanoagent::trajectory::TrajectoryRecorder;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let args = cli::Args::parse();

    match ensure_default_global_config() {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "seeded global config"),
        Ok(None) => {}
        Err(e) => eprintln!("warning: failed to initialize global config: {e}"),
    }

    // Load config.
    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    // Apply CLI overrides.
    if let Some(model) = &args.model {
        config.model.model = model.clone();
    }
    if let Some(url) = &args.base_url {
        config.model.base_url = url.clone();
    }
    if let Some(cwd) = &args.cwd {
        config.agent.project_root = Some(cwd.clone());
    }
    if let Some(max_turns) = args.max_turns {
        if max_turns == 0 {
            eprintln!("error: --max-turns must be at least 1");
            std::process::exit(1);
        }
        config.agent.max_turns = max_turns;
    }
    if args.yes {
        config.agent.auto_accept = true;
    }
    if args.no_color {
        config.display.color = false;
    }

    if config.model.api_key.trim().is_empty() {
        eprintln!(
            "warning: no API key configured; set NANOAGENT_API_KEY or model.api_key_env in nanoagent.toml"
        );
    }

    let recorder = match &args.output {
        Some(path) => TrajectoryRecorder::to_path(path),
        None => match TrajectoryRecorder::open_default() {
            Ok(recorder) => recorder,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
    };

    let color = config.display.color;
    let mut agent = Agent::new(config);

    // Ctrl-C flips the cancellation signal; the loop unwinds to Cancelled
    // without issuing further port calls.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    agent.set_cancellation_receiver(Some(cancel_rx));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = run_task(&mut agent, &args.task, &recorder).await;
    render::print_outcome(color, &outcome);
    std::process::exit(if outcome.exit_status.is_success() { 0 } else { 1 });
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("NANOAGENT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
