//! CLI argument parsing via clap.

use clap::Parser;
use nanoagent::build_info;
use std::path::PathBuf;

/// Run one task with a model-driven shell agent.
#[derive(Debug, Parser)]
#[command(name = "nanoagent", version = Box::leak(build_info::cli_version_text().into_boxed_str()) as &'static str)]
pub struct Args {
    /// Task for the agent to accomplish.
    pub task: String,

    /// Path to config file (default: ./nanoagent.toml or
    /// ~/.config/nanoagent/nanoagent.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override the model id.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Override the API base URL.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Write the trajectory record to this exact path instead of the
    /// default `.nanoagent/trajectories/` store.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Accept every command without prompting (unattended runs).
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Project root commands run from (default: current directory).
    #[arg(long = "cwd")]
    pub cwd: Option<PathBuf>,

    /// Override the model-query turn budget.
    #[arg(long = "max-turns")]
    pub max_turns: Option<usize>,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}
