//! Built-in configuration defaults and the seeded global config template.

pub(super) const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub(super) const DEFAULT_MODEL_ID: &str = "gpt-5-mini";
pub(super) const DEFAULT_MAX_TURNS: usize = 30;
pub(super) const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 32 * 1024;
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;

/// Commented starter config written to `~/.config/nanoagent/nanoagent.toml`
/// on first run.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = r#"# nanoagent configuration.
#
# Precedence (highest wins): NANOAGENT_* environment variables, --config,
# ./nanoagent.toml, this file, built-in defaults.

[model]
base_url = "https://api.openai.com/v1"
model = "gpt-5-mini"
# Read the API key from an environment variable instead of storing it here.
api_key_env = "OPENAI_API_KEY"
# Per-million-token prices used for the cost counter in trajectory records.
# prompt_price_per_mtok = 0.25
# completion_price_per_mtok = 2.0

[agent]
max_turns = 30
# auto_accept = false
# project_root = "/path/to/project"
# instructions = "Prefer ripgrep over grep."

[limits]
# output_limit_bytes = 32768
# api_timeout_secs = 120

[display]
color = true
"#;
