//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`NANOAGENT_API_KEY`, `NANOAGENT_BASE_URL`,
//!    `NANOAGENT_MODEL`)
//! 2. TOML file specified via the --config CLI flag
//! 3. ./nanoagent.toml in the current directory
//! 4. $XDG_CONFIG_HOME/nanoagent/nanoagent.toml
//! 5. Built-in defaults

use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

mod defaults;
mod types;

use defaults::DEFAULT_CONFIG_TEMPLATE;
pub use types::{AgentConfig, Config, DisplayConfig, LimitsConfig, ModelProfileConfig};

/// Local config file name probed in the current directory.
const LOCAL_CONFIG_FILE: &str = "nanoagent.toml";
/// Directory under the platform config root that holds the global file.
const GLOBAL_CONFIG_DIR: &str = "nanoagent";

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from the --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

/// Loader with injected filesystem/environment closures for deterministic
/// tests.
fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let mut config = match read_config_text(path_override, &read_file, &config_root)? {
        Some(text) => toml::from_str::<Config>(&text)?,
        None => Config::default(),
    };

    resolve_api_key_env(&mut config, &env_lookup)?;
    apply_env_overrides(&mut config, &env_lookup);
    validate(&config)?;
    Ok(config)
}

/// Read the highest-precedence config file text, if any file exists.
fn read_config_text<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<Option<String>, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    if let Some(path) = path_override {
        // An explicit --config path must exist; failing silently here would
        // run with defaults the operator did not ask for.
        return read_file(Path::new(path)).map(Some).map_err(ConfigError::Io);
    }

    match read_file(Path::new(LOCAL_CONFIG_FILE)) {
        Ok(text) => return Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(ConfigError::Io(e)),
    }

    if let Some(root) = config_root() {
        let global = root.join(GLOBAL_CONFIG_DIR).join(LOCAL_CONFIG_FILE);
        match read_file(&global) {
            Ok(text) => return Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ConfigError::Io(e)),
        }
    }

    Ok(None)
}

/// Fill an empty `api_key` from the configured `api_key_env` variable.
fn resolve_api_key_env<FEnv>(config: &mut Config, env_lookup: &FEnv) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if !config.model.api_key.trim().is_empty() {
        return Ok(());
    }
    let Some(var) = config.model.api_key_env.as_deref() else {
        return Ok(());
    };
    if var.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "model.api_key_env cannot be empty".to_string(),
        ));
    }
    if let Some(value) = env_lookup(var).filter(|v| !v.trim().is_empty()) {
        config.model.api_key = value.trim().to_string();
    }
    Ok(())
}

/// Apply `NANOAGENT_*` runtime overrides, which beat every file source.
fn apply_env_overrides<FEnv>(config: &mut Config, env_lookup: &FEnv)
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(key) = non_empty(env_lookup("NANOAGENT_API_KEY")) {
        config.model.api_key = key;
    }
    if let Some(url) = non_empty(env_lookup("NANOAGENT_BASE_URL")) {
        config.model.base_url = url;
    }
    if let Some(model) = non_empty(env_lookup("NANOAGENT_MODEL")) {
        config.model.model = model;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.agent.max_turns == 0 {
        return Err(ConfigError::Invalid(
            "agent.max_turns must be at least 1".to_string(),
        ));
    }
    if config.limits.output_limit_bytes == 0 {
        return Err(ConfigError::Invalid(
            "limits.output_limit_bytes must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Platform config root (`~/.config` on Linux).
fn config_root_dir() -> Option<PathBuf> {
    dirs::config_dir()
}

/// Seed `~/.config/nanoagent/nanoagent.toml` with a commented template when
/// it does not exist yet. Returns the path when a file was created.
pub fn ensure_default_global_config() -> Result<Option<PathBuf>, ConfigError> {
    let Some(root) = config_root_dir() else {
        return Ok(None);
    };
    let dir = root.join(GLOBAL_CONFIG_DIR);
    let path = dir.join(LOCAL_CONFIG_FILE);
    if path.exists() {
        return Ok(None);
    }
    fs::create_dir_all(&dir)?;
    fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
    Ok(Some(path))
}
