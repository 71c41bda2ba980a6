//! CLI configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Root observer settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// The interactive user agent.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Config file used when neither the command line nor
/// `RHOAM_CONFIG_PATH` names one.
pub const DEFAULT_CONFIG_PATH: &str = "rhoam.toml";

/// Settings for the observer the chat session talks to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Observer identifier, shown as the room name.
    pub id: String,

    /// Path to the JSON rule file.
    pub rules_path: String,

    /// Overrides the rule file's unknown-rule policy when set.
    pub fail_open: Option<bool>,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            id: "root".to_string(),
            rules_path: "rules.json".to_string(),
            fail_open: None,
        }
    }
}

/// Identity of the interactive user agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: "USER_01".to_string(),
            name: "Human".to_string(),
        }
    }
}

/// Where diagnostics go. The chat transcript itself is always plain stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `"warn"` to hide per-message logs or
    /// `"rhoam_rules=debug,info"` to trace rule decisions.
    pub level: String,

    /// Emit one JSON object per log event instead of text lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read rhoam config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has a field of the wrong type.
    #[error("invalid rhoam config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Chooses the config file and reports where the choice came from.
///
/// A non-blank command-line argument wins over a non-blank
/// `RHOAM_CONFIG_PATH`; otherwise [`DEFAULT_CONFIG_PATH`] is used.
pub fn select_config_path(arg: Option<String>, env: Option<String>) -> (String, &'static str) {
    [(arg, "cli-arg"), (env, "env-var")]
        .into_iter()
        .find_map(|(path, source)| path.filter(|p| !p.trim().is_empty()).map(|p| (p, source)))
        .unwrap_or_else(|| (DEFAULT_CONFIG_PATH.to_string(), "default"))
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `RHOAM_OBSERVER_ID` overrides `observer.id`
/// - `RHOAM_RULES_PATH` overrides `observer.rules_path`
/// - `RHOAM_FAIL_OPEN` overrides `observer.fail_open` ("true"/"1" or "false"/"0")
/// - `RHOAM_AGENT_ID` overrides `agent.id`
/// - `RHOAM_AGENT_NAME` overrides `agent.name`
/// - `RHOAM_LOG_LEVEL` overrides `logging.level`
/// - `RHOAM_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path, "no config file, running with built-in defaults");
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_string(),
                source,
            })
        }
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Applies `RHOAM_*` overrides, reading variables through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(id) = lookup("RHOAM_OBSERVER_ID") {
        config.observer.id = id;
    }
    if let Some(path) = lookup("RHOAM_RULES_PATH") {
        config.observer.rules_path = path;
    }
    if let Some(fail_open) = lookup("RHOAM_FAIL_OPEN") {
        match fail_open.as_str() {
            "true" | "1" => config.observer.fail_open = Some(true),
            "false" | "0" => config.observer.fail_open = Some(false),
            other => tracing::warn!(value = other, "ignoring invalid RHOAM_FAIL_OPEN"),
        }
    }
    if let Some(id) = lookup("RHOAM_AGENT_ID") {
        config.agent.id = id;
    }
    if let Some(name) = lookup("RHOAM_AGENT_NAME") {
        config.agent.name = name;
    }
    if let Some(level) = lookup("RHOAM_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("RHOAM_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = read_config_file(None).expect("defaults should load");
        assert_eq!(config.observer.id, "root");
        assert_eq!(config.observer.rules_path, "rules.json");
        assert_eq!(config.observer.fail_open, None);
        assert_eq!(config.agent.id, "USER_01");
        assert_eq!(config.agent.name, "Human");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn nonexistent_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = read_config_file(path.to_str()).expect("missing file is not an error");
        assert_eq!(config.observer.id, "root");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[observer]\nid = \"lobby\"\nfail_open = false\n\n[logging]\njson = true"
        )
        .unwrap();

        let config = read_config_file(file.path().to_str()).expect("config should parse");
        assert_eq!(config.observer.id, "lobby");
        assert_eq!(config.observer.rules_path, "rules.json");
        assert_eq!(config.observer.fail_open, Some(false));
        assert_eq!(config.agent.id, "USER_01");
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[observer\nid = ").unwrap();
        let err = read_config_file(file.path().to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid rhoam config"));
    }

    #[test]
    fn config_path_prefers_argument_then_environment() {
        assert_eq!(
            select_config_path(Some("cli.toml".into()), Some("env.toml".into())),
            ("cli.toml".to_string(), "cli-arg")
        );
        assert_eq!(
            select_config_path(Some("  ".into()), Some("env.toml".into())),
            ("env.toml".to_string(), "env-var")
        );
        assert_eq!(
            select_config_path(None, Some("".into())),
            (DEFAULT_CONFIG_PATH.to_string(), "default")
        );
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("RHOAM_OBSERVER_ID", "lobby"),
            ("RHOAM_RULES_PATH", "/etc/rhoam/rules.json"),
            ("RHOAM_FAIL_OPEN", "0"),
            ("RHOAM_AGENT_ID", "USER_02"),
            ("RHOAM_AGENT_NAME", "Guest"),
            ("RHOAM_LOG_LEVEL", "debug"),
            ("RHOAM_LOG_JSON", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.observer.id, "lobby");
        assert_eq!(config.observer.rules_path, "/etc/rhoam/rules.json");
        assert_eq!(config.observer.fail_open, Some(false));
        assert_eq!(config.agent.id, "USER_02");
        assert_eq!(config.agent.name, "Guest");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn invalid_fail_open_override_is_ignored() {
        let mut config = Config::default();
        config.observer.fail_open = Some(true);
        apply_env_overrides(&mut config, |key| {
            (key == "RHOAM_FAIL_OPEN").then(|| "maybe".to_string())
        });
        assert_eq!(config.observer.fail_open, Some(true));
    }
}
