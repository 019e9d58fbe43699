//! Environment variable overrides applied on top of file layers.

use crate::{ConfigError, MnemoConfig};
use log::debug;

/// Overrides the database path.
pub const ENV_DB_PATH: &str = "MNEMO_DB_PATH";
/// Enables or disables embeddings (`1/true/on` or `0/false/off`).
pub const ENV_EMBEDDINGS: &str = "MNEMO_EMBEDDINGS";

impl MnemoConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, so callers can test without
    /// touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            debug!("applying env override ({ENV_DB_PATH}={path})");
            self.memory.path = path;
        }
        if let Some(raw) = lookup(ENV_EMBEDDINGS) {
            let enabled = parse_flag(&raw).ok_or_else(|| ConfigError::InvalidField {
                path: format!("env:{ENV_EMBEDDINGS}"),
                message: format!("expected a boolean flag, got {raw:?}"),
            })?;
            debug!("applying env override ({ENV_EMBEDDINGS}={enabled})");
            self.embedding.enabled = enabled;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{ENV_DB_PATH, ENV_EMBEDDINGS};
    use crate::MnemoConfig;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn overrides_path_and_embedding_toggle() {
        let mut config = MnemoConfig::default();
        config
            .apply_env_overrides(lookup(&[
                (ENV_DB_PATH, "/data/agent.db"),
                (ENV_EMBEDDINGS, "off"),
            ]))
            .expect("apply");
        assert_eq!(config.memory.path, "/data/agent.db");
        assert!(!config.embedding.enabled);
    }

    #[test]
    fn blank_path_is_ignored() {
        let mut config = MnemoConfig::default();
        config
            .apply_env_overrides(lookup(&[(ENV_DB_PATH, "  ")]))
            .expect("apply");
        assert_eq!(config.memory.path, ".mnemo/memory.db");
    }

    #[test]
    fn rejects_unparseable_flag() {
        let mut config = MnemoConfig::default();
        let err = config
            .apply_env_overrides(lookup(&[(ENV_EMBEDDINGS, "maybe")]))
            .unwrap_err();
        assert!(format!("{err}").contains(ENV_EMBEDDINGS));
    }
}
