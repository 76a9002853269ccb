//! File-backed configuration schema.
//!
//! TOML layout:
//!
//! ```toml
//! [agents.pm]
//! endpoint = "http://localhost:1234/v1/chat/completions"
//! model = "local-model"
//! system_prompt = "You are the project manager."
//!
//! [agents.a]
//! endpoint = "http://localhost:1234/v1/chat/completions"
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//!
//! [carry]
//! mode = "truncate"
//! max_chars = 2000
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! auth_token_env = "TASKFORCE_TOKEN"
//!
//! [log]
//! transcript_path = "logs/transcript.jsonl"
//! ```

use crate::http::client::AgentEndpoint;
use crate::http::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use taskforce_application::CarryMode;
use taskforce_application::config::DEFAULT_CARRY_CHARS;
use taskforce_domain::AgentIdentity;
use thiserror::Error;

/// Default per-attempt request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default chat-completions endpoint (LM Studio's local server).
const DEFAULT_ENDPOINT: &str = "http://localhost:1234/v1/chat/completions";
/// Default model name for local backends.
const DEFAULT_MODEL: &str = "local-model";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Auth required for agent {agent} but env variable {env} is undefined")]
    MissingAuthToken { agent: AgentIdentity, env: String },

    #[error("Unknown carry mode: {0} (expected full, truncate or off)")]
    UnknownCarryMode(String),
}

/// Root configuration file schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub agents: FileAgentsConfig,
    pub retry: RetryPolicy,
    pub carry: FileCarryConfig,
    pub server: FileServerConfig,
    pub log: FileLogConfig,
}

/// Per-agent configuration tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    pub pm: FileAgentConfig,
    pub a: FileAgentConfig,
    pub b: FileAgentConfig,
    pub c: FileAgentConfig,
}

/// Backend settings for a single agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Chat-completions URL for this agent's backend.
    pub endpoint: String,
    /// Model name sent in request bodies.
    pub model: String,
    /// System prompt seeded into the agent's session on first use.
    pub system_prompt: Option<String>,
    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,
    /// Env variable holding the bearer token this backend requires.
    /// Unset means the backend needs no authentication.
    pub auth_token_env: Option<String>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth_token_env: None,
        }
    }
}

impl FileAgentConfig {
    fn to_endpoint(&self, agent: AgentIdentity) -> Result<AgentEndpoint, ConfigError> {
        let bearer_token = match &self.auth_token_env {
            Some(env) => Some(std::env::var(env).map_err(|_| ConfigError::MissingAuthToken {
                agent,
                env: env.clone(),
            })?),
            None => None,
        };
        Ok(AgentEndpoint {
            url: self.endpoint.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            bearer_token,
        })
    }
}

/// Carry-forward policy section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCarryConfig {
    /// One of "full", "truncate", "off".
    pub mode: String,
    /// Character cap for truncate mode.
    pub max_chars: usize,
}

impl Default for FileCarryConfig {
    fn default() -> Self {
        Self {
            mode: "truncate".to_string(),
            max_chars: DEFAULT_CARRY_CHARS,
        }
    }
}

impl FileCarryConfig {
    pub fn carry_mode(&self) -> Result<CarryMode, ConfigError> {
        match self.mode.as_str() {
            "full" => Ok(CarryMode::Full),
            "truncate" => Ok(CarryMode::Truncate {
                max_chars: self.max_chars,
            }),
            "off" => Ok(CarryMode::Off),
            other => Err(ConfigError::UnknownCarryMode(other.to_string())),
        }
    }
}

/// Inbound HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub host: String,
    pub port: u16,
    /// Env variable holding the expected inbound bearer token. Unset
    /// disables inbound authentication.
    pub auth_token_env: Option<String>,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            auth_token_env: None,
        }
    }
}

/// Logging section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Path of the append-only JSONL transcript. Unset disables the sink.
    pub transcript_path: Option<PathBuf>,
}

impl FileConfig {
    fn agent_entries(&self) -> [(AgentIdentity, &FileAgentConfig); 4] {
        [
            (AgentIdentity::Pm, &self.agents.pm),
            (AgentIdentity::WorkerA, &self.agents.a),
            (AgentIdentity::WorkerB, &self.agents.b),
            (AgentIdentity::WorkerC, &self.agents.c),
        ]
    }

    /// Resolve the per-agent endpoint table, reading auth tokens from the
    /// environment where required.
    pub fn endpoint_table(&self) -> Result<HashMap<AgentIdentity, AgentEndpoint>, ConfigError> {
        let mut table = HashMap::new();
        for (identity, agent) in self.agent_entries() {
            table.insert(identity, agent.to_endpoint(identity)?);
        }
        Ok(table)
    }

    /// Per-agent system prompts for seeding sessions.
    pub fn system_prompts(&self) -> HashMap<AgentIdentity, String> {
        self.agent_entries()
            .into_iter()
            .filter_map(|(identity, agent)| {
                agent
                    .system_prompt
                    .as_ref()
                    .map(|prompt| (identity, prompt.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_agents() {
        let config = FileConfig::default();
        let table = config.endpoint_table().unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table[&AgentIdentity::Pm].url, DEFAULT_ENDPOINT);
        assert_eq!(
            table[&AgentIdentity::WorkerC].timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[agents.pm]
endpoint = "http://pm-host:9000/v1/chat/completions"
model = "pm-model"
system_prompt = "You are the project manager."

[agents.b]
timeout_secs = 30

[retry]
max_attempts = 5

[carry]
mode = "full"

[server]
port = 9999
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.pm.model, "pm-model");
        assert_eq!(config.agents.b.timeout_secs, 30);
        // Unspecified agents keep defaults.
        assert_eq!(config.agents.a.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.carry.carry_mode().unwrap(), CarryMode::Full);
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_system_prompts_only_for_configured_agents() {
        let mut config = FileConfig::default();
        config.agents.pm.system_prompt = Some("PM prompt".to_string());
        let prompts = config.system_prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[&AgentIdentity::Pm], "PM prompt");
    }

    #[test]
    fn test_missing_auth_env_is_an_error() {
        let mut config = FileConfig::default();
        config.agents.a.auth_token_env = Some("TASKFORCE_TEST_UNSET_TOKEN".to_string());
        let result = config.endpoint_table();
        assert!(matches!(
            result,
            Err(ConfigError::MissingAuthToken { agent, .. }) if agent == AgentIdentity::WorkerA
        ));
    }

    #[test]
    fn test_unknown_carry_mode_rejected() {
        let carry = FileCarryConfig {
            mode: "summarize".to_string(),
            max_chars: 100,
        };
        assert!(matches!(
            carry.carry_mode(),
            Err(ConfigError::UnknownCarryMode(_))
        ));
    }
}
