//! Execution configuration
//!
//! Resolved once per batch and passed into the executor. Sources, lowest
//! precedence first: built-in defaults, an optional YAML file, then
//! `CHAT_DISPATCH_*` environment variables.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_CREDENTIAL_ID: &str = "stream_chat";

pub const ENV_CONTINUE_ON_FAIL: &str = "CHAT_DISPATCH_CONTINUE_ON_FAIL";
pub const ENV_CALL_TIMEOUT_SECS: &str = "CHAT_DISPATCH_CALL_TIMEOUT_SECS";
pub const ENV_CREDENTIAL_ID: &str = "CHAT_DISPATCH_CREDENTIAL_ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Isolate per-item failures instead of aborting the batch
    pub continue_on_fail: bool,
    /// Upper bound on a single handler invocation
    pub call_timeout: Option<Duration>,
    /// Credential identifier handed to the credential provider
    pub credential_id: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            continue_on_fail: false,
            call_timeout: None,
            credential_id: DEFAULT_CREDENTIAL_ID.to_string(),
        }
    }
}

/// On-disk shape; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    continue_on_fail: Option<bool>,
    call_timeout_secs: Option<u64>,
    credential_id: Option<String>,
}

impl ExecutionConfig {
    pub fn continue_on_fail(mut self, value: bool) -> Self {
        self.continue_on_fail = value;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn with_credential_id(mut self, id: impl Into<String>) -> Self {
        self.credential_id = id.into();
        self
    }

    /// Parse YAML on top of the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        let mut config = Self::default();
        if let Some(value) = file.continue_on_fail {
            config.continue_on_fail = value;
        }
        if let Some(secs) = file.call_timeout_secs {
            config.call_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(id) = file.credential_id {
            config.credential_id = id;
        }
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading execution config from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply `CHAT_DISPATCH_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CONTINUE_ON_FAIL) {
            self.continue_on_fail = parse_flag(&raw)
                .ok_or_else(|| anyhow!("{ENV_CONTINUE_ON_FAIL} must be true/false/1/0, got '{raw}'"))?;
        }
        if let Some(raw) = lookup(ENV_CALL_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CALL_TIMEOUT_SECS} must be whole seconds"))?;
            self.call_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(id) = lookup(ENV_CREDENTIAL_ID).filter(|id| !id.is_empty()) {
            self.credential_id = id;
        }
        Ok(self)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
