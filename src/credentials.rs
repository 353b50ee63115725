//! Credential capability
//!
//! Resolves a credential identifier to an API key/secret pair. Resolution
//! happens once per batch, before any item is processed.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::CredentialError;

/// Server-side API key and secret
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    /// Validate that both fields are present and non-empty
    pub fn new(
        id: &str,
        api_key: Option<String>,
        api_secret: Option<String>,
    ) -> Result<Self, CredentialError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CredentialError::MissingField {
                id: id.to_string(),
                field: "apiKey",
            })?;
        let api_secret = api_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CredentialError::MissingField {
                id: id.to_string(),
                field: "apiSecret",
            })?;
        Ok(Self {
            api_key,
            api_secret,
        })
    }
}

// The secret must never reach logs
impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self, id: &str) -> Result<ApiCredentials, CredentialError>;
}

/// Reads `<ID>_API_KEY` and `<ID>_API_SECRET` from the process environment
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    pub fn new() -> Self {
        Self
    }

    fn var_prefix(id: &str) -> String {
        id.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn resolve(&self, id: &str) -> Result<ApiCredentials, CredentialError> {
        let prefix = Self::var_prefix(id);
        let api_key = std::env::var(format!("{prefix}_API_KEY")).ok();
        let api_secret = std::env::var(format!("{prefix}_API_SECRET")).ok();
        ApiCredentials::new(id, api_key, api_secret)
    }
}

/// In-memory credential table
#[derive(Debug, Default, Clone)]
pub struct StaticCredentialProvider {
    entries: HashMap<String, (Option<String>, Option<String>)>,
}

impl StaticCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, api_key: &str, api_secret: &str) -> Self {
        self.entries.insert(
            id.to_string(),
            (Some(api_key.to_string()), Some(api_secret.to_string())),
        );
        self
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn resolve(&self, id: &str) -> Result<ApiCredentials, CredentialError> {
        let (api_key, api_secret) =
            self.entries
                .get(id)
                .cloned()
                .ok_or_else(|| CredentialError::Lookup {
                    id: id.to_string(),
                    message: "no such credential".to_string(),
                })?;
        ApiCredentials::new(id, api_key, api_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_rejected() {
        let err = ApiCredentials::new("chat", None, Some("s".into())).unwrap_err();
        assert_eq!(
            err,
            CredentialError::MissingField {
                id: "chat".into(),
                field: "apiKey"
            }
        );

        let err = ApiCredentials::new("chat", Some("k".into()), Some(String::new())).unwrap_err();
        assert!(matches!(
            err,
            CredentialError::MissingField {
                field: "apiSecret",
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ApiCredentials::new("chat", Some("key".into()), Some("hunter2".into())).unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("key"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(EnvCredentialProvider::var_prefix("stream_chat"), "STREAM_CHAT");
        assert_eq!(EnvCredentialProvider::var_prefix("stream-chat.prod"), "STREAM_CHAT_PROD");
    }

    #[tokio::test]
    async fn test_env_provider_reads_prefixed_vars() {
        // ids unique to this test; the process environment is shared
        std::env::set_var("CHAT_DISPATCH_ENV_TEST_OK_API_KEY", "env-key");
        std::env::set_var("CHAT_DISPATCH_ENV_TEST_OK_API_SECRET", "env-secret");
        let creds = EnvCredentialProvider::new()
            .resolve("chat-dispatch.env-test-ok")
            .await
            .unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.api_secret, "env-secret");

        std::env::set_var("CHAT_DISPATCH_ENV_TEST_EMPTY_API_KEY", "env-key");
        std::env::set_var("CHAT_DISPATCH_ENV_TEST_EMPTY_API_SECRET", "");
        let err = EnvCredentialProvider::new()
            .resolve("chat_dispatch_env_test_empty")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CredentialError::MissingField {
                id: "chat_dispatch_env_test_empty".into(),
                field: "apiSecret"
            }
        );

        let err = EnvCredentialProvider::new()
            .resolve("chat_dispatch_env_test_unset")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CredentialError::MissingField {
                field: "apiKey",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticCredentialProvider::new().with("chat", "k", "s");
        let creds = provider.resolve("chat").await.unwrap();
        assert_eq!(creds.api_key, "k");

        let err = provider.resolve("other").await.unwrap_err();
        assert!(matches!(err, CredentialError::Lookup { .. }));
    }
}
