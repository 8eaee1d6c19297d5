//! Secret source trait

use async_trait::async_trait;
use secretquery_core::FetchError;
use std::fmt;

/// A fetched secret string
pub struct Secret {
    name: String,
    version_id: Option<String>,
    value: String,
}

impl Secret {
    pub fn new(name: impl Into<String>, version_id: Option<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_id,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// The secret payload
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("version_id", &self.version_id)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Anything that can look up a secret string by name
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn fetch(&self, secret_name: &str) -> Result<Secret, FetchError>;
}
