//! Secrets Manager in-memory storage

use base64::Engine;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::scope::{AccountRegionKey, StateStore};

const AWSCURRENT: &str = "AWSCURRENT";
const AWSPREVIOUS: &str = "AWSPREVIOUS";

/// A secret with its versions
#[derive(Debug, Clone)]
pub struct StoredSecret {
    /// Secret ARN
    pub arn: String,
    /// Secret name
    pub name: String,
    pub description: Option<String>,
    /// KMS Key ID (recorded, never used)
    pub kms_key_id: Option<String>,
    /// Secret versions (version_id -> SecretVersion)
    pub versions: HashMap<String, SecretVersion>,
    /// Current version ID (AWSCURRENT)
    pub current_version_id: Option<String>,
    /// Previous version ID (AWSPREVIOUS)
    pub previous_version_id: Option<String>,
    pub created_date: DateTime<Utc>,
    pub last_changed_date: DateTime<Utc>,
    pub last_accessed_date: Option<DateTime<Utc>>,
    /// Set once the secret is scheduled for deletion
    pub deleted_date: Option<DateTime<Utc>>,
    pub tags: HashMap<String, String>,
}

/// A version of a secret
#[derive(Debug, Clone)]
pub struct SecretVersion {
    pub version_id: String,
    pub secret_string: Option<String>,
    /// Binary payload, base64 encoded
    pub secret_binary: Option<String>,
    pub created_date: DateTime<Utc>,
    /// Version stages (e.g., AWSCURRENT, AWSPREVIOUS)
    pub version_stages: Vec<String>,
}

#[derive(Debug, Default)]
struct RegionSecrets {
    /// Secrets indexed by name
    secrets: HashMap<String, StoredSecret>,
}

impl RegionSecrets {
    /// Resolve a secret id (name or ARN) to the secret's name
    fn resolve(&self, secret_id: &str) -> Option<String> {
        if self.secrets.contains_key(secret_id) {
            return Some(secret_id.to_string());
        }
        self.secrets
            .values()
            .find(|s| s.arn == secret_id)
            .map(|s| s.name.clone())
    }

    fn get_mut(&mut self, secret_id: &str) -> Result<&mut StoredSecret, SecretsManagerError> {
        let name = self
            .resolve(secret_id)
            .ok_or_else(|| SecretsManagerError::ResourceNotFound(secret_id.to_string()))?;
        self.secrets
            .get_mut(&name)
            .ok_or(SecretsManagerError::ResourceNotFound(name))
    }
}

/// In-memory storage for secrets, scoped by account and region
#[derive(Default)]
pub struct SecretsManagerStorage {
    regions: StateStore<RegionSecrets>,
    /// Forced GetSecretValue error codes, by secret name
    faults: DashMap<String, String>,
}

impl SecretsManagerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new secret
    #[allow(clippy::too_many_arguments)]
    pub fn create_secret(
        &self,
        scope: &AccountRegionKey,
        name: &str,
        description: Option<String>,
        kms_key_id: Option<String>,
        secret_string: Option<String>,
        secret_binary: Option<String>,
        tags: HashMap<String, String>,
    ) -> Result<StoredSecret, SecretsManagerError> {
        if name.is_empty() {
            return Err(SecretsManagerError::InvalidParameter(
                "Name must not be empty".to_string(),
            ));
        }
        validate_payload(secret_string.as_deref(), secret_binary.as_deref())?;

        let mut region = self.regions.get_or_create(scope);
        if region.secrets.contains_key(name) {
            return Err(SecretsManagerError::ResourceExists(name.to_string()));
        }

        let now = Utc::now();
        let version_id = Uuid::new_v4().to_string();
        let arn = scope.secret_arn(name, &Uuid::new_v4().simple().to_string()[..6]);

        let mut versions = HashMap::new();
        let current_version_id = if secret_string.is_some() || secret_binary.is_some() {
            versions.insert(
                version_id.clone(),
                SecretVersion {
                    version_id: version_id.clone(),
                    secret_string,
                    secret_binary,
                    created_date: now,
                    version_stages: vec![AWSCURRENT.to_string()],
                },
            );
            Some(version_id)
        } else {
            None
        };

        let secret = StoredSecret {
            arn,
            name: name.to_string(),
            description,
            kms_key_id,
            versions,
            current_version_id,
            previous_version_id: None,
            created_date: now,
            last_changed_date: now,
            last_accessed_date: None,
            deleted_date: None,
            tags,
        };

        region.secrets.insert(name.to_string(), secret.clone());
        debug!(name = %name, region = %scope.region, "Created secret");
        Ok(secret)
    }

    /// Get secret value
    pub fn get_secret_value(
        &self,
        scope: &AccountRegionKey,
        secret_id: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<(StoredSecret, SecretVersion), SecretsManagerError> {
        if let Some(code) = self.faults.get(secret_id) {
            return Err(SecretsManagerError::Forced(code.value().clone()));
        }
        if secret_id.is_empty() {
            return Err(SecretsManagerError::InvalidParameter(
                "SecretId must not be empty".to_string(),
            ));
        }

        let mut region = self.regions.get_or_create(scope);
        let secret = region.get_mut(secret_id)?;

        if secret.deleted_date.is_some() {
            return Err(SecretsManagerError::InvalidRequest(
                "You can't perform this operation on the secret because it was marked for deletion."
                    .to_string(),
            ));
        }

        secret.last_accessed_date = Some(Utc::now());

        let version_id = match (version_id, version_stage) {
            (Some(vid), _) => vid.to_string(),
            (None, Some(AWSPREVIOUS)) => secret.previous_version_id.clone().ok_or(
                SecretsManagerError::ResourceNotFound("No previous version".to_string()),
            )?,
            (None, Some(AWSCURRENT) | None) => secret.current_version_id.clone().ok_or(
                SecretsManagerError::ResourceNotFound("No current version".to_string()),
            )?,
            (None, Some(stage)) => {
                return Err(SecretsManagerError::InvalidParameter(format!(
                    "Unknown version stage: {}",
                    stage
                )))
            }
        };

        let version = secret.versions.get(&version_id).cloned().ok_or(
            SecretsManagerError::ResourceNotFound(format!("Version {} not found", version_id)),
        )?;

        Ok((secret.clone(), version))
    }

    /// Put a new secret value, rotating AWSCURRENT to AWSPREVIOUS
    pub fn put_secret_value(
        &self,
        scope: &AccountRegionKey,
        secret_id: &str,
        secret_string: Option<String>,
        secret_binary: Option<String>,
    ) -> Result<(StoredSecret, SecretVersion), SecretsManagerError> {
        validate_payload(secret_string.as_deref(), secret_binary.as_deref())?;

        let mut region = self.regions.get_or_create(scope);
        let secret = region.get_mut(secret_id)?;

        if secret.deleted_date.is_some() {
            return Err(SecretsManagerError::InvalidRequest(
                "You can't perform this operation on the secret because it was marked for deletion."
                    .to_string(),
            ));
        }

        let now = Utc::now();
        let new_version_id = Uuid::new_v4().to_string();

        let current_vid = secret.current_version_id.clone();
        let prev_vid = secret.previous_version_id.clone();

        if let Some(ref cvid) = current_vid {
            if let Some(current_version) = secret.versions.get_mut(cvid) {
                current_version.version_stages.retain(|s| s != AWSCURRENT);
                current_version.version_stages.push(AWSPREVIOUS.to_string());
            }
            if let Some(ref pvid) = prev_vid {
                if let Some(prev_version) = secret.versions.get_mut(pvid) {
                    prev_version.version_stages.retain(|s| s != AWSPREVIOUS);
                }
            }
            secret.previous_version_id = Some(cvid.clone());
        }

        let new_version = SecretVersion {
            version_id: new_version_id.clone(),
            secret_string,
            secret_binary,
            created_date: now,
            version_stages: vec![AWSCURRENT.to_string()],
        };

        secret
            .versions
            .insert(new_version_id.clone(), new_version.clone());
        secret.current_version_id = Some(new_version_id);
        secret.last_changed_date = now;

        Ok((secret.clone(), new_version))
    }

    /// Delete a secret, either immediately or after a recovery window
    pub fn delete_secret(
        &self,
        scope: &AccountRegionKey,
        secret_id: &str,
        force_delete: bool,
        recovery_window_in_days: Option<i64>,
    ) -> Result<StoredSecret, SecretsManagerError> {
        let mut region = self.regions.get_or_create(scope);

        if force_delete {
            let name = region
                .resolve(secret_id)
                .ok_or_else(|| SecretsManagerError::ResourceNotFound(secret_id.to_string()))?;
            let mut secret = region
                .secrets
                .remove(&name)
                .ok_or(SecretsManagerError::ResourceNotFound(name))?;
            secret.deleted_date = Some(Utc::now());
            return Ok(secret);
        }

        let days = recovery_window_in_days.unwrap_or(30);
        if !(7..=30).contains(&days) {
            return Err(SecretsManagerError::InvalidParameter(format!(
                "RecoveryWindowInDays must be between 7 and 30, got {}",
                days
            )));
        }

        let secret = region.get_mut(secret_id)?;
        secret.deleted_date = Some(Utc::now() + chrono::Duration::days(days));
        Ok(secret.clone())
    }

    /// List all secrets in a scope
    pub fn list_secrets(&self, scope: &AccountRegionKey) -> Vec<StoredSecret> {
        let mut secrets: Vec<StoredSecret> = self
            .regions
            .get(scope)
            .map(|region| region.secrets.values().cloned().collect())
            .unwrap_or_default();
        secrets.sort_by(|a, b| a.name.cmp(&b.name));
        secrets
    }

    /// Describe a secret
    pub fn describe_secret(
        &self,
        scope: &AccountRegionKey,
        secret_id: &str,
    ) -> Result<StoredSecret, SecretsManagerError> {
        let mut region = self.regions.get_or_create(scope);
        let secret = region.get_mut(secret_id)?;
        Ok(secret.clone())
    }

    /// Make every GetSecretValue for `secret_name` fail with `code`
    pub fn fail_with(&self, secret_name: &str, code: &str) {
        self.faults
            .insert(secret_name.to_string(), code.to_string());
    }

    pub fn clear_fault(&self, secret_name: &str) {
        self.faults.remove(secret_name);
    }
}

fn validate_payload(
    secret_string: Option<&str>,
    secret_binary: Option<&str>,
) -> Result<(), SecretsManagerError> {
    if secret_string.is_some() && secret_binary.is_some() {
        return Err(SecretsManagerError::InvalidParameter(
            "You can't specify both a binary secret value and a string secret value in the same secret."
                .to_string(),
        ));
    }
    if let Some(binary) = secret_binary {
        base64::engine::general_purpose::STANDARD
            .decode(binary)
            .map_err(|e| SecretsManagerError::InvalidParameter(format!("Invalid SecretBinary: {}", e)))?;
    }
    Ok(())
}

/// Secrets Manager errors
#[derive(Debug, thiserror::Error)]
pub enum SecretsManagerError {
    #[error("Secret {0} already exists")]
    ResourceExists(String),

    #[error("Secrets Manager can't find the specified secret: {0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    InvalidRequest(String),

    /// An injected failure; carries the service code to report
    #[error("Injected failure {0}")]
    Forced(String),
}

impl SecretsManagerError {
    /// Service error code reported in `__type`
    pub fn code(&self) -> &str {
        match self {
            Self::ResourceExists(_) => "ResourceExistsException",
            Self::ResourceNotFound(_) => "ResourceNotFoundException",
            Self::InvalidParameter(_) => "InvalidParameterException",
            Self::InvalidRequest(_) => "InvalidRequestException",
            Self::Forced(code) => code,
        }
    }
}

/// State for Secrets Manager handlers
pub struct SecretsManagerState {
    pub storage: Arc<SecretsManagerStorage>,
}

impl SecretsManagerState {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(SecretsManagerStorage::new()),
        }
    }
}

impl Default for SecretsManagerState {
    fn default() -> Self {
        Self::new()
    }
}
