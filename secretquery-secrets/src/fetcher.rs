//! AWS Secrets Manager fetcher
//!
//! One `GetSecretValue` call per fetch. SDK retries are disabled, so a
//! failure is reported exactly as the service returned it.

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, BehaviorVersion, ConfigLoader};
use aws_sdk_secretsmanager::{
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata},
    operation::RequestId,
    Client,
};
use secretquery_core::{FetchError, SecretErrorKind};
use tracing::info;

use crate::source::{Secret, SecretSource};

/// Region the fetcher is bound to unless configured otherwise
pub const DEFAULT_REGION: &str = "us-east-2";

/// Connection settings for [`SecretFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub region: String,
    /// Override for the service endpoint (local emulators)
    pub endpoint_url: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

/// SDK config loader bound to the configured region, with retries disabled
pub fn sdk_loader(config: &FetcherConfig) -> ConfigLoader {
    let loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .retry_config(RetryConfig::disabled());

    match &config.endpoint_url {
        Some(endpoint) => loader.endpoint_url(endpoint),
        None => loader,
    }
}

/// Fetches secrets from AWS Secrets Manager
#[derive(Debug, Clone)]
pub struct SecretFetcher {
    client: Client,
}

impl SecretFetcher {
    /// Build a fresh client from the ambient AWS environment
    pub async fn connect(config: &FetcherConfig) -> Self {
        let sdk_config = sdk_loader(config).load().await;
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretSource for SecretFetcher {
    async fn fetch(&self, secret_name: &str) -> Result<Secret, FetchError> {
        info!(secret_name = %secret_name, "getting secret");

        let result = self
            .client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await;

        let output = match result {
            Ok(output) => {
                info!(secret_name = %secret_name, "successfully got secret");
                output
            }
            Err(err) => {
                info!(
                    secret_name = %secret_name,
                    error = %DisplayErrorContext(&err),
                    "did not get secret"
                );

                let message = err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
                let mut error = classify(secret_name, err.code(), message);
                if let Some(request_id) = err.as_service_error().and_then(|e| e.request_id()) {
                    error = error.with_request_id(request_id);
                }
                return Err(error);
            }
        };

        match output.secret_string {
            Some(value) => Ok(Secret::new(secret_name, output.version_id, value)),
            None => {
                info!(secret_name = %secret_name, "no secret string");
                Err(FetchError::new(SecretErrorKind::NoSecretString, secret_name)
                    .with_message("secret has no SecretString payload"))
            }
        }
    }
}

/// Turn a service error code into a [`FetchError`], logging what happened
fn classify(secret_name: &str, code: Option<&str>, message: String) -> FetchError {
    let kind = SecretErrorKind::from_code(code);

    match &kind {
        SecretErrorKind::NotFound => {
            info!(secret_name = %secret_name, "the requested secret was not found");
        }
        SecretErrorKind::InvalidRequest => {
            info!(reason = %message, "the request was invalid");
        }
        SecretErrorKind::InvalidParameter => {
            info!(reason = %message, "the request had invalid params");
        }
        SecretErrorKind::DecryptionFailure => {
            info!(
                reason = %message,
                "the requested secret can't be decrypted using the provided KMS key"
            );
        }
        SecretErrorKind::InternalServiceError => {
            info!(reason = %message, "an error occurred on service side");
        }
        SecretErrorKind::NoSecretString | SecretErrorKind::Unknown(_) => {
            info!(code = ?code, reason = %message, "unrecognized secrets manager error");
        }
    }

    FetchError::new(kind, secret_name).with_message(message)
}
