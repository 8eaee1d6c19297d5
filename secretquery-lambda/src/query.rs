//! Simulated credential-bearing query

use secretquery_core::{Credentials, FetchError};
use secretquery_secrets::SecretSource;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Failed to fetch credentials: {0}")]
    Fetch(#[from] FetchError),

    #[error("Secret {secret_name} does not hold valid credentials: {source}")]
    MalformedCredentials {
        secret_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fetch credentials from `secret_name` and report what the query would do
///
/// Nothing is actually queried; the result is a status line naming the
/// user the credentials belong to and the query argument.
pub async fn simulate<S>(
    source: &S,
    secret_name: &str,
    argument: Option<&str>,
) -> Result<String, QueryError>
where
    S: SecretSource + ?Sized,
{
    info!(
        "simulated query argument was {}",
        serde_json::json!(argument)
    );

    let secret = source.fetch(secret_name).await?;
    let credentials =
        Credentials::from_json(secret.expose()).map_err(|source| QueryError::MalformedCredentials {
            secret_name: secret_name.to_string(),
            source,
        })?;

    Ok(format!(
        "Successfully retrieved credentials for username {}. {}",
        credentials.username,
        describe_argument(argument)
    ))
}

fn describe_argument(argument: Option<&str>) -> String {
    match argument {
        Some(argument) if !argument.is_empty() => format!("Query argument was {}", argument),
        _ => "No query argument".to_string(),
    }
}
