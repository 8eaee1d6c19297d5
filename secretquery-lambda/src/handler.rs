//! Lambda request handler

use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use secretquery_core::ResponseEnvelope;
use secretquery_secrets::{SecretFetcher, SecretSource};
use serde_json::Value;
use tracing::info;

use crate::config::Settings;
use crate::query::simulate;

/// Derive the query argument from an inbound event
///
/// `null` means no argument; a string event is taken as is; anything else
/// is passed along as its compact JSON text.
pub fn query_argument(event: &Value) -> Option<String> {
    match event {
        Value::Null => None,
        Value::String(argument) => Some(argument.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse a raw event document; blank input is the `null` event
pub fn parse_event(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw)
}

/// Run one invocation against `source`
///
/// Failures upstream are returned as invocation errors; a response is only
/// ever built with status 200.
pub async fn handle<S>(
    source: &S,
    secret_name: &str,
    event: LambdaEvent<Value>,
) -> Result<ResponseEnvelope, Error>
where
    S: SecretSource + ?Sized,
{
    let (payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "Starting lambda at {}", Utc::now());

    let argument = query_argument(&payload);
    let message = simulate(source, secret_name, argument.as_deref()).await?;

    Ok(ResponseEnvelope::ok(&message)?)
}

/// Lambda entry point: builds a fresh Secrets Manager client per invocation
pub async fn invoke(
    settings: &Settings,
    event: LambdaEvent<Value>,
) -> Result<ResponseEnvelope, Error> {
    let fetcher = SecretFetcher::connect(&settings.fetcher_config()).await;
    handle(&fetcher, &settings.secret_name, event).await
}
