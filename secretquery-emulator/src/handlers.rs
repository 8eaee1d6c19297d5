//! HTTP handlers for the Secrets Manager emulator

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::scope::{AccountRegionKey, DEFAULT_ACCOUNT_ID, DEFAULT_REGION};
use crate::sigv4::request_region;
use crate::storage::{SecretsManagerError, SecretsManagerState, StoredSecret};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Largest page ListSecrets will return
const MAX_LIST_RESULTS: usize = 100;

/// Handle Secrets Manager requests based on X-Amz-Target header
pub async fn handle_request(
    State(state): State<Arc<SecretsManagerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let region = request_region(&headers).unwrap_or_else(|| DEFAULT_REGION.to_string());
    let scope = AccountRegionKey::new(DEFAULT_ACCOUNT_ID, region);

    info!(target = %target, region = %scope.region, "Secrets Manager request");

    match target {
        "secretsmanager.CreateSecret" => handle_create_secret(&state, &scope, &body),
        "secretsmanager.GetSecretValue" => handle_get_secret_value(&state, &scope, &body),
        "secretsmanager.PutSecretValue" => handle_put_secret_value(&state, &scope, &body),
        "secretsmanager.DeleteSecret" => handle_delete_secret(&state, &scope, &body),
        "secretsmanager.DescribeSecret" => handle_describe_secret(&state, &scope, &body),
        "secretsmanager.ListSecrets" => handle_list_secrets(&state, &scope, &body),
        _ => {
            warn!(target = %target, "Unknown Secrets Manager operation");
            error_response(
                "UnknownOperationException",
                &format!("Unknown operation: {}", target),
            )
        }
    }
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecretRequest {
    name: String,
    description: Option<String>,
    kms_key_id: Option<String>,
    secret_string: Option<String>,
    secret_binary: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecretResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueRequest {
    secret_id: String,
    version_id: Option<String>,
    version_stage: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    version_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_binary: Option<String>,
    version_stages: Vec<String>,
    created_date: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutSecretValueRequest {
    secret_id: String,
    secret_string: Option<String>,
    secret_binary: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutSecretValueResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    version_id: String,
    version_stages: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteSecretRequest {
    secret_id: String,
    #[serde(default)]
    force_delete_without_recovery: bool,
    recovery_window_in_days: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteSecretResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    deletion_date: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSecretRequest {
    secret_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSecretResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kms_key_id: Option<String>,
    created_date: f64,
    last_changed_date: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_accessed_date: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_date: Option<f64>,
    version_ids_to_stages: HashMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListSecretsRequest {
    max_results: Option<usize>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListSecretsResponse {
    secret_list: Vec<SecretListEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecretListEntry {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_date: f64,
    last_changed_date: f64,
}

// === Handlers ===

fn handle_create_secret(
    state: &SecretsManagerState,
    scope: &AccountRegionKey,
    body: &[u8],
) -> Response {
    let req: CreateSecretRequest = match parse_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let tags: HashMap<String, String> = req.tags.into_iter().map(|t| (t.key, t.value)).collect();

    match state.storage.create_secret(
        scope,
        &req.name,
        req.description,
        req.kms_key_id,
        req.secret_string,
        req.secret_binary,
        tags,
    ) {
        Ok(secret) => json_response(&CreateSecretResponse {
            arn: secret.arn,
            name: secret.name,
            version_id: secret.current_version_id,
        }),
        Err(e) => service_error(&e),
    }
}

fn handle_get_secret_value(
    state: &SecretsManagerState,
    scope: &AccountRegionKey,
    body: &[u8],
) -> Response {
    let req: GetSecretValueRequest = match parse_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.storage.get_secret_value(
        scope,
        &req.secret_id,
        req.version_id.as_deref(),
        req.version_stage.as_deref(),
    ) {
        Ok((secret, version)) => json_response(&GetSecretValueResponse {
            arn: secret.arn,
            name: secret.name,
            version_id: version.version_id,
            secret_string: version.secret_string,
            secret_binary: version.secret_binary,
            version_stages: version.version_stages,
            created_date: timestamp(version.created_date),
        }),
        Err(e) => service_error(&e),
    }
}

fn handle_put_secret_value(
    state: &SecretsManagerState,
    scope: &AccountRegionKey,
    body: &[u8],
) -> Response {
    let req: PutSecretValueRequest = match parse_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state
        .storage
        .put_secret_value(scope, &req.secret_id, req.secret_string, req.secret_binary)
    {
        Ok((secret, version)) => json_response(&PutSecretValueResponse {
            arn: secret.arn,
            name: secret.name,
            version_id: version.version_id,
            version_stages: version.version_stages,
        }),
        Err(e) => service_error(&e),
    }
}

fn handle_delete_secret(
    state: &SecretsManagerState,
    scope: &AccountRegionKey,
    body: &[u8],
) -> Response {
    let req: DeleteSecretRequest = match parse_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.storage.delete_secret(
        scope,
        &req.secret_id,
        req.force_delete_without_recovery,
        req.recovery_window_in_days,
    ) {
        Ok(secret) => json_response(&DeleteSecretResponse {
            arn: secret.arn,
            name: secret.name,
            deletion_date: secret.deleted_date.map(timestamp),
        }),
        Err(e) => service_error(&e),
    }
}

fn handle_describe_secret(
    state: &SecretsManagerState,
    scope: &AccountRegionKey,
    body: &[u8],
) -> Response {
    let req: DescribeSecretRequest = match parse_request(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.storage.describe_secret(scope, &req.secret_id) {
        Ok(secret) => {
            let version_ids_to_stages: HashMap<String, Vec<String>> = secret
                .versions
                .iter()
                .map(|(k, v)| (k.clone(), v.version_stages.clone()))
                .collect();

            let mut tags: Vec<Tag> = secret
                .tags
                .into_iter()
                .map(|(key, value)| Tag { key, value })
                .collect();
            tags.sort_by(|a, b| a.key.cmp(&b.key));

            json_response(&DescribeSecretResponse {
                arn: secret.arn,
                name: secret.name,
                description: secret.description,
                kms_key_id: secret.kms_key_id,
                created_date: timestamp(secret.created_date),
                last_changed_date: timestamp(secret.last_changed_date),
                last_accessed_date: secret.last_accessed_date.map(timestamp),
                deleted_date: secret.deleted_date.map(timestamp),
                version_ids_to_stages,
                tags,
            })
        }
        Err(e) => service_error(&e),
    }
}

fn handle_list_secrets(
    state: &SecretsManagerState,
    scope: &AccountRegionKey,
    body: &[u8],
) -> Response {
    // An empty body is a valid ListSecrets call
    let req: ListSecretsRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ListSecretsRequest::default()
    } else {
        match parse_request(body) {
            Ok(r) => r,
            Err(response) => return response,
        }
    };

    let start = match req.next_token.as_deref().map(str::parse::<usize>) {
        None => 0,
        Some(Ok(start)) => start,
        Some(Err(_)) => {
            return error_response("InvalidNextTokenException", "Invalid NextToken")
        }
    };
    let max_results = match req.max_results {
        None => MAX_LIST_RESULTS,
        Some(n @ 1..=MAX_LIST_RESULTS) => n,
        Some(n) => {
            return error_response(
                "InvalidParameterException",
                &format!("MaxResults must be between 1 and {MAX_LIST_RESULTS}, got {n}"),
            )
        }
    };

    let secrets = state.storage.list_secrets(scope);
    let end = start.saturating_add(max_results).min(secrets.len());
    let next_token = (end < secrets.len()).then(|| end.to_string());

    let secret_list: Vec<SecretListEntry> = secrets
        .into_iter()
        .skip(start)
        .take(max_results)
        .map(list_entry)
        .collect();

    json_response(&ListSecretsResponse {
        secret_list,
        next_token,
    })
}

// === Helpers ===

fn list_entry(secret: StoredSecret) -> SecretListEntry {
    SecretListEntry {
        arn: secret.arn,
        name: secret.name,
        description: secret.description,
        created_date: timestamp(secret.created_date),
        last_changed_date: timestamp(secret.last_changed_date),
    }
}

#[allow(clippy::cast_precision_loss)]
fn timestamp(date: chrono::DateTime<chrono::Utc>) -> f64 {
    date.timestamp() as f64
}

fn parse_request<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body)
        .map_err(|e| error_response("InvalidParameterException", &e.to_string()))
}

fn json_response<T: Serialize>(body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => error_response("InternalServiceError", &e.to_string()),
    }
}

fn service_error(error: &SecretsManagerError) -> Response {
    error_response(error.code(), &error.to_string())
}

fn error_response(error_type: &str, message: &str) -> Response {
    let status = match error_type {
        "InternalServiceError" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = serde_json::json!({
        "__type": error_type,
        "message": message
    });

    (
        status,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        body.to_string(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;

    async fn call(state: &Arc<SecretsManagerState>, target: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let mut headers = HeaderMap::new();
        headers.insert("x-amz-target", HeaderValue::from_str(target).unwrap());

        let response = handle_request(
            State(state.clone()),
            headers,
            Bytes::from(body.to_string()),
        )
        .await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let state = Arc::new(SecretsManagerState::new());

        let (status, created) = call(
            &state,
            "secretsmanager.CreateSecret",
            r#"{"Name":"example_secret","SecretString":"{\"username\":\"alice\"}"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["Name"], "example_secret");

        let (status, value) = call(
            &state,
            "secretsmanager.GetSecretValue",
            r#"{"SecretId":"example_secret"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["SecretString"], r#"{"username":"alice"}"#);
        assert_eq!(value["VersionStages"][0], "AWSCURRENT");
    }

    #[tokio::test]
    async fn test_unsigned_requests_use_default_region() {
        let state = Arc::new(SecretsManagerState::new());
        call(
            &state,
            "secretsmanager.CreateSecret",
            r#"{"Name":"example_secret","SecretString":"x"}"#,
        )
        .await;

        let scope = AccountRegionKey::new(DEFAULT_ACCOUNT_ID, DEFAULT_REGION);
        assert_eq!(state.storage.list_secrets(&scope).len(), 1);
    }

    #[tokio::test]
    async fn test_error_shapes() {
        let state = Arc::new(SecretsManagerState::new());

        let (status, body) = call(
            &state,
            "secretsmanager.GetSecretValue",
            r#"{"SecretId":"missing"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["__type"], "ResourceNotFoundException");

        state.storage.fail_with("broken", "InternalServiceError");
        let (status, body) = call(
            &state,
            "secretsmanager.GetSecretValue",
            r#"{"SecretId":"broken"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["__type"], "InternalServiceError");

        let (status, body) = call(&state, "secretsmanager.RotateSecret", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["__type"], "UnknownOperationException");
    }

    #[tokio::test]
    async fn test_list_secrets_pagination() {
        let state = Arc::new(SecretsManagerState::new());
        for name in ["a", "b", "c"] {
            call(
                &state,
                "secretsmanager.CreateSecret",
                &format!(r#"{{"Name":"{}","SecretString":"x"}}"#, name),
            )
            .await;
        }

        let (_, page) = call(&state, "secretsmanager.ListSecrets", r#"{"MaxResults":2}"#).await;
        assert_eq!(page["SecretList"].as_array().unwrap().len(), 2);
        assert_eq!(page["NextToken"], "2");

        let (_, page) = call(
            &state,
            "secretsmanager.ListSecrets",
            r#"{"MaxResults":2,"NextToken":"2"}"#,
        )
        .await;
        assert_eq!(page["SecretList"][0]["Name"], "c");
        assert!(page.get("NextToken").is_none());

        let (_, all) = call(&state, "secretsmanager.ListSecrets", "").await;
        assert_eq!(all["SecretList"].as_array().unwrap().len(), 3);

        let (_, past_end) = call(
            &state,
            "secretsmanager.ListSecrets",
            r#"{"NextToken":"10"}"#,
        )
        .await;
        assert_eq!(past_end["SecretList"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_secrets_rejects_out_of_range_max_results() {
        let state = Arc::new(SecretsManagerState::new());

        for body in [
            r#"{"MaxResults":0}"#,
            r#"{"MaxResults":101}"#,
            r#"{"MaxResults":18446744073709551615,"NextToken":"1"}"#,
        ] {
            let (status, error) = call(&state, "secretsmanager.ListSecrets", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error["__type"], "InvalidParameterException");
        }

        let (status, page) = call(&state, "secretsmanager.ListSecrets", r#"{"MaxResults":100}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["SecretList"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_secrets_rejects_malformed_body() {
        let state = Arc::new(SecretsManagerState::new());

        let (status, error) = call(&state, "secretsmanager.ListSecrets", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["__type"], "InvalidParameterException");

        let (status, error) = call(&state, "secretsmanager.ListSecrets", r#"{"MaxResults":"two"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["__type"], "InvalidParameterException");
    }

    #[tokio::test]
    async fn test_describe_secret_returns_tags() {
        let state = Arc::new(SecretsManagerState::new());
        call(
            &state,
            "secretsmanager.CreateSecret",
            r#"{"Name":"tagged","SecretString":"x","Tags":[{"Key":"team","Value":"db"},{"Key":"env","Value":"prod"}]}"#,
        )
        .await;
        call(
            &state,
            "secretsmanager.CreateSecret",
            r#"{"Name":"untagged","SecretString":"x"}"#,
        )
        .await;

        let (status, described) = call(
            &state,
            "secretsmanager.DescribeSecret",
            r#"{"SecretId":"tagged"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            described["Tags"],
            serde_json::json!([
                {"Key": "env", "Value": "prod"},
                {"Key": "team", "Value": "db"}
            ])
        );

        let (_, described) = call(
            &state,
            "secretsmanager.DescribeSecret",
            r#"{"SecretId":"untagged"}"#,
        )
        .await;
        assert!(described.get("Tags").is_none());
    }
}
