//! Integration tests for the Secrets Manager fetcher
//!
//! These tests drive the real AWS SDK client against the in-process emulator.

use aws_sdk_secretsmanager::{primitives::Blob, Client};
use secretquery_core::SecretErrorKind;
use secretquery_emulator::{test_credentials, EmulatorServer};
use secretquery_secrets::{fetcher::sdk_loader, FetcherConfig, SecretFetcher, SecretSource};

const REGION: &str = "us-east-2";

/// Start an emulator and a fetcher bound to `REGION`, plus an admin client
async fn setup() -> (EmulatorServer, SecretFetcher, Client) {
    let server = EmulatorServer::start().await.unwrap();
    let admin = Client::new(&server.sdk_config(REGION).await);

    let config = FetcherConfig {
        region: REGION.to_string(),
        endpoint_url: Some(server.url().to_string()),
    };
    let sdk_config = sdk_loader(&config)
        .credentials_provider(test_credentials())
        .load()
        .await;
    let fetcher = SecretFetcher::from_client(Client::new(&sdk_config));

    (server, fetcher, admin)
}

#[tokio::test]
async fn test_fetch_secret_string() {
    let (_server, fetcher, admin) = setup().await;

    admin
        .create_secret()
        .name("example_secret")
        .secret_string(r#"{"username": "alice"}"#)
        .send()
        .await
        .unwrap();

    let secret = fetcher.fetch("example_secret").await.unwrap();
    assert_eq!(secret.name(), "example_secret");
    assert_eq!(secret.expose(), r#"{"username": "alice"}"#);
    assert!(secret.version_id().is_some());
}

#[tokio::test]
async fn test_fetch_returns_current_version() {
    let (_server, fetcher, admin) = setup().await;

    admin
        .create_secret()
        .name("example_secret")
        .secret_string("first")
        .send()
        .await
        .unwrap();
    admin
        .put_secret_value()
        .secret_id("example_secret")
        .secret_string("second")
        .send()
        .await
        .unwrap();

    let secret = fetcher.fetch("example_secret").await.unwrap();
    assert_eq!(secret.expose(), "second");
}

#[tokio::test]
async fn test_missing_secret_is_not_found() {
    let (_server, fetcher, _admin) = setup().await;

    let err = fetcher.fetch("example_secret").await.unwrap_err();
    assert_eq!(err.kind, SecretErrorKind::NotFound);
    assert_eq!(err.sentinel(), Some("-1"));
    assert_eq!(err.secret_name, "example_secret");
}

#[tokio::test]
async fn test_secret_in_other_region_is_not_found() {
    let (server, fetcher, _admin) = setup().await;

    let west = Client::new(&server.sdk_config("us-west-2").await);
    west.create_secret()
        .name("example_secret")
        .secret_string(r#"{"username": "alice"}"#)
        .send()
        .await
        .unwrap();

    let err = fetcher.fetch("example_secret").await.unwrap_err();
    assert_eq!(err.kind, SecretErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleted_secret_is_invalid_request() {
    let (_server, fetcher, admin) = setup().await;

    admin
        .create_secret()
        .name("example_secret")
        .secret_string("value")
        .send()
        .await
        .unwrap();
    admin
        .delete_secret()
        .secret_id("example_secret")
        .send()
        .await
        .unwrap();

    let err = fetcher.fetch("example_secret").await.unwrap_err();
    assert_eq!(err.kind, SecretErrorKind::InvalidRequest);
    assert_eq!(err.sentinel(), Some("-2"));
    assert!(err.message.contains("marked for deletion"));
}

#[tokio::test]
async fn test_injected_service_errors_map_to_sentinels() {
    let (server, fetcher, _admin) = setup().await;

    let cases = [
        ("ResourceNotFoundException", SecretErrorKind::NotFound, "-1"),
        ("InvalidRequestException", SecretErrorKind::InvalidRequest, "-2"),
        ("InvalidParameterException", SecretErrorKind::InvalidParameter, "-3"),
        ("DecryptionFailure", SecretErrorKind::DecryptionFailure, "-4"),
        ("InternalServiceError", SecretErrorKind::InternalServiceError, "-5"),
    ];

    for (code, kind, sentinel) in cases {
        server.state().storage.fail_with("example_secret", code);

        let err = fetcher.fetch("example_secret").await.unwrap_err();
        assert_eq!(err.kind, kind, "code {}", code);
        assert_eq!(err.sentinel(), Some(sentinel), "code {}", code);
    }
}

#[tokio::test]
async fn test_unmapped_service_error_is_unknown() {
    let (server, fetcher, _admin) = setup().await;
    server
        .state()
        .storage
        .fail_with("example_secret", "AccessDeniedException");

    let err = fetcher.fetch("example_secret").await.unwrap_err();
    assert_eq!(
        err.kind,
        SecretErrorKind::Unknown(Some("AccessDeniedException".to_string()))
    );
    assert_eq!(err.sentinel(), None);
}

#[tokio::test]
async fn test_binary_secret_has_no_secret_string() {
    let (_server, fetcher, admin) = setup().await;

    admin
        .create_secret()
        .name("example_secret")
        .secret_binary(Blob::new(vec![0u8, 1, 2]))
        .send()
        .await
        .unwrap();

    let err = fetcher.fetch("example_secret").await.unwrap_err();
    assert_eq!(err.kind, SecretErrorKind::NoSecretString);
    assert_eq!(err.sentinel(), Some("-6"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_unknown() {
    // Reserve a port, then release it so nothing is listening there
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let config = FetcherConfig {
        region: REGION.to_string(),
        endpoint_url: Some(format!("http://127.0.0.1:{}", port)),
    };
    let sdk_config = sdk_loader(&config)
        .credentials_provider(test_credentials())
        .load()
        .await;
    let fetcher = SecretFetcher::from_client(Client::new(&sdk_config));

    let err = fetcher.fetch("example_secret").await.unwrap_err();
    assert_eq!(err.kind, SecretErrorKind::Unknown(None));
    assert!(!err.message.is_empty());
}
