//! AWS Secrets Manager emulation for SecretQuery tests
//!
//! Serves the Secrets Manager JSON 1.1 protocol in-process so the real SDK
//! client can be exercised end to end:
//! - CreateSecret, GetSecretValue, PutSecretValue
//! - DeleteSecret, DescribeSecret, ListSecrets
//! - Secret versioning (AWSCURRENT, AWSPREVIOUS)
//! - Secrets scoped by account and region (taken from the SigV4 scope)
//! - Forced service errors per secret name
//!
//! ## Usage
//!
//! ```rust,no_run
//! use secretquery_emulator::EmulatorServer;
//!
//! #[tokio::test]
//! async fn test_fetch() {
//!     let server = EmulatorServer::start().await.unwrap();
//!     let sdk_config = server.sdk_config("us-east-2").await;
//!     let client = aws_sdk_secretsmanager::Client::new(&sdk_config);
//!     // ...
//! }
//! ```

pub mod handlers;
pub mod scope;
pub mod server;
pub mod sigv4;
mod storage;

pub use handlers::handle_request;
pub use scope::{AccountRegionKey, StateStore, DEFAULT_ACCOUNT_ID, DEFAULT_REGION};
pub use server::{test_credentials, EmulatorError, EmulatorServer};
pub use storage::{
    SecretsManagerError, SecretsManagerState, SecretsManagerStorage, StoredSecret, SecretVersion,
};
