//! Emulator server management

use aws_config::{retry::RetryConfig, BehaviorVersion, SdkConfig};
use aws_sdk_secretsmanager::config::{Credentials, Region};
use axum::{routing::post, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::handlers::handle_request;
use crate::storage::SecretsManagerState;

/// A running emulator, serving on a random local port
///
/// The server task is aborted when this value is dropped.
pub struct EmulatorServer {
    addr: SocketAddr,
    base_url: String,
    state: Arc<SecretsManagerState>,
    handle: JoinHandle<()>,
}

impl EmulatorServer {
    /// Start a new emulator on a random available port
    pub async fn start() -> Result<Self, EmulatorError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(EmulatorError::Bind)?;
        let addr = listener.local_addr().map_err(EmulatorError::Bind)?;

        let state = Arc::new(SecretsManagerState::new());
        let router = Router::new()
            .route("/", post(handle_request))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "Secrets Manager emulator stopped");
            }
        });

        info!(port = addr.port(), "Secrets Manager emulator ready");

        Ok(Self {
            addr,
            base_url: format!("http://{}", addr),
            state,
            handle,
        })
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn state(&self) -> &Arc<SecretsManagerState> {
        &self.state
    }

    /// SDK config pointed at this emulator, signed for `region`
    pub async fn sdk_config(&self, region: &str) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(self.url())
            .credentials_provider(test_credentials())
            .region(Region::new(region.to_string()))
            .retry_config(RetryConfig::disabled())
            .load()
            .await
    }
}

impl Drop for EmulatorServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Static credentials accepted by the emulator
pub fn test_credentials() -> Credentials {
    Credentials::new("test", "test", None, None, "secretquery-emulator")
}

/// Errors that can occur starting the emulator
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("Failed to bind emulator listener: {0}")]
    Bind(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_binds_random_port() {
        let first = EmulatorServer::start().await.unwrap();
        let second = EmulatorServer::start().await.unwrap();

        assert_ne!(first.port(), second.port());
        assert!(first.url().starts_with("http://127.0.0.1:"));
    }
}
