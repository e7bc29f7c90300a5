//! Registry Client
//!
//! Used by worker processes to bind and unbind their name against the
//! dispatcher-hosted registry. Registration retries transient network blips
//! with jittered exponential backoff; a `409 Conflict` means the chosen name
//! is taken and is reported as `AlreadyBound` so the caller can retry under a
//! fresh name.

use super::protocol::{RegisterRequest, UnregisterRequest, ENDPOINT_REGISTER, ENDPOINT_UNREGISTER};

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);
const REQUEST_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("name is already bound")]
    AlreadyBound,
    #[error("registry unreachable: {0}")]
    Unreachable(String),
}

pub struct RegistryClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl RegistryClient {
    pub fn new(registry_addr: SocketAddr) -> Self {
        Self {
            base_url: format!("http://{}", registry_addr),
            http_client: reqwest::Client::new(),
        }
    }

    /// Binds `name` to this worker's address and service kind.
    pub async fn register(
        &self,
        name: &str,
        addr: SocketAddr,
        kind: &str,
    ) -> Result<(), RegisterError> {
        let payload = RegisterRequest {
            name: name.to_string(),
            addr,
            kind: kind.to_string(),
        };

        let response = self
            .post_with_retry(format!("{}{}", self.base_url, ENDPOINT_REGISTER), &payload)
            .await
            .map_err(|e| RegisterError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(RegisterError::AlreadyBound);
        }
        if !response.status().is_success() {
            return Err(RegisterError::Unreachable(format!(
                "registration failed: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Removes this worker's binding. Missing names are not an error here:
    /// the dispatcher may have evicted the name first.
    pub async fn unregister(&self, name: &str) -> Result<()> {
        let payload = UnregisterRequest {
            name: name.to_string(),
        };

        let response = self
            .post_with_retry(format!("{}{}", self.base_url, ENDPOINT_UNREGISTER), &payload)
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Name {} was already unbound", name);
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "unregistration failed: {}",
                response.status()
            ));
        }

        Ok(())
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..REQUEST_ATTEMPTS {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == REQUEST_ATTEMPTS {
                        return Err(anyhow::anyhow!(e));
                    }
                    // Simple jitter to prevent thundering herd
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}
