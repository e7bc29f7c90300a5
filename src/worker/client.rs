//! Remote Worker Client
//!
//! The dispatcher-side view of one registered worker. Every call carries an
//! explicit timeout: the dispatcher has no cancellation mechanism of its own,
//! so a hung connection must surface as an `Unreachable` error rather than
//! block a runner forever.
//!
//! Calls are deliberately not retried here. A lost `execute` response is
//! indistinguishable from a lost request, and retrying could execute the same
//! batch twice; the dispatcher's requeue/evict protocol is the retry layer.

use super::protocol::{
    CapacityResponse, ExecuteRequest, ExecuteResponse, ENDPOINT_CAPACITY, ENDPOINT_EXECUTE,
};
use super::{BatchWorker, WorkerCallError};
use crate::task::types::Task;

use std::net::SocketAddr;
use std::time::Duration;

const CAPACITY_TIMEOUT: Duration = Duration::from_millis(2000);
const EXECUTE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct RemoteWorker {
    base_url: String,
    http_client: reqwest::Client,
}

impl RemoteWorker {
    pub fn new(addr: SocketAddr, http_client: reqwest::Client) -> Self {
        Self {
            base_url: format!("http://{}", addr),
            http_client,
        }
    }
}

impl BatchWorker for RemoteWorker {
    async fn execute_batch(&self, batch: Vec<Task>) -> Result<i64, WorkerCallError> {
        let payload = ExecuteRequest { tasks: batch };

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, ENDPOINT_EXECUTE))
            .json(&payload)
            .timeout(EXECUTE_TIMEOUT)
            .send()
            .await
            .map_err(|e| WorkerCallError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(WorkerCallError::Overloaded);
        }
        if !response.status().is_success() {
            return Err(WorkerCallError::Unreachable(format!(
                "execute failed: {}",
                response.status()
            )));
        }

        let body: Option<ExecuteResponse> = response
            .json()
            .await
            .map_err(|e| WorkerCallError::Unreachable(e.to_string()))?;

        match body {
            Some(executed) => Ok(executed.result),
            None => Err(WorkerCallError::Unreachable(
                "execute returned an empty body".to_string(),
            )),
        }
    }

    async fn capacity(&self) -> Result<usize, WorkerCallError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, ENDPOINT_CAPACITY))
            .timeout(CAPACITY_TIMEOUT)
            .send()
            .await
            .map_err(|e| WorkerCallError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WorkerCallError::Unreachable(format!(
                "capacity failed: {}",
                response.status()
            )));
        }

        let body: CapacityResponse = response
            .json()
            .await
            .map_err(|e| WorkerCallError::Unreachable(e.to_string()))?;

        Ok(body.capacity)
    }
}
