//! Worker Network Protocol
//!
//! DTOs and endpoint constants for the worker HTTP surface. An overloaded
//! worker answers `429 Too Many Requests` with no body; any transport failure
//! or unexpected status is interpreted by the caller as worker death.

use crate::task::types::Task;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_EXECUTE: &str = "/worker/execute";
pub const ENDPOINT_CAPACITY: &str = "/worker/capacity";

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub result: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapacityResponse {
    pub capacity: usize,
}
