//! Registry Network Protocol
//!
//! DTOs and endpoint constants for the registry HTTP surface. Worker
//! processes talk to these endpoints to bind and unbind their names; the
//! dispatcher reads the directory in-process and never goes through HTTP.

use super::service::ServiceEntry;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub const ENDPOINT_REGISTER: &str = "/registry/register";
pub const ENDPOINT_UNREGISTER: &str = "/registry/unregister";
pub const ENDPOINT_LIST: &str = "/registry/list";
pub const ENDPOINT_LOOKUP: &str = "/registry/lookup";

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub addr: SocketAddr,
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnregisterRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub entry: Option<ServiceEntry>,
}
