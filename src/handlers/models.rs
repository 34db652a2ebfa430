//! Request/response models for the HTTP API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level JSON envelope returned to callers of the fetch endpoint.
///
/// Exactly one of `data`/`error` is present, gated by `ok`.
///
/// # Example Success Response
/// ```json
/// {"ok": true, "data": {"id": 1, "name": "acme"}}
/// ```
///
/// # Example Error Response
/// ```json
/// {"ok": false, "error": "Connection error: connection refused"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Whether the fetch completed
    pub ok: bool,

    /// Column-name-keyed first row; empty when the table has no rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Human-readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchResponse {
    /// Create a successful response carrying the row mapping
    pub fn success(data: Map<String, Value>) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body of the liveness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok_with_version(version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            version: version.to_string(),
        }
    }
}
