//! Outbound response envelope

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A response in the shape HTTP gateways expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
    headers
}

impl ApiResponse {
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            headers: default_headers(),
            body: body.to_string(),
        }
    }

    pub fn success(data: &Value) -> Self {
        Self::json(200, data)
    }

    /// Error envelope `{error, details?}`
    pub fn error(status_code: u16, message: &str, details: Option<Value>) -> Self {
        let mut body = json!({ "error": message });
        if let Some(details) = details {
            body["details"] = details;
        }
        Self::json(status_code, &body)
    }

    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
