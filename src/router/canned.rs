//! Pre-encoded JSON responses.

use serde::Serialize;
use serde_json::json;

use crate::server::{HttpResponse, StatusCode};

/// A status code and a JSON body, encoded once when the route table is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl CannedResponse {
    /// Encode `body` as the JSON payload for `status`.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status,
            body: serde_json::to_vec(body)?,
        })
    }

    /// Build from an already constructed JSON value.
    pub fn from_value(status: StatusCode, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// The `{"error":"Not found"}` reply for unmatched requests.
    pub fn not_found() -> Self {
        Self::from_value(StatusCode::NotFound, &json!({ "error": "Not found" }))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The encoded JSON body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Build the wire response, with `Content-Type` and `Content-Length` set.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::new(self.status).with_json_bytes(self.body.clone())
    }
}
