//! Structured response model.
//!
//! # Responsibilities
//! - Hold status, headers and body written by middleware and handlers
//! - Map dispatch failures to HTTP status codes
//!
//! # Design Decisions
//! - One response per request, mutated in place by every pipeline step
//! - Status semantics for routing failures live here, not in the tree
//! - A handler that already set an error status keeps it when it fails

use std::collections::HashMap;

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::http::request::serde_util;
use crate::routing::DispatchError;

/// Structured response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,

    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub headers: HashMap<String, String>,

    #[serde(
        default,
        deserialize_with = "serde_util::null_as_default",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub multi_value_headers: HashMap<String, Vec<String>>,

    #[serde(default, with = "serde_util::body")]
    pub body: Vec<u8>,

    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

impl Default for ProxyResponse {
    fn default() -> Self {
        Self {
            status_code: 200,
            headers: HashMap::new(),
            multi_value_headers: HashMap::new(),
            body: Vec::new(),
            is_base64_encoded: false,
        }
    }
}

impl ProxyResponse {
    /// A fresh `200 OK` response with no headers or body.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status_code = status;
        self
    }

    /// Set a single-value header, replacing any existing header whose name
    /// differs only in case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Case-insensitive single-value header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace the body with plain text.
    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        self.set_header("Content-Type", "text/plain; charset=utf-8");
        self.body = body.into().into_bytes();
        self.is_base64_encoded = false;
        self
    }

    /// Replace the body with a JSON document.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, serde_json::Error> {
        self.body = serde_json::to_vec(value)?;
        self.is_base64_encoded = false;
        Ok(self.set_header("Content-Type", "application/json"))
    }

    /// Prepare the body for a JSON envelope. A body that is flagged, or is
    /// not valid UTF-8, is replaced by its base64 text and flagged. Call once,
    /// right before serializing.
    pub fn encode_body(&mut self) {
        if self.is_base64_encoded || std::str::from_utf8(&self.body).is_err() {
            self.body = BASE64_STANDARD.encode(&self.body).into_bytes();
            self.is_base64_encoded = true;
        }
    }

    /// Write the status and body for a failed dispatch.
    pub fn apply_dispatch_error(&mut self, err: &DispatchError) {
        match err {
            DispatchError::MethodNotAllowed { allowed, .. } => {
                let allow = allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.set_status(405).set_header("Allow", allow);
                self.error_body("method not allowed");
            }
            DispatchError::Handler(_) => {
                if self.status_code < 400 {
                    self.set_status(500);
                    self.error_body("internal server error");
                }
            }
        }
    }

    fn error_body(&mut self, message: &str) {
        let body = serde_json::json!({ "error": message, "status": self.status_code });
        self.body = body.to_string().into_bytes();
        self.is_base64_encoded = false;
        self.set_header("Content-Type", "application/json");
    }
}
