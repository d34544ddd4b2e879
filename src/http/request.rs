//! Structured request model and per-request execution context.
//!
//! # Responsibilities
//! - Represent an inbound call as a serverless proxy event envelope
//! - Carry the request ID and deadline through the pipeline
//!
//! # Design Decisions
//! - Field names follow the proxy envelope JSON (`httpMethod`, `isBase64Encoded`, ...)
//! - `null` maps and bodies in an envelope deserialize as empty
//! - Body is raw bytes; a base64 envelope body is decoded before dispatch,
//!   so handlers never see the encoded text

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Header used to correlate requests across hops.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Structured request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(rename = "httpMethod", alias = "method", default)]
    pub http_method: String,

    #[serde(default)]
    pub path: String,

    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub headers: HashMap<String, String>,

    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,

    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub query_string_parameters: HashMap<String, String>,

    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,

    /// Populated by dispatch from the captured Parameter Set.
    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub path_parameters: HashMap<String, String>,

    #[serde(default, deserialize_with = "serde_util::null_as_default")]
    pub stage_variables: HashMap<String, String>,

    #[serde(default, with = "serde_util::body")]
    pub body: Vec<u8>,

    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

impl ProxyRequest {
    /// Create a request with just a method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Decode a base64 envelope body in place and clear the flag.
    ///
    /// On a decode error the body is left empty and the error returned.
    pub fn decode_body(&mut self) -> Result<(), base64::DecodeError> {
        if !self.is_base64_encoded {
            return Ok(());
        }
        self.is_base64_encoded = false;
        match BASE64_STANDARD.decode(&self.body) {
            Ok(decoded) => {
                self.body = decoded;
                Ok(())
            }
            Err(e) => {
                self.body.clear();
                Err(e)
            }
        }
    }

    /// Case-insensitive single-value header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Single-value query parameter lookup.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.get(name).map(String::as_str)
    }

    /// Path parameter populated by dispatch.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize a JSON body.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Where a request entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationSource {
    /// Raw HTTP over a socket, translated by the adapter.
    Http,
    /// Structured event envelope.
    Event,
}

impl InvocationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationSource::Http => "http",
            InvocationSource::Event => "event",
        }
    }
}

/// Execution context threaded through every middleware and handler call.
///
/// Dispatch never enforces `deadline`; it is there for handlers that call
/// out to other services.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    source: InvocationSource,
    started_at: Instant,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a context with a freshly generated request ID.
    pub fn new(source: InvocationSource) -> Self {
        Self::with_request_id(source, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_request_id(source: InvocationSource, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            source,
            started_at: Instant::now(),
            deadline: None,
        }
    }

    /// Set a deadline `timeout` after the context was created.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(self.started_at + timeout);
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn source(&self) -> InvocationSource {
        self.source
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

pub(crate) mod serde_util {
    use serde::{Deserialize, Deserializer};

    /// Treat an explicit `null` like a missing field.
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Body bytes travel as a JSON string. Binary bodies must be base64
    /// encoded by the caller first.
    pub mod body {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&String::from_utf8_lossy(body))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
            Ok(Option::<String>::deserialize(deserializer)?
                .map(String::into_bytes)
                .unwrap_or_default())
        }
    }
}
