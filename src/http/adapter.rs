//! Protocol adapter between socket-level HTTP and the structured model.
//!
//! # Responsibilities
//! - Turn an inbound `http::Request` into a [`ProxyRequest`]
//! - Turn a [`ProxyResponse`] back into an `http::Response`
//!
//! # Design Decisions
//! - Never fails: malformed headers or query strings yield lossy or empty
//!   entries, and an unreadable body becomes an empty body
//! - Header names are canonicalized (`user-agent` → `User-Agent`) because the
//!   wire type lowercases them and handlers look them up by canonical name
//! - Single-value maps keep the last occurrence, multi-value maps keep all
//! - No streaming: bodies are fully materialized in both directions

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode};

use crate::http::{ProxyRequest, ProxyResponse};

/// Canonical MIME header casing: first letter and every letter after a
/// hyphen upper-cased, everything else lower-cased.
pub fn canonical_header_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Build a structured request from a socket-level request.
///
/// Reads at most `body_limit` bytes of body; a read failure leaves the body
/// empty. The base64 flag is always `false` on this path.
pub async fn to_structured_request(request: Request<Body>, body_limit: usize) -> ProxyRequest {
    let (parts, body) = request.into_parts();

    let mut headers = HashMap::new();
    let mut multi_value_headers: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in parts.headers.iter() {
        let key = canonical_header_key(name.as_str());
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        multi_value_headers
            .entry(key.clone())
            .or_default()
            .push(value.clone());
        headers.insert(key, value);
    }

    let mut query_string_parameters = HashMap::new();
    let mut multi_value_query_string_parameters: HashMap<String, Vec<String>> = HashMap::new();
    if let Some(query) = parts.uri.query() {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if name.is_empty() {
                continue;
            }
            multi_value_query_string_parameters
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
            query_string_parameters.insert(name.into_owned(), value.into_owned());
        }
    }

    let body = match axum::body::to_bytes(body, body_limit).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit = body_limit,
                error = %e,
                "Failed to read request body, treating as empty"
            );
            Vec::new()
        }
    };

    ProxyRequest {
        http_method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        headers,
        multi_value_headers,
        query_string_parameters,
        multi_value_query_string_parameters,
        path_parameters: HashMap::new(),
        stage_variables: HashMap::new(),
        body,
        is_base64_encoded: false,
    }
}

/// Build a socket-level response from a structured response.
///
/// Status first, then headers (single-value, then multi-value appended),
/// then the body. Invalid status codes become `500`; header pairs the wire
/// type rejects are skipped.
pub fn from_structured_response(response: ProxyResponse) -> Response<Body> {
    let status = StatusCode::from_u16(response.status_code).unwrap_or_else(|_| {
        tracing::warn!(status = response.status_code, "Invalid status code, using 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut out = Response::new(Body::empty());
    *out.status_mut() = status;

    let headers = out.headers_mut();
    for (name, value) in &response.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }
    for (name, values) in &response.multi_value_headers {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = %name, "Skipping invalid response header");
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(header_name.clone(), value);
                }
                Err(_) => tracing::warn!(header = %name, "Skipping invalid response header value"),
            }
        }
    }

    *out.body_mut() = Body::from(response.body);
    out
}
