//! Request body parsing for inserts and updates.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::debug;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 100 * 1024;

/// A JSON request body.
///
/// Only `application/json` bodies are parsed; any other content type, or an
/// empty body, yields an empty object. Malformed JSON and top-level scalars
/// are rejected with 400.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Ok(Self(Value::Object(Map::new())));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if bytes.is_empty() {
            return Ok(Self(Value::Object(Map::new())));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Ok(Self(value)),
            Ok(_) => Err(bad_request("top-level JSON value must be an object or array")),
            Err(e) => Err(bad_request(&e.to_string())),
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn bad_request(reason: &str) -> Response {
    debug!(reason, "rejected request body");
    (StatusCode::BAD_REQUEST, "Bad Request").into_response()
}
