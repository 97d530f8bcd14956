//! Error types for configuration, the document store and request handling.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson;
use thiserror::Error;

/// Failure while loading the database properties file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
}

/// Failure reported by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// The store refused the write, e.g. a duplicate `_id`.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Every way a collection request can fail after routing.
///
/// All variants collapse into the same generic 500 response; the cause is
/// only visible in the server log.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid ObjectId `{id}`: {source}")]
    InvalidId {
        id: String,
        #[source]
        source: bson::oid::Error,
    },

    #[error("request body is not a JSON object")]
    NotADocument,

    #[error("missing path parameter `{0}`")]
    MissingParam(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
