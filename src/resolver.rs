//! Turns the `collectionName` path segment into a collection handle.

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::request::Parts,
};
use tracing::trace;

use crate::error::GatewayError;
use crate::store::DocumentStore;

pub const COLLECTION_PARAM: &str = "collectionName";

/// The collection named in the request path, resolved against the shared
/// store. Any name is accepted.
pub struct CollectionRef<S: DocumentStore>(pub S::Collection);

impl<S: DocumentStore> FromRequestParts<S> for CollectionRef<S> {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, store: &S) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, store)
            .await
            .map_err(|_| GatewayError::MissingParam(COLLECTION_PARAM))?;
        let name = params
            .iter()
            .find_map(|(key, value)| (key == COLLECTION_PARAM).then_some(value))
            .ok_or(GatewayError::MissingParam(COLLECTION_PARAM))?;

        trace!(collection = name, "resolved collection");
        Ok(Self(store.collection(name)))
    }
}
