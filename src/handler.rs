use axum::{Json, extract::Path, http::StatusCode, response::IntoResponse};
use mongodb::bson::{Document, oid::ObjectId};
use serde::Serialize;
use serde_json::Value;

use crate::body::JsonBody;
use crate::error::GatewayError;
use crate::json::{bson_to_json, document_to_json, json_to_document};
use crate::resolver::CollectionRef;
use crate::store::{CollectionHandle, DocumentStore};

pub const WELCOME: &str = "Welcome! Select a collection, e.g., /collections/Lessons";
pub const NOT_FOUND: &str = "File Not Found!";

/// Body returned by `POST /collections/{collectionName}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

/// `{"msg":"success"}` when exactly one document was affected, `{"msg":"error"}`
/// otherwise.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Outcome {
    pub msg: &'static str,
}

impl Outcome {
    pub fn from_count(count: u64) -> Self {
        let msg = if count == 1 { "success" } else { "error" };
        Self { msg }
    }
}

fn into_document(body: Value) -> Result<Document, GatewayError> {
    json_to_document(body).ok_or(GatewayError::NotADocument)
}

fn parse_id(id: &str) -> Result<ObjectId, GatewayError> {
    ObjectId::parse_str(id).map_err(|source| GatewayError::InvalidId {
        id: id.to_string(),
        source,
    })
}

pub async fn root() -> &'static str {
    WELCOME
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NOT_FOUND)
}

pub async fn get_all<S: DocumentStore>(
    CollectionRef(coll): CollectionRef<S>,
) -> Result<Json<Vec<Value>>, GatewayError> {
    let docs = coll.find_all().await?;
    Ok(Json(docs.into_iter().map(document_to_json).collect()))
}

pub async fn get_one<S: DocumentStore>(
    CollectionRef(coll): CollectionRef<S>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Value>, GatewayError> {
    let id = parse_id(&id)?;
    let doc = coll.find_one(id).await?;
    Ok(Json(doc.map(document_to_json).unwrap_or(Value::Null)))
}

pub async fn create<S: DocumentStore>(
    CollectionRef(coll): CollectionRef<S>,
    JsonBody(input): JsonBody,
) -> Result<Json<InsertOutcome>, GatewayError> {
    let inserted = coll.insert_one(into_document(input)?).await?;
    Ok(Json(InsertOutcome {
        acknowledged: inserted.acknowledged,
        inserted_id: bson_to_json(inserted.id),
    }))
}

pub async fn update<S: DocumentStore>(
    CollectionRef(coll): CollectionRef<S>,
    Path((_, id)): Path<(String, String)>,
    JsonBody(input): JsonBody,
) -> Result<Json<Outcome>, GatewayError> {
    let id = parse_id(&id)?;
    let fields = into_document(input)?;
    let matched = coll.update_one(id, fields).await?;
    Ok(Json(Outcome::from_count(matched)))
}

pub async fn delete<S: DocumentStore>(
    CollectionRef(coll): CollectionRef<S>,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<Outcome>, GatewayError> {
    let id = parse_id(&id)?;
    let deleted = coll.delete_one(id).await?;
    Ok(Json(Outcome::from_count(deleted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_requires_exactly_one() {
        assert_eq!(Outcome::from_count(1).msg, "success");
        assert_eq!(Outcome::from_count(0).msg, "error");
        assert_eq!(Outcome::from_count(2).msg, "error");
    }

    #[test]
    fn test_parse_id_rejects_malformed_segments() {
        assert!(parse_id("65a1f0c2e4b0a1b2c3d4e5f6").is_ok());
        assert!(matches!(
            parse_id("abc123"),
            Err(GatewayError::InvalidId { id, .. }) if id == "abc123"
        ));
    }

    #[test]
    fn test_only_objects_are_documents() {
        assert!(into_document(serde_json::json!({ "k": "v" })).is_ok());
        assert!(matches!(
            into_document(serde_json::json!([1, 2])),
            Err(GatewayError::NotADocument)
        ));
    }

    #[test]
    fn test_insert_outcome_uses_driver_field_names() {
        let outcome = InsertOutcome {
            acknowledged: true,
            inserted_id: Value::String("65a1f0c2e4b0a1b2c3d4e5f6".into()),
        };
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            serde_json::json!({
                "acknowledged": true,
                "insertedId": "65a1f0c2e4b0a1b2c3d4e5f6",
            })
        );
    }
}
