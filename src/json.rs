//! Conversions between request/response JSON and BSON.
//!
//! Outbound matches what a JavaScript client sees from `JSON.stringify` on
//! driver results: ObjectIds become their hex string, dates become ISO-8601
//! strings. Everything else falls back to relaxed extended JSON.
//!
//! Inbound follows the Node driver's number encoding: integral values that
//! fit in 32 bits are stored as `Int32`, every other number as `Double`.

use mongodb::bson::{Bson, Document};
use serde_json::{Number, Value};

/// The request body as a document, or `None` if it is not a JSON object.
pub fn json_to_document(value: Value) -> Option<Document> {
    match json_to_bson(value) {
        Bson::Document(doc) => Some(doc),
        _ => None,
    }
}

pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => number_to_bson(&n),
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.into_iter()
                .map(|(key, value)| (key, json_to_bson(value)))
                .collect(),
        ),
    }
}

fn number_to_bson(n: &Number) -> Bson {
    if let Some(i) = n.as_i64().and_then(|i| i32::try_from(i).ok()) {
        return Bson::Int32(i);
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) => {
            Bson::Int32(f as i32)
        }
        Some(f) => Bson::Double(f),
        None => Bson::Null,
    }
}

pub fn document_to_json(doc: Document) -> Value {
    Value::Object(
        doc.into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect(),
    )
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(iso) => Value::String(iso),
            Err(_) => Bson::DateTime(dt).into_relaxed_extjson(),
        },
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
