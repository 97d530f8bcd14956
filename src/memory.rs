//! In-process document store with MongoDB-like write semantics.
//!
//! Backs the HTTP tests and local runs without a database. Collections are
//! created on first insert, scans return insertion order, `_id` is generated
//! when missing and can never be changed by an update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};

use crate::error::StoreError;
use crate::store::{CollectionHandle, DocumentStore, Inserted};

type Collections = HashMap<String, Vec<Document>>;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the collections that hold at least one write.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.collections).keys().cloned().collect();
        names.sort();
        names
    }
}

impl DocumentStore for MemoryStore {
    type Collection = MemoryCollection;

    fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            name: name.to_string(),
            collections: Arc::clone(&self.collections),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MemoryCollection {
    name: String,
    collections: Arc<Mutex<Collections>>,
}

fn lock(collections: &Mutex<Collections>) -> MutexGuard<'_, Collections> {
    collections.lock().unwrap_or_else(PoisonError::into_inner)
}

fn has_id(doc: &Document, id: &Bson) -> bool {
    doc.get("_id") == Some(id)
}

impl MemoryCollection {
    fn position(docs: &[Document], id: ObjectId) -> Option<usize> {
        let id = Bson::ObjectId(id);
        docs.iter().position(|doc| has_id(doc, &id))
    }
}

impl CollectionHandle for MemoryCollection {
    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        Ok(lock(&self.collections)
            .get(&self.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        let collections = lock(&self.collections);
        let Some(docs) = collections.get(&self.name) else {
            return Ok(None);
        };
        Ok(Self::position(docs, id).map(|i| docs[i].clone()))
    }

    async fn insert_one(&self, doc: Document) -> Result<Inserted, StoreError> {
        let mut collections = lock(&self.collections);
        let docs = collections.entry(self.name.clone()).or_default();

        let (id, stored) = match doc.get("_id").cloned() {
            Some(id) => {
                if docs.iter().any(|existing| has_id(existing, &id)) {
                    return Err(StoreError::Rejected(format!(
                        "E11000 duplicate key error collection: {} index: _id_ dup key: {{ _id: {id} }}",
                        self.name
                    )));
                }
                (id, doc)
            }
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                let mut stored = doc! { "_id": id.clone() };
                for (key, value) in doc {
                    stored.insert(key, value);
                }
                (id, stored)
            }
        };

        docs.push(stored);
        Ok(Inserted {
            id,
            acknowledged: true,
        })
    }

    async fn update_one(&self, id: ObjectId, fields: Document) -> Result<u64, StoreError> {
        let mut collections = lock(&self.collections);
        let Some(docs) = collections.get_mut(&self.name) else {
            return Ok(0);
        };
        let Some(i) = Self::position(docs, id) else {
            return Ok(0);
        };

        if fields
            .get("_id")
            .is_some_and(|new_id| *new_id != Bson::ObjectId(id))
        {
            return Err(StoreError::Rejected(
                "Performing an update on the path '_id' would modify the immutable field '_id'"
                    .to_string(),
            ));
        }

        let target = &mut docs[i];
        for (key, value) in fields {
            target.insert(key, value);
        }
        Ok(1)
    }

    async fn delete_one(&self, id: ObjectId) -> Result<u64, StoreError> {
        let mut collections = lock(&self.collections);
        let Some(docs) = collections.get_mut(&self.name) else {
            return Ok(0);
        };
        match Self::position(docs, id) {
            Some(i) => {
                docs.remove(i);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_id(inserted: Inserted) -> ObjectId {
        inserted.id.as_object_id().expect("generated id is an ObjectId")
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let docs = store.collection("Nobody").find_all().await.unwrap();
        assert!(docs.is_empty());
        assert!(store.collection_names().is_empty());
    }

    #[tokio::test]
    async fn test_insert_generates_leading_id() {
        let store = MemoryStore::new();
        let lessons = store.collection("Lessons");

        let id = object_id(lessons.insert_one(doc! { "title": "Intro" }).await.unwrap());
        let stored = lessons.find_one(id).await.unwrap().unwrap();

        assert_eq!(stored, doc! { "_id": id, "title": "Intro" });
        assert_eq!(stored.keys().next().map(String::as_str), Some("_id"));
        assert_eq!(store.collection_names(), vec!["Lessons".to_string()]);
    }

    #[tokio::test]
    async fn test_insert_keeps_supplied_id_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let lessons = store.collection("Lessons");

        let inserted = lessons.insert_one(doc! { "_id": "intro" }).await.unwrap();
        assert_eq!(inserted.id, Bson::String("intro".into()));
        assert!(inserted.acknowledged);

        let err = lessons.insert_one(doc! { "_id": "intro" }).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(msg) if msg.starts_with("E11000")));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let lessons = store.collection("Lessons");
        let id = object_id(
            lessons
                .insert_one(doc! { "title": "Intro", "seats": 5 })
                .await
                .unwrap(),
        );

        let matched = lessons
            .update_one(id, doc! { "title": "Intro 2", "room": "B" })
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let stored = lessons.find_one(id).await.unwrap().unwrap();
        assert_eq!(
            stored,
            doc! { "_id": id, "title": "Intro 2", "seats": 5, "room": "B" }
        );
    }

    #[tokio::test]
    async fn test_update_cannot_change_id() {
        let store = MemoryStore::new();
        let lessons = store.collection("Lessons");
        let id = object_id(lessons.insert_one(doc! {}).await.unwrap());

        let same = lessons.update_one(id, doc! { "_id": id }).await.unwrap();
        assert_eq!(same, 1);

        let err = lessons
            .update_one(id, doc! { "_id": ObjectId::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_missing_ids_match_nothing() {
        let store = MemoryStore::new();
        let lessons = store.collection("Lessons");
        let absent = ObjectId::new();

        assert_eq!(lessons.find_one(absent).await.unwrap(), None);
        assert_eq!(lessons.update_one(absent, doc! { "k": "v" }).await.unwrap(), 0);
        assert_eq!(lessons.delete_one(absent).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_once() {
        let store = MemoryStore::new();
        let lessons = store.collection("Lessons");
        let id = object_id(lessons.insert_one(doc! { "title": "Intro" }).await.unwrap());

        assert_eq!(lessons.delete_one(id).await.unwrap(), 1);
        assert_eq!(lessons.delete_one(id).await.unwrap(), 0);
        assert!(lessons.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store
            .collection("Lessons")
            .insert_one(doc! { "title": "Intro" })
            .await
            .unwrap();

        assert!(store.collection("Orders").find_all().await.unwrap().is_empty());
        assert_eq!(store.collection("Lessons").find_all().await.unwrap().len(), 1);
    }
}
