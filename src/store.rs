//! The document store seam and its MongoDB implementation.

use std::future::Future;

use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, Document, doc, oid::ObjectId},
    options::{Acknowledgment, ClientOptions, ServerApi, ServerApiVersion, WriteConcern},
};
use tracing::debug;

use crate::config::DbConfig;
use crate::error::StoreError;

/// A database that hands out collections by name.
///
/// Resolving a collection never fails: a name nobody wrote to yet behaves
/// like an empty collection and is created by the first insert.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    type Collection: CollectionHandle;

    fn collection(&self, name: &str) -> Self::Collection;
}

/// Result of an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Inserted {
    /// `_id` of the stored document, generated if absent.
    pub id: Bson,
    /// `false` when the write was sent with `w: 0` and never confirmed.
    pub acknowledged: bool,
}

/// The five operations the gateway issues, one store round-trip each.
pub trait CollectionHandle: Send + Sync + 'static {
    /// Every document, in natural order.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    fn find_one(
        &self,
        id: ObjectId,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    fn insert_one(
        &self,
        doc: Document,
    ) -> impl Future<Output = Result<Inserted, StoreError>> + Send;

    /// `$set` the given fields on the document with this id. Returns the
    /// matched count.
    fn update_one(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Returns the deleted count.
    fn delete_one(&self, id: ObjectId) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Process-wide handle on one MongoDB database.
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Open the connection and prove it works with a `ping`.
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.connection_uri()).await?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

        let client = Client::with_options(options)?;
        let db = client.database(&config.db_name);
        db.run_command(doc! { "ping": 1 }).await?;
        debug!(database = %config.db_name, "ping acknowledged");

        Ok(Self { db })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }
}

impl DocumentStore for MongoStore {
    type Collection = MongoCollection;

    fn collection(&self, name: &str) -> MongoCollection {
        MongoCollection(self.db.collection(name))
    }
}

/// A MongoDB collection of untyped documents.
#[derive(Clone, Debug)]
pub struct MongoCollection(Collection<Document>);

impl CollectionHandle for MongoCollection {
    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        let cursor = self.0.find(doc! {}).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self.0.find_one(doc! { "_id": id }).await?)
    }

    async fn insert_one(&self, doc: Document) -> Result<Inserted, StoreError> {
        let result = self.0.insert_one(doc).await?;
        Ok(Inserted {
            id: result.inserted_id,
            acknowledged: acknowledges(self.0.write_concern()),
        })
    }

    async fn update_one(&self, id: ObjectId, fields: Document) -> Result<u64, StoreError> {
        let result = self
            .0
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, id: ObjectId) -> Result<u64, StoreError> {
        let result = self.0.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }
}

/// Only an explicit `w: 0` turns acknowledgement off.
fn acknowledges(concern: Option<&WriteConcern>) -> bool {
    !matches!(
        concern.and_then(|concern| concern.w.as_ref()),
        Some(Acknowledgment::Nodes(0))
    )
}
