//! Round-trips against a live MongoDB. Ignored by default; run with
//! `DOCGATE_TEST_URI=mongodb://localhost:27017 cargo test -- --ignored`.

use docgate::{CollectionHandle, DocumentStore, MongoStore};
use mongodb::{
    Client,
    bson::{doc, oid::ObjectId},
};

async fn store() -> MongoStore {
    let uri = std::env::var("DOCGATE_TEST_URI").expect("DOCGATE_TEST_URI is set");
    let client = Client::with_uri_str(uri).await.unwrap();
    MongoStore::from_database(client.database("docgate_test"))
}

#[tokio::test]
#[ignore = "needs a running MongoDB"]
async fn test_crud_against_mongodb() {
    let store = store().await;
    let name = format!("lessons_{}", ObjectId::new().to_hex());
    let lessons = store.collection(&name);

    assert!(lessons.find_all().await.unwrap().is_empty());

    let id = lessons
        .insert_one(doc! { "title": "Intro", "room": "A" })
        .await
        .unwrap()
        .id
        .as_object_id()
        .unwrap();

    assert_eq!(lessons.update_one(id, doc! { "title": "Intro 2" }).await.unwrap(), 1);
    assert_eq!(
        lessons.find_one(id).await.unwrap(),
        Some(doc! { "_id": id, "title": "Intro 2", "room": "A" })
    );

    assert_eq!(lessons.delete_one(id).await.unwrap(), 1);
    assert_eq!(lessons.delete_one(id).await.unwrap(), 0);
    assert_eq!(lessons.update_one(id, doc! { "k": "v" }).await.unwrap(), 0);
    assert_eq!(lessons.find_one(id).await.unwrap(), None);
}
