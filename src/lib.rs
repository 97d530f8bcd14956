//! # docgate
//!
//! Exposes every collection of a MongoDB database as a REST resource.
//!
//! | Route | Store call |
//! |---|---|
//! | `GET /collections/{collectionName}` | find all |
//! | `GET /collections/{collectionName}/{id}` | find one by `_id` |
//! | `POST /collections/{collectionName}` | insert one |
//! | `PUT /collections/{collectionName}/{id}` | `$set` on one |
//! | `DELETE /collections/{collectionName}/{id}` | delete one |
//!
//! Collection names are taken verbatim from the path and documents are
//! passed through untouched. There is no schema, validation or auth.
//!
//! ```rust,no_run
//! use docgate::{config::DbConfig, server, store::MongoStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DbConfig::from_file("config/db.properties")?;
//! let store = MongoStore::connect(&config).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! server::serve(listener, server::app(store, "images")).await?;
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod handler;
pub mod json;
pub mod logging;
pub mod memory;
pub mod resolver;
pub mod server;
pub mod store;

pub use error::{ConfigError, GatewayError, StoreError};
pub use memory::MemoryStore;
pub use store::{CollectionHandle, DocumentStore, Inserted, MongoStore};
