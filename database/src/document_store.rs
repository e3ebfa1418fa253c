use std::sync::Arc;

use futures::TryStreamExt as _;
use mongodb::bson::Bson;
use mongodb::bson::Document;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use tracing::debug;
use tracing::trace;
use url::Url;

use crate::DatabaseError;
use crate::in_memory::InMemoryEngine;

#[derive(Clone)]
pub enum Config {
    /// Keeps every document in the process memory. This should not be used in production.
    InMemory { database: String },
    Mongo { url: Url, database: String },
}

/// Handle over a document database
///
/// Cloning is cheap and every clone shares the same connections, so a single store can
/// serve any number of concurrent requests.
#[derive(Clone)]
pub struct DocumentStore {
    inner: StoreInner,
    database: String,
}

#[derive(Clone)]
enum StoreInner {
    Mongo(mongodb::Client),
    InMemory(Arc<InMemoryEngine>),
}

#[derive(Debug, thiserror::Error)]
#[error("an error occurred while setting up the document store client: '{0}'")]
pub struct StoreBuildError(#[from] mongodb::error::Error);

#[derive(Debug, thiserror::Error)]
#[error("could not ping the document store: '{0}'")]
pub struct PingError(#[from] DatabaseError);

/// Counters reported by a single document update
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl DocumentStore {
    /// Creates the store client
    ///
    /// The MongoDB driver connects lazily: use [DocumentStore::ping] to make sure the server
    /// is reachable.
    pub async fn new(config: Config) -> Result<Self, StoreBuildError> {
        match config {
            Config::InMemory { database } => Ok(Self::in_memory(database)),
            Config::Mongo { url, database } => {
                let options = ClientOptions::parse(url.as_str()).await?;
                let client = mongodb::Client::with_options(options)?;
                debug!(%database, "document store client created");
                Ok(Self {
                    inner: StoreInner::Mongo(client),
                    database,
                })
            }
        }
    }

    pub fn in_memory(database: impl Into<String>) -> Self {
        Self {
            inner: StoreInner::InMemory(Arc::new(InMemoryEngine::new())),
            database: database.into(),
        }
    }

    /// Creates an empty in-memory store for testing purposes
    #[cfg(any(test, feature = "testing"))]
    pub fn for_tests() -> Self {
        Self::in_memory("test")
    }

    /// Creates an empty in-memory store answering every operation after `latency`
    #[cfg(any(test, feature = "testing"))]
    pub fn for_tests_with_latency(latency: std::time::Duration) -> Self {
        Self {
            inner: StoreInner::InMemory(Arc::new(InMemoryEngine::with_latency(latency))),
            database: "test".to_owned(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self, name: &str) -> Collection {
        let inner = match &self.inner {
            StoreInner::Mongo(client) => {
                CollectionInner::Mongo(client.database(&self.database).collection(name))
            }
            StoreInner::InMemory(engine) => CollectionInner::InMemory {
                engine: engine.clone(),
                namespace: format!("{}.{name}", self.database),
            },
        };
        Collection { inner }
    }

    pub async fn ping(&self) -> Result<(), PingError> {
        if let StoreInner::Mongo(client) = &self.inner {
            client
                .database(&self.database)
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(DatabaseError::from)?;
        }
        trace!("Document store ping successful");
        Ok(())
    }

    pub async fn list_database_names(&self) -> Result<Vec<String>, DatabaseError> {
        match &self.inner {
            StoreInner::Mongo(client) => Ok(client.list_database_names().await?),
            StoreInner::InMemory(_) => Ok(vec![self.database.clone()]),
        }
    }

    /// Closes the connections once every pending operation is done
    pub async fn shutdown(self) {
        if let StoreInner::Mongo(client) = self.inner {
            client.shutdown().await;
        }
        debug!("document store shut down");
    }
}

/// A collection of schema-less documents
#[derive(Clone)]
pub struct Collection {
    inner: CollectionInner,
}

#[derive(Clone)]
enum CollectionInner {
    Mongo(mongodb::Collection<Document>),
    InMemory {
        engine: Arc<InMemoryEngine>,
        namespace: String,
    },
}

impl Collection {
    #[tracing::instrument(name = "store:find", skip(self), err)]
    pub async fn find(&self, filter: Document) -> Result<Vec<Document>, DatabaseError> {
        match &self.inner {
            CollectionInner::Mongo(collection) => {
                let cursor = collection.find(filter).await?;
                Ok(cursor.try_collect().await?)
            }
            CollectionInner::InMemory { engine, namespace } => {
                engine.find(namespace, &filter).await
            }
        }
    }

    #[tracing::instrument(name = "store:find_one", skip(self), err)]
    pub async fn find_one(&self, filter: Document) -> Result<Option<Document>, DatabaseError> {
        match &self.inner {
            CollectionInner::Mongo(collection) => Ok(collection.find_one(filter).await?),
            CollectionInner::InMemory { engine, namespace } => {
                engine.find_one(namespace, &filter).await
            }
        }
    }

    /// Inserts a document and returns its `_id`, generated when the document has none
    #[tracing::instrument(name = "store:insert_one", skip_all, err)]
    pub async fn insert_one(&self, document: Document) -> Result<Bson, DatabaseError> {
        match &self.inner {
            CollectionInner::Mongo(collection) => {
                Ok(collection.insert_one(document).await?.inserted_id)
            }
            CollectionInner::InMemory { engine, namespace } => {
                engine.insert_one(namespace, document).await
            }
        }
    }

    #[tracing::instrument(name = "store:update_one", skip(self), ret, err)]
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, DatabaseError> {
        match &self.inner {
            CollectionInner::Mongo(collection) => {
                let result = collection.update_one(filter, update).await?;
                Ok(UpdateOutcome {
                    matched: result.matched_count,
                    modified: result.modified_count,
                })
            }
            CollectionInner::InMemory { engine, namespace } => {
                engine.update_one(namespace, &filter, &update).await
            }
        }
    }

    /// Deletes the first document matching `filter` and returns the number of deleted documents
    #[tracing::instrument(name = "store:delete_one", skip(self), ret, err)]
    pub async fn delete_one(&self, filter: Document) -> Result<u64, DatabaseError> {
        match &self.inner {
            CollectionInner::Mongo(collection) => {
                Ok(collection.delete_one(filter).await?.deleted_count)
            }
            CollectionInner::InMemory { engine, namespace } => {
                engine.delete_one(namespace, &filter).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn collections_are_isolated_by_database_and_name() {
        let store = DocumentStore::for_tests();
        store
            .collection("blogs")
            .insert_one(doc! { "title": "T" })
            .await
            .unwrap();
        let other = DocumentStore {
            database: "other".to_owned(),
            ..store.clone()
        };

        assert_eq!(store.collection("blogs").find(doc! {}).await.unwrap().len(), 1);
        assert!(store.collection("drafts").find(doc! {}).await.unwrap().is_empty());
        assert!(other.collection("blogs").find(doc! {}).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_same_documents() {
        let store = DocumentStore::for_tests();
        let clone = store.clone();
        let id = clone
            .collection("blogs")
            .insert_one(doc! { "title": "T" })
            .await
            .unwrap();
        let found = store
            .collection("blogs")
            .find_one(doc! { "_id": id })
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn in_memory_store_is_always_reachable() {
        let store = DocumentStore::new(Config::InMemory {
            database: "mongoDemo".to_owned(),
        })
        .await
        .unwrap();
        store.ping().await.unwrap();
        assert_eq!(store.database(), "mongoDemo");
        assert_eq!(
            store.list_database_names().await.unwrap(),
            vec!["mongoDemo".to_owned()]
        );
    }
}
