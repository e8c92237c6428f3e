use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use sqlx::{Pool, Postgres};
use tracing::warn;

use crate::{
    dao::documents::DocumentDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        db::{Collection, Document, FieldFilter},
    },
};

/**
 * Read access to the document store the dashboard writes to.
 */
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /**
     * All documents of a collection, in store order.
     */
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, ApplicationError>;

    /**
     * Number of documents in a collection, optionally filtered on a field value.
     */
    async fn count(&self, collection: Collection, filter: Option<FieldFilter>) -> Result<u64, ApplicationError>;
}

/**
 * Document store backed by the Postgres `documents` table. Each call checks out its own connection so that parallel reads do not serialize.
 */
pub struct PostgresDocumentStore {
    /**
     * The DAO for document queries.
     */
    document_dao: DocumentDao,
    /**
     * Connection pool for database operations.
     */
    connection_pool: Arc<Pool<Postgres>>,
}

impl PostgresDocumentStore {
    pub fn new(document_dao: DocumentDao, connection_pool: Arc<Pool<Postgres>>) -> Self {
        PostgresDocumentStore { document_dao, connection_pool }
    }
}

impl DocumentStore for PostgresDocumentStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.document_dao.list_documents(&mut connection, collection).await
    }

    async fn count(&self, collection: Collection, filter: Option<FieldFilter>) -> Result<u64, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.document_dao.count_documents(&mut connection, collection, filter).await
    }
}

/**
 * Document store held in memory, loaded from a JSON seed of the form `{ "cars": [ { "id": "..", .. } ], .. }`.
 */
#[derive(Debug, Default, Clone)]
pub struct SeedDocumentStore {
    collections: HashMap<Collection, Vec<Document>>,
}

impl SeedDocumentStore {
    /**
     * Parses a JSON seed. Unknown collections are skipped, documents without a string `id` are rejected.
     *
     * # Arguments
     * `seed`: The JSON seed contents.
     *
     * # Returns
     * A Result containing the store or an `ApplicationError` of type `Initialization`.
     */
    pub fn from_json(seed: &str) -> Result<Self, ApplicationError> {
        let root: Value = serde_json::from_str(seed).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to parse seed data: {err}")))?;
        let Value::Object(entries) = root else {
            return Err(ApplicationError::new(ErrorType::Initialization, "Seed data must be a JSON object keyed by collection".to_string()));
        };
        let mut store = SeedDocumentStore::default();
        for (name, documents) in entries {
            let Ok(collection) = Collection::from_str(&name) else {
                warn!("Skipping unknown collection {} in seed data", name);
                continue;
            };
            let Value::Array(documents) = documents else {
                return Err(ApplicationError::new(ErrorType::Initialization, format!("Seed collection {name} must be an array")));
            };
            let documents = documents
                .into_iter()
                .enumerate()
                .map(|(position, data)| match data.get("id").and_then(Value::as_str) {
                    Some(id) => Ok(Document::new(id, data.clone())),
                    None => Err(ApplicationError::new(ErrorType::Initialization, format!("Document {position} in {name} has no string id"))),
                })
                .collect::<Result<Vec<Document>, ApplicationError>>()?;
            store.collections.insert(collection, documents);
        }
        Ok(store)
    }

    /**
     * Reads and parses a JSON seed file.
     */
    pub fn from_file(path: &str) -> Result<Self, ApplicationError> {
        let seed = std::fs::read_to_string(path).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read seed file {path}: {err}")))?;
        Self::from_json(&seed)
    }

    /**
     * Replaces the documents of a collection.
     */
    pub fn with_documents(mut self, collection: Collection, documents: Vec<Document>) -> Self {
        self.collections.insert(collection, documents);
        self
    }

    fn documents(&self, collection: Collection) -> &[Document] {
        self.collections.get(&collection).map(Vec::as_slice).unwrap_or_default()
    }
}

impl DocumentStore for SeedDocumentStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, ApplicationError> {
        Ok(self.documents(collection).to_vec())
    }

    async fn count(&self, collection: Collection, filter: Option<FieldFilter>) -> Result<u64, ApplicationError> {
        let documents = self.documents(collection);
        let matching = match filter {
            Some(filter) => documents.iter().filter(|document| filter.matches(document)).count(),
            None => documents.len(),
        };
        u64::try_from(matching).map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Invalid count for {collection}: {err}")))
    }
}

/**
 * The store selected in the configuration.
 */
pub enum ConfiguredStore {
    Postgres(PostgresDocumentStore),
    Seed(SeedDocumentStore),
}

impl DocumentStore for ConfiguredStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, ApplicationError> {
        match self {
            ConfiguredStore::Postgres(store) => store.list_all(collection).await,
            ConfiguredStore::Seed(store) => store.list_all(collection).await,
        }
    }

    async fn count(&self, collection: Collection, filter: Option<FieldFilter>) -> Result<u64, ApplicationError> {
        match self {
            ConfiguredStore::Postgres(store) => store.count(collection, filter).await,
            ConfiguredStore::Seed(store) => store.count(collection, filter).await,
        }
    }
}
