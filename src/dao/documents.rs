use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    db::{Collection, Document, FieldFilter, QueryDocumentDbResp},
};

/**
 * SQL query to list every document of a collection in insertion order.
 */
const QUERY_DOCUMENT_LIST: &str = "SELECT id, data FROM documents WHERE collection = $1 ORDER BY seq";

/**
 * SQL query to count documents of a collection, optionally where a top level field equals a value.
 */
const QUERY_DOCUMENT_COUNT: &str = "SELECT COUNT(*) FROM documents WHERE collection = $1 AND ($2::text IS NULL OR data ->> $2 = $3)";

/**
 * DAO for reading dashboard documents from the `documents` table.
 */
pub struct DocumentDao {}

impl DocumentDao {
    /**
     * Creates a new instance of `DocumentDao`.
     *
     * # Returns
     * A new instance of `DocumentDao`.
     */
    pub fn new() -> Self {
        DocumentDao {}
    }

    /**
     * Lists all documents of a collection.
     *
     * # Arguments
     * `connection`: The database connection.
     * `collection`: The collection to read.
     *
     * # Returns
     * A Result containing the documents in store order or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn list_documents(&self, connection: &mut PgConnection, collection: Collection) -> Result<Vec<Document>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryDocumentDbResp> = sqlx::query_as(QUERY_DOCUMENT_LIST)
            .bind(collection.as_str())
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to list {collection}: {err}")))?;
        tracing::debug!("Read {} documents from {}", results.len(), collection);
        Ok(results.into_iter().map(Document::from).collect())
    }

    /**
     * Counts documents of a collection.
     *
     * # Arguments
     * `connection`: The database connection.
     * `collection`: The collection to count.
     * `filter`: Optional equality filter on a top level field.
     *
     * # Returns
     * A Result containing the number of matching documents or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn count_documents(&self, connection: &mut PgConnection, collection: Collection, filter: Option<FieldFilter>) -> Result<u64, ApplicationError> {
        let span = tracing::Span::current();
        let (field, value) = match filter {
            Some(filter) => (Some(filter.field), Some(filter.value)),
            None => (None, None),
        };
        let count: (i64,) = sqlx::query_as(QUERY_DOCUMENT_COUNT)
            .bind(collection.as_str())
            .bind(field)
            .bind(value)
            .fetch_one(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to count {collection}: {err}")))?;
        u64::try_from(count.0).map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Invalid count for {collection}: {err}")))
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use serde_json::json;
    use sqlx::PgPool;

    const INSERT_DOCUMENT: &str = "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)";

    #[sqlx::test]
    async fn test_list_documents_in_insert_order() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        for (id, name) in [("st-b", "Harbour"), ("st-a", "Airport")] {
            sqlx::query(INSERT_DOCUMENT).bind("stations").bind(id).bind(json!({"name": name})).execute(&mut *transaction).await.unwrap();
        }
        let document_dao = DocumentDao::new();
        let documents = document_dao.list_documents(&mut transaction, Collection::Stations).await.unwrap();
        assert_eq!(documents.iter().map(|document| document.id.as_str()).collect::<Vec<_>>(), vec!["st-b", "st-a"]);
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_count_documents_with_filter() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        for (id, status) in [("r1", "Active"), ("r2", "Completed"), ("r3", "Active")] {
            sqlx::query(INSERT_DOCUMENT).bind("rentals").bind(id).bind(json!({"status": status})).execute(&mut *transaction).await.unwrap();
        }
        let document_dao = DocumentDao::new();
        let all = document_dao.count_documents(&mut transaction, Collection::Rentals, None).await.unwrap();
        let active = document_dao.count_documents(&mut transaction, Collection::Rentals, Some(FieldFilter::new("status", "Active"))).await.unwrap();
        assert_eq!(all, 3);
        assert_eq!(active, 2);
        transaction.rollback().await.unwrap();
    }

    /**
     * Initialize the database connection pool.
     */
    async fn init_db() -> PgPool {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        pool
    }
}
