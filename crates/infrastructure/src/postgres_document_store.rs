mod filter_sql;

use async_trait::async_trait;
use bandstand_application::{Document, DocumentStore, Filter, FindOptions};
use bandstand_core::{
    AppError, AppResult, FieldViolation, Message, MessageKey, Rejection,
};
use bandstand_domain::Collection;
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::warn;

use filter_sql::{push_filter, push_sort};

/// PostgreSQL-backed document store.
///
/// Every collection lives in the `documents` table as JSONB rows keyed by
/// `(collection, id)`; unique indexes on `code` and band `name` back the
/// uniqueness rules and `document_sequences` holds the code counters.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    data: Value,
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> AppResult<Option<Document>> {
        Ok(self
            .find(collection, filter, &FindOptions::first(1))
            .await?
            .into_iter()
            .next())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> AppResult<Vec<Document>> {
        let limit = i64::try_from(options.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(options.skip).unwrap_or(i64::MAX);

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT data FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());
        builder.push(" AND ");
        push_filter(&mut builder, filter);
        push_sort(&mut builder, &options.sort);
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to query {} documents: {error}",
                    collection.as_str()
                ))
            })?;

        rows.into_iter()
            .map(|row| document_from_row(collection, row))
            .collect()
    }

    async fn insert(&self, collection: Collection, document: Document) -> AppResult<Document> {
        let id = document_id(collection, &document)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_str())
        .bind(Value::Object(document.fields().clone()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(document),
            Err(error) => Err(map_write_error(collection, &document, error)),
        }
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        changes: Map<String, Value>,
        unset: &[String],
    ) -> AppResult<Document> {
        let changed = Document::new(changes);
        let result = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET data = (data || $3) - $4::TEXT[]
            WHERE collection = $1 AND id = $2
            RETURNING data
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Value::Object(changed.fields().clone()))
        .bind(unset)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => document_from_row(collection, row),
            Ok(None) => Err(missing_document(collection, id)),
            Err(error) => Err(map_write_error(collection, &changed, error)),
        }
    }

    async fn add_to_set(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> AppResult<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET data = jsonb_set(
                data,
                ARRAY[$3::TEXT],
                CASE
                    WHEN COALESCE(data -> $3, '[]'::JSONB) @> jsonb_build_array($4::JSONB)
                        THEN COALESCE(data -> $3, '[]'::JSONB)
                    ELSE COALESCE(data -> $3, '[]'::JSONB) || jsonb_build_array($4::JSONB)
                END
            )
            WHERE collection = $1 AND id = $2
            RETURNING data
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            warn!(collection = collection.as_str(), %error, "array append failed");
            AppError::Internal(format!(
                "failed to update {} document: {error}",
                collection.as_str()
            ))
        })?;

        match row {
            Some(row) => document_from_row(collection, row),
            None => Err(missing_document(collection, id)),
        }
    }

    async fn pull(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> AppResult<u64> {
        sqlx::query(
            r#"
            UPDATE documents
            SET data = jsonb_set(
                data,
                ARRAY[$3::TEXT],
                COALESCE(
                    (
                        SELECT jsonb_agg(item.value ORDER BY item.ordinal)
                        FROM jsonb_array_elements(data -> $3)
                            WITH ORDINALITY AS item(value, ordinal)
                        WHERE item.value <> $4::JSONB
                    ),
                    '[]'::JSONB
                )
            )
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(field)
        .bind(value)
        .execute(&self.pool)
        .await
        .map(|done| done.rows_affected())
        .map_err(|error| {
            warn!(collection = collection.as_str(), %error, "array removal failed");
            AppError::Internal(format!(
                "failed to update {} document: {error}",
                collection.as_str()
            ))
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("DELETE FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());
        builder.push(" AND id = (SELECT id FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());
        builder.push(" AND ");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY id LIMIT 1)");

        builder
            .build()
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete {} document: {error}",
                    collection.as_str()
                ))
            })
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("DELETE FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());
        builder.push(" AND ");
        push_filter(&mut builder, filter);

        builder
            .build()
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete {} documents: {error}",
                    collection.as_str()
                ))
            })
    }

    async fn estimated_count(&self, collection: Collection) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM documents
            WHERE collection = $1
            "#,
        )
        .bind(collection.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to count {} documents: {error}",
                collection.as_str()
            ))
        })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn next_sequence(&self, collection: Collection) -> AppResult<u64> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO document_sequences (collection, value)
            VALUES ($1, 1)
            ON CONFLICT (collection)
            DO UPDATE SET value = document_sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(collection.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to advance {} sequence: {error}",
                collection.as_str()
            ))
        })?;

        u64::try_from(value).map_err(|error| {
            AppError::Internal(format!(
                "{} sequence is out of range: {error}",
                collection.as_str()
            ))
        })
    }
}

fn document_id(collection: Collection, document: &Document) -> AppResult<String> {
    document.id().map(str::to_owned).ok_or_else(|| {
        AppError::Internal(format!(
            "{} document is missing its _id",
            collection.as_str()
        ))
    })
}

fn missing_document(collection: Collection, id: &str) -> AppError {
    AppError::not_found(
        Message::new(MessageKey::ModelNotFound)
            .with("model", collection.as_str())
            .with("keyKind", "_id")
            .with("key", id),
    )
}

fn document_from_row(collection: Collection, row: DocumentRow) -> AppResult<Document> {
    match row.data {
        Value::Object(fields) => Ok(Document::new(fields)),
        other => Err(AppError::Internal(format!(
            "persisted {} document is not an object: {other}",
            collection.as_str()
        ))),
    }
}

/// Field guarded by a unique index, by index name.
fn unique_index_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "documents_code_key" => Some("code"),
        "documents_band_name_key" => Some("name"),
        _ => None,
    }
}

fn map_write_error(collection: Collection, document: &Document, error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
        && let Some(field) = database_error.constraint().and_then(unique_index_field)
    {
        let value = match document.get(field) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        return AppError::Validation(Rejection::from_violations(vec![FieldViolation::new(
            field,
            Message::new(MessageKey::DuplicateValue)
                .with("field", field)
                .with("value", value),
        )]));
    }

    warn!(collection = collection.as_str(), %error, "document write failed");
    AppError::Internal(format!(
        "failed to write {} document: {error}",
        collection.as_str()
    ))
}

#[cfg(test)]
mod tests;
