use std::collections::HashMap;

use async_trait::async_trait;
use bandstand_application::{Document, DocumentStore, Filter, FindOptions};
use bandstand_core::{
    AppError, AppResult, FieldViolation, Message, MessageKey, Rejection,
};
use bandstand_domain::Collection;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// In-memory document store implementation.
///
/// Documents are kept per collection in insertion order; queries scan the
/// collection and evaluate [`Filter::matches`].
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<Collection, Vec<Document>>>,
    sequences: RwLock<HashMap<Collection, u64>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            sequences: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
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
        let documents = self.documents.read().await;
        let mut matching: Vec<&Document> = documents
            .get(&collection)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|document| filter.matches(document))
                    .collect()
            })
            .unwrap_or_default();
        matching.sort_by(|left, right| options.compare(left, right));

        Ok(matching
            .into_iter()
            .skip(options.skip)
            .take(options.limit)
            .cloned()
            .collect())
    }

    async fn insert(&self, collection: Collection, document: Document) -> AppResult<Document> {
        let id = document_id(collection, &document)?;
        let mut documents = self.documents.write().await;
        let stored = documents.entry(collection).or_default();

        if stored.iter().any(|existing| existing.id() == Some(id.as_str())) {
            return Err(AppError::Internal(format!(
                "{} document '{id}' already exists",
                collection.as_str()
            )));
        }
        ensure_unique(stored, collection, &document)?;

        stored.push(document.clone());
        Ok(document)
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        changes: Map<String, Value>,
        unset: &[String],
    ) -> AppResult<Document> {
        let mut documents = self.documents.write().await;
        let stored = documents.entry(collection).or_default();
        let index = stored
            .iter()
            .position(|existing| existing.id() == Some(id))
            .ok_or_else(|| missing_document(collection, id))?;

        let mut document = stored[index].clone();
        document.apply_changes(changes, unset);
        ensure_unique(stored, collection, &document)?;
        stored[index] = document.clone();

        Ok(document)
    }

    async fn add_to_set(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> AppResult<Document> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(&collection)
            .and_then(|stored| stored.iter_mut().find(|existing| existing.id() == Some(id)))
            .ok_or_else(|| missing_document(collection, id))?;
        document.push_unique(field, value);

        Ok(document.clone())
    }

    async fn pull(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> AppResult<u64> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents
            .get_mut(&collection)
            .and_then(|stored| stored.iter_mut().find(|existing| existing.id() == Some(id)))
        else {
            return Ok(0);
        };
        document.pull(field, &value);

        Ok(1)
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut documents = self.documents.write().await;
        let Some(stored) = documents.get_mut(&collection) else {
            return Ok(0);
        };

        let id_order = FindOptions::first(1);
        let first = stored
            .iter()
            .enumerate()
            .filter(|(_, document)| filter.matches(document))
            .min_by(|(_, left), (_, right)| id_order.compare(left, right))
            .map(|(index, _)| index);

        match first {
            Some(index) => {
                stored.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut documents = self.documents.write().await;
        let Some(stored) = documents.get_mut(&collection) else {
            return Ok(0);
        };

        let before = stored.len();
        stored.retain(|document| !filter.matches(document));

        Ok(u64::try_from(before - stored.len()).unwrap_or(u64::MAX))
    }

    async fn estimated_count(&self, collection: Collection) -> AppResult<u64> {
        let documents = self.documents.read().await;
        let count = documents.get(&collection).map_or(0, Vec::len);

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn next_sequence(&self, collection: Collection) -> AppResult<u64> {
        let mut sequences = self.sequences.write().await;
        let value = sequences.entry(collection).or_insert(0);
        *value += 1;

        Ok(*value)
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

fn ensure_unique(
    stored: &[Document],
    collection: Collection,
    document: &Document,
) -> AppResult<()> {
    let violations = collection
        .unique_fields()
        .iter()
        .filter_map(|field| {
            let value = document.get(field).filter(|value| !value.is_null())?;
            let taken = stored
                .iter()
                .any(|other| other.id() != document.id() && other.get(field) == Some(value));
            taken.then(|| {
                FieldViolation::new(
                    *field,
                    Message::new(MessageKey::DuplicateValue)
                        .with("field", field)
                        .with("value", display_value(value)),
                )
            })
        })
        .collect::<Vec<_>>();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(Rejection::from_violations(violations)))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
