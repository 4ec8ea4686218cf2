use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bandstand_core::{
    AppError, AppResult, FieldViolation, Message, MessageKey, Rejection,
};
use bandstand_domain::Collection;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::catalog_ports::{Document, DocumentStore, Filter, FindOptions};
use crate::request_pipeline::RequestPipeline;

pub const MAX_LIMIT: usize = 50;

/// Insertion-ordered store evaluating filters in memory.
#[derive(Default)]
pub struct FakeStore {
    documents: Mutex<HashMap<Collection, Vec<Document>>>,
    sequences: Mutex<HashMap<Collection, u64>>,
    failing_updates: Mutex<Option<Collection>>,
}

impl FakeStore {
    pub async fn fail_updates_on(&self, collection: Collection) {
        *self.failing_updates.lock().await = Some(collection);
    }

    async fn ensure_writable(&self, collection: Collection) -> AppResult<()> {
        if *self.failing_updates.lock().await == Some(collection) {
            return Err(AppError::Internal("updates unavailable".to_owned()));
        }
        Ok(())
    }

    pub async fn all(&self, collection: Collection) -> Vec<Document> {
        self.documents
            .lock()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn check_unique(
        stored: &[Document],
        collection: Collection,
        document: &Document,
    ) -> AppResult<()> {
        let violations = collection
            .unique_fields()
            .iter()
            .filter(|field| {
                let value = document.get(field);
                stored.iter().any(|other| {
                    other.id() != document.id() && value.is_some() && other.get(field) == value
                })
            })
            .map(|field| {
                FieldViolation::new(
                    *field,
                    Message::new(MessageKey::DuplicateValue).with("field", field),
                )
            })
            .collect::<Vec<_>>();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(Rejection::from_violations(violations)))
        }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
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
        let mut matching = self
            .all(collection)
            .await
            .into_iter()
            .filter(|document| filter.matches(document))
            .collect::<Vec<_>>();
        matching.sort_by(|left, right| options.compare(left, right));

        Ok(matching
            .into_iter()
            .skip(options.skip)
            .take(options.limit)
            .collect())
    }

    async fn insert(&self, collection: Collection, document: Document) -> AppResult<Document> {
        let mut documents = self.documents.lock().await;
        let stored = documents.entry(collection).or_default();
        Self::check_unique(stored, collection, &document)?;
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
        self.ensure_writable(collection).await?;

        let mut documents = self.documents.lock().await;
        let stored = documents.entry(collection).or_default();
        let index = stored
            .iter()
            .position(|existing| existing.id() == Some(id))
            .ok_or_else(|| AppError::Internal("updated document is missing".to_owned()))?;
        let mut document = stored[index].clone();
        document.apply_changes(changes, unset);
        Self::check_unique(stored, collection, &document)?;
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
        self.ensure_writable(collection).await?;

        let mut documents = self.documents.lock().await;
        let document = documents
            .entry(collection)
            .or_default()
            .iter_mut()
            .find(|existing| existing.id() == Some(id))
            .ok_or_else(|| AppError::Internal("updated document is missing".to_owned()))?;
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
        self.ensure_writable(collection).await?;

        let mut documents = self.documents.lock().await;
        match documents
            .entry(collection)
            .or_default()
            .iter_mut()
            .find(|existing| existing.id() == Some(id))
        {
            Some(document) => {
                document.pull(field, &value);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut documents = self.documents.lock().await;
        let stored = documents.entry(collection).or_default();
        match stored.iter().position(|document| filter.matches(document)) {
            Some(index) => {
                stored.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> AppResult<u64> {
        let mut documents = self.documents.lock().await;
        let stored = documents.entry(collection).or_default();
        let before = stored.len();
        stored.retain(|document| !filter.matches(document));
        Ok((before - stored.len()) as u64)
    }

    async fn estimated_count(&self, collection: Collection) -> AppResult<u64> {
        Ok(self.all(collection).await.len() as u64)
    }

    async fn next_sequence(&self, collection: Collection) -> AppResult<u64> {
        let mut sequences = self.sequences.lock().await;
        let next = sequences.entry(collection).or_insert(0);
        *next += 1;
        Ok(*next)
    }
}

pub fn pipeline() -> (Arc<FakeStore>, RequestPipeline) {
    let store = Arc::new(FakeStore::default());
    let pipeline = RequestPipeline::new(store.clone(), MAX_LIMIT);
    (store, pipeline)
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => unreachable!(),
    }
}

pub fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect()
}

pub fn rejection(error: AppError) -> Rejection {
    match error {
        AppError::Validation(rejection)
        | AppError::NotFound(rejection)
        | AppError::Conflict(rejection) => rejection,
        AppError::Internal(message) => unreachable!("unexpected internal error: {message}"),
    }
}
