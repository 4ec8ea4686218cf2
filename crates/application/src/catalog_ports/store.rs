use async_trait::async_trait;
use bandstand_core::AppResult;
use bandstand_domain::Collection;
use serde_json::{Map, Value};

use super::{Document, Filter, FindOptions};

/// Storage port for catalog documents.
///
/// Implementations enforce [`Collection::unique_fields`] on every write and
/// report violations as `validationFailed` rejections listing each field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching the filter in `_id` order.
    async fn find_one(&self, collection: Collection, filter: &Filter)
    -> AppResult<Option<Document>>;

    /// Returns matching documents sorted, skipped and limited per the options.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> AppResult<Vec<Document>>;

    /// Stores a new document.
    async fn insert(&self, collection: Collection, document: Document) -> AppResult<Document>;

    /// Overwrites `changes` and removes `unset` on the document with the given
    /// `_id` in one atomic write, returning the stored result. Fields not named
    /// are left as stored.
    async fn update_fields(
        &self,
        collection: Collection,
        id: &str,
        changes: Map<String, Value>,
        unset: &[String],
    ) -> AppResult<Document>;

    /// Appends `value` to the array `field` unless already present, returning
    /// the stored result. Concurrent calls on one document never lose values.
    async fn add_to_set(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> AppResult<Document>;

    /// Removes every occurrence of `value` from the array `field`, returning how
    /// many documents were modified (0 when the document is gone).
    async fn pull(&self, collection: Collection, id: &str, field: &str, value: Value)
    -> AppResult<u64>;

    /// Deletes the first matching document, returning how many were removed.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> AppResult<u64>;

    /// Deletes every matching document.
    async fn delete_many(&self, collection: Collection, filter: &Filter) -> AppResult<u64>;

    /// Returns the approximate number of documents in the collection.
    async fn estimated_count(&self, collection: Collection) -> AppResult<u64>;

    /// Returns the next value of the collection's code counter, starting at 1.
    async fn next_sequence(&self, collection: Collection) -> AppResult<u64>;
}
