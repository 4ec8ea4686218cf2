mod ancestry;
mod filters;
mod identity;
mod options;
mod ownership;
mod whitelist;

use std::sync::Arc;

use bandstand_core::{
    AppError, AppResult, EntityId, InvalidKind, Message, MessageKey, Rejection,
};
use bandstand_domain::{Collection, FilterKind, ModelDescriptor, ParentLink};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::catalog_ports::{Document, DocumentStore, Filter, FindOptions, RangeBound, SortKey};

pub use filters::CatalogQuery;
pub use options::build_find_options;
pub use whitelist::whitelist_fields;

/// Validation and resolution steps shared by every catalog model.
///
/// Each step is parameterized by a [`ModelDescriptor`]; no step retries and
/// the first failing step decides the response.
#[derive(Clone)]
pub struct RequestPipeline {
    store: Arc<dyn DocumentStore>,
    max_limit: usize,
}

impl RequestPipeline {
    /// Creates a pipeline over a storage port. `max_limit` caps and defaults `limit`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, max_limit: usize) -> Self {
        Self { store, max_limit }
    }

    /// Returns the storage port.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns the configured page size maximum.
    #[must_use]
    pub fn max_limit(&self) -> usize {
        self.max_limit
    }
}

/// Builds the lookup filter for a path key.
///
/// A key shaped like an id matches either `_id` or `code`; any other key can
/// only be a code.
#[must_use]
pub fn key_filter(key: &str) -> Filter {
    match EntityId::parse(key) {
        Some(id) => Filter::Or(vec![
            Filter::eq("_id", id.as_str()),
            Filter::eq("code", key),
        ]),
        None => Filter::eq("code", key),
    }
}

#[cfg(test)]
mod tests;
