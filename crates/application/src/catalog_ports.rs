mod document;
mod query;
mod store;
mod translation;

pub use document::Document;
pub use query::{Filter, FindOptions, RangeBound, SortDirection, SortKey};
pub use store::DocumentStore;
pub use translation::{TranslationSource, TranslationTable};
