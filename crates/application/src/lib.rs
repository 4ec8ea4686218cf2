//! Application services and ports.

#![forbid(unsafe_code)]

mod album_service;
mod band_service;
mod catalog_ports;
mod catalog_views;
mod localization_service;
mod request_pipeline;
mod song_service;

#[cfg(test)]
mod test_support;

pub use album_service::AlbumService;
pub use band_service::BandService;
pub use catalog_ports::{
    Document, DocumentStore, Filter, FindOptions, RangeBound, SortDirection, SortKey,
    TranslationSource, TranslationTable,
};
pub use catalog_views::{AlbumView, BandView, Page, Revision, SongView};
pub use localization_service::LocalizationService;
pub use request_pipeline::{
    CatalogQuery, RequestPipeline, build_find_options, key_filter, whitelist_fields,
};
pub use song_service::SongService;
