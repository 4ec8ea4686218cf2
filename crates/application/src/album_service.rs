use bandstand_core::{AppError, AppResult, EntityId};
use bandstand_domain::{ALBUM_MODEL, Album, BAND_MODEL, Band, Collection, SONG_MODEL, Song};
use serde_json::{Map, Value};
use tracing::info;

use crate::catalog_ports::{Document, Filter};
use crate::catalog_views::{AlbumView, Page, Revision};
use crate::request_pipeline::{RequestPipeline, whitelist_fields};

/// Application service for albums, optionally scoped to a band.
///
/// `band_key` is the band segment of nested paths such as
/// `/bands/{band}/albums/{album}`.
#[derive(Clone)]
pub struct AlbumService {
    pipeline: RequestPipeline,
}

impl AlbumService {
    /// Creates an album service over the shared pipeline.
    #[must_use]
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Lists albums matching the query parameters.
    pub async fn list(
        &self,
        band_key: Option<&str>,
        params: &[(String, String)],
    ) -> AppResult<Page<AlbumView>> {
        let ancestors = band_key.into_iter().collect::<Vec<_>>();
        let query = self
            .pipeline
            .build_query(&ALBUM_MODEL, params, &ancestors, None)
            .await?;
        let (documents, total) = self.pipeline.find_page(&ALBUM_MODEL, &query).await?;

        let mut items = Vec::with_capacity(documents.len());
        for document in &documents {
            items.push(self.view(document.to_entity()?).await?);
        }

        Ok(Page { items, total })
    }

    /// Fetches one album by id or code.
    pub async fn get(
        &self,
        band_key: Option<&str>,
        key: &str,
        params: &[(String, String)],
    ) -> AppResult<AlbumView> {
        let ancestors = band_key.into_iter().collect::<Vec<_>>();
        let query = self
            .pipeline
            .build_query(&ALBUM_MODEL, params, &ancestors, Some(key))
            .await?;
        let document = self.pipeline.find_single(&ALBUM_MODEL, &query, key).await?;

        self.view(document.to_entity()?).await
    }

    /// Creates an album under a band.
    pub async fn create(&self, band_key: &str, body: &Map<String, Value>) -> AppResult<AlbumView> {
        whitelist_fields(body, &ALBUM_MODEL)?;
        let band_document = self
            .pipeline
            .resolve_lineage(&ALBUM_MODEL, &[band_key])
            .await?
            .ok_or_else(|| AppError::Internal("album owner was not resolved".to_owned()))?;
        let band: Band = band_document.to_entity()?;

        let album = Album::draft(EntityId::generate(), band.id().clone(), body)?;
        let sequence = self
            .pipeline
            .store()
            .next_sequence(Collection::Albums)
            .await?;
        let album = album.numbered(sequence);
        let stored = self
            .pipeline
            .store()
            .insert(Collection::Albums, Document::from_entity(&album)?)
            .await?;
        let band_document = self
            .pipeline
            .attach_child(&ALBUM_MODEL, &stored, band_document)
            .await?;
        info!(album = album.code(), band = band.code(), "created album");

        Ok(AlbumView {
            album: stored.to_entity()?,
            band: Some(band_document.to_entity()?),
            songs: Vec::new(),
        })
    }

    /// Updates an album addressed by id or code. The code never changes.
    pub async fn update(
        &self,
        band_key: Option<&str>,
        key: &str,
        body: &Map<String, Value>,
    ) -> AppResult<Revision<AlbumView>> {
        whitelist_fields(body, &ALBUM_MODEL)?;
        let document = self.resolve_scoped(band_key, key, body, None).await?;
        let original: Album = document.to_entity()?;
        let mut album = original.clone();
        album.update(body)?;

        let stored = self
            .pipeline
            .save_changes(&ALBUM_MODEL, &document, &Document::from_entity(&album)?)
            .await?;
        let original = self.view(original).await?;

        Ok(Revision {
            updated: AlbumView {
                album: stored.to_entity()?,
                band: original.band.clone(),
                songs: original.songs.clone(),
            },
            original,
        })
    }

    /// Deletes an album with its songs and removes it from its band.
    pub async fn delete(
        &self,
        band_key: Option<&str>,
        key: &str,
        body: &Map<String, Value>,
    ) -> AppResult<AlbumView> {
        let document = self
            .resolve_scoped(band_key, key, body, Some(ALBUM_MODEL.discriminator))
            .await?;
        let album: Album = document.to_entity()?;
        let deleted = self.view(album).await?;
        let album_id = deleted.album.id().as_str();

        let removed_songs = self.pipeline.delete_children(&SONG_MODEL, album_id).await?;
        self.pipeline
            .store()
            .delete_one(Collection::Albums, &Filter::eq("_id", album_id))
            .await?;
        self.pipeline.detach_child(&ALBUM_MODEL, &document).await?;
        info!(
            album = deleted.album.code(),
            songs = removed_songs,
            "deleted album"
        );

        Ok(deleted)
    }

    async fn resolve_scoped(
        &self,
        band_key: Option<&str>,
        key: &str,
        body: &Map<String, Value>,
        mandatory_field: Option<&str>,
    ) -> AppResult<Document> {
        let ancestors = band_key.into_iter().collect::<Vec<_>>();
        let band = self
            .pipeline
            .resolve_lineage(&ALBUM_MODEL, &ancestors)
            .await?;
        let document = self
            .pipeline
            .resolve_identity(&ALBUM_MODEL, body, key, mandatory_field)
            .await?;
        if let (Some(band), Some(link)) = (band.as_ref(), ALBUM_MODEL.parent.as_ref()) {
            self.pipeline
                .verify_ownership(&ALBUM_MODEL, &document, link, band)
                .await?;
        }

        Ok(document)
    }

    async fn view(&self, album: Album) -> AppResult<AlbumView> {
        let band = self
            .pipeline
            .store()
            .find_one(
                BAND_MODEL.collection,
                &Filter::eq("_id", album.band().as_str()),
            )
            .await?
            .map(|document| document.to_entity::<Band>())
            .transpose()?;
        let song_ids = album
            .songs()
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect::<Vec<_>>();
        let songs = self
            .pipeline
            .find_by_ids(Collection::Songs, &song_ids)
            .await?
            .iter()
            .map(Document::to_entity::<Song>)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(AlbumView { album, band, songs })
    }
}
