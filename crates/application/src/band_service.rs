use bandstand_core::{AppError, AppResult, EntityId, FieldViolation, Message, MessageKey, Rejection};
use bandstand_domain::{ALBUM_MODEL, Album, BAND_MODEL, Band, Collection, SONG_MODEL};
use serde_json::{Map, Value};
use tracing::info;

use crate::catalog_ports::{Document, Filter};
use crate::catalog_views::{BandView, Page, Revision};
use crate::request_pipeline::{RequestPipeline, whitelist_fields};

/// Application service for bands.
#[derive(Clone)]
pub struct BandService {
    pipeline: RequestPipeline,
}

impl BandService {
    /// Creates a band service over the shared pipeline.
    #[must_use]
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Lists bands matching the query parameters.
    pub async fn list(&self, params: &[(String, String)]) -> AppResult<Page<BandView>> {
        let query = self
            .pipeline
            .build_query(&BAND_MODEL, params, &[], None)
            .await?;
        let (documents, total) = self.pipeline.find_page(&BAND_MODEL, &query).await?;

        Ok(Page {
            items: self.views(&documents).await?,
            total,
        })
    }

    /// Fetches one band by id or code.
    pub async fn get(&self, key: &str, params: &[(String, String)]) -> AppResult<BandView> {
        let query = self
            .pipeline
            .build_query(&BAND_MODEL, params, &[], Some(key))
            .await?;
        let document = self.pipeline.find_single(&BAND_MODEL, &query, key).await?;

        self.view(document.to_entity()?).await
    }

    /// Creates a band.
    pub async fn create(&self, body: &Map<String, Value>) -> AppResult<BandView> {
        whitelist_fields(body, &BAND_MODEL)?;
        let band = Band::create(EntityId::generate(), body)?;
        let stored = self
            .pipeline
            .store()
            .insert(Collection::Bands, Document::from_entity(&band)?)
            .await?;
        info!(band = band.code(), "created band");

        Ok(BandView {
            band: stored.to_entity()?,
            albums: Vec::new(),
        })
    }

    /// Updates a band addressed by id or code. Renaming recomputes the code.
    pub async fn update(
        &self,
        key: &str,
        body: &Map<String, Value>,
    ) -> AppResult<Revision<BandView>> {
        whitelist_fields(body, &BAND_MODEL)?;
        let document = self
            .pipeline
            .resolve_identity(&BAND_MODEL, body, key, None)
            .await?;
        let original: Band = document.to_entity()?;
        let mut band = original.clone();
        band.update(body)?;

        let stored = self
            .pipeline
            .save_changes(&BAND_MODEL, &document, &Document::from_entity(&band)?)
            .await?;
        let original = self.view(original).await?;

        Ok(Revision {
            updated: BandView {
                band: stored.to_entity()?,
                albums: original.albums.clone(),
            },
            original,
        })
    }

    /// Deletes a band. Bands owning albums are only deleted, together with
    /// their albums and songs, when the body sets `cascade: true`.
    pub async fn delete(&self, key: &str, body: &Map<String, Value>) -> AppResult<BandView> {
        let cascade = cascade_flag(body)?;
        let document = self
            .pipeline
            .resolve_identity(&BAND_MODEL, body, key, Some(BAND_MODEL.discriminator))
            .await?;
        let band: Band = document.to_entity()?;
        let band_id = band.id().as_str();

        let album_documents = self.pipeline.find_children(&ALBUM_MODEL, band_id).await?;
        if !album_documents.is_empty() && !cascade {
            return Err(AppError::conflict(
                Message::new(MessageKey::CascadeRefused)
                    .with("model", BAND_MODEL.name)
                    .with("key", key)
                    .with("count", album_documents.len()),
            ));
        }

        let mut removed_songs = 0;
        for album in &album_documents {
            if let Some(album_id) = album.id() {
                removed_songs += self.pipeline.delete_children(&SONG_MODEL, album_id).await?;
            }
        }
        let removed_albums = self.pipeline.delete_children(&ALBUM_MODEL, band_id).await?;
        self.pipeline
            .store()
            .delete_one(Collection::Bands, &Filter::eq("_id", band_id))
            .await?;
        info!(
            band = band.code(),
            albums = removed_albums,
            songs = removed_songs,
            "deleted band"
        );

        let albums = album_documents
            .iter()
            .map(Document::to_entity::<Album>)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(BandView { band, albums })
    }

    async fn view(&self, band: Band) -> AppResult<BandView> {
        let mut views = self.views_of(vec![band]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("band view could not be assembled".to_owned()))
    }

    async fn views(&self, documents: &[Document]) -> AppResult<Vec<BandView>> {
        let bands = documents
            .iter()
            .map(Document::to_entity::<Band>)
            .collect::<AppResult<Vec<_>>>()?;
        self.views_of(bands).await
    }

    async fn views_of(&self, bands: Vec<Band>) -> AppResult<Vec<BandView>> {
        let album_ids = bands
            .iter()
            .flat_map(|band| band.albums().iter().map(|id| id.as_str().to_owned()))
            .collect::<Vec<_>>();
        let albums = self
            .pipeline
            .find_by_ids(Collection::Albums, &album_ids)
            .await?
            .iter()
            .map(Document::to_entity::<Album>)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(bands
            .into_iter()
            .map(|band| {
                let owned = band
                    .albums()
                    .iter()
                    .filter_map(|id| albums.iter().find(|album| album.id() == id))
                    .cloned()
                    .collect();
                BandView {
                    band,
                    albums: owned,
                }
            })
            .collect())
    }
}

fn cascade_flag(body: &Map<String, Value>) -> AppResult<bool> {
    match body.get("cascade") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(cascade)) => Ok(*cascade),
        Some(_) => Err(AppError::Validation(Rejection::from_violations(vec![
            FieldViolation::new(
                "cascade",
                Message::new(MessageKey::MustBeBoolean).with("field", "cascade"),
            ),
        ]))),
    }
}
