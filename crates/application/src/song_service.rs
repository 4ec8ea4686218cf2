use bandstand_core::{AppError, AppResult, EntityId, Message, MessageKey, Rejection};
use bandstand_domain::{ALBUM_MODEL, Album, Collection, SONG_MODEL, Song};
use serde_json::{Map, Value};
use tracing::info;

use crate::catalog_ports::{Document, Filter, FindOptions};
use crate::catalog_views::{Page, Revision, SongView};
use crate::request_pipeline::{RequestPipeline, whitelist_fields};

/// Application service for songs.
///
/// `ancestors` holds the keys of the enclosing path segments, root first:
/// `[album]` for `/albums/{album}/songs` and `[band, album]` for
/// `/bands/{band}/albums/{album}/songs`.
#[derive(Clone)]
pub struct SongService {
    pipeline: RequestPipeline,
}

impl SongService {
    /// Creates a song service over the shared pipeline.
    #[must_use]
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Lists songs matching the query parameters.
    pub async fn list(
        &self,
        ancestors: &[&str],
        params: &[(String, String)],
    ) -> AppResult<Page<SongView>> {
        let query = self
            .pipeline
            .build_query(&SONG_MODEL, params, ancestors, None)
            .await?;
        let (documents, total) = self.pipeline.find_page(&SONG_MODEL, &query).await?;
        let songs = documents
            .iter()
            .map(Document::to_entity::<Song>)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page {
            items: self.views(songs).await?,
            total,
        })
    }

    /// Fetches one song by id or code.
    pub async fn get(
        &self,
        ancestors: &[&str],
        key: &str,
        params: &[(String, String)],
    ) -> AppResult<SongView> {
        let query = self
            .pipeline
            .build_query(&SONG_MODEL, params, ancestors, Some(key))
            .await?;
        let document = self.pipeline.find_single(&SONG_MODEL, &query, key).await?;

        self.view(document.to_entity()?).await
    }

    /// Creates a song under the album closing `ancestors`.
    pub async fn create(&self, ancestors: &[&str], body: &Map<String, Value>) -> AppResult<SongView> {
        whitelist_fields(body, &SONG_MODEL)?;
        let album_document = self
            .pipeline
            .resolve_lineage(&SONG_MODEL, ancestors)
            .await?
            .ok_or_else(|| AppError::Internal("song owner was not resolved".to_owned()))?;
        let album: Album = album_document.to_entity()?;

        let song = Song::draft(EntityId::generate(), album.id().clone(), body)?;
        self.ensure_free_position(&song).await?;
        let sequence = self
            .pipeline
            .store()
            .next_sequence(Collection::Songs)
            .await?;
        let song = song.numbered(sequence);

        let stored = self
            .pipeline
            .store()
            .insert(Collection::Songs, Document::from_entity(&song)?)
            .await?;
        let album_document = self
            .pipeline
            .attach_child(&SONG_MODEL, &stored, album_document)
            .await?;
        info!(song = song.code(), album = album.code(), "created song");

        Ok(SongView {
            song: stored.to_entity()?,
            album: Some(album_document.to_entity()?),
        })
    }

    /// Updates a song addressed by id or code. A `rating` counts as one vote.
    pub async fn update(
        &self,
        ancestors: &[&str],
        key: &str,
        body: &Map<String, Value>,
    ) -> AppResult<Revision<SongView>> {
        whitelist_fields(body, &SONG_MODEL)?;
        let document = self.resolve_scoped(ancestors, key, body, None).await?;
        let original: Song = document.to_entity()?;
        let mut song = original.clone();
        song.update(body)?;
        if song.position() != original.position() {
            self.ensure_free_position(&song).await?;
        }

        let stored = self
            .pipeline
            .save_changes(&SONG_MODEL, &document, &Document::from_entity(&song)?)
            .await?;
        let original = self.view(original).await?;

        Ok(Revision {
            updated: SongView {
                song: stored.to_entity()?,
                album: original.album.clone(),
            },
            original,
        })
    }

    /// Deletes a song and removes it from its album.
    pub async fn delete(
        &self,
        ancestors: &[&str],
        key: &str,
        body: &Map<String, Value>,
    ) -> AppResult<SongView> {
        let document = self
            .resolve_scoped(ancestors, key, body, Some(SONG_MODEL.discriminator))
            .await?;
        let song: Song = document.to_entity()?;

        self.pipeline
            .store()
            .delete_one(Collection::Songs, &Filter::eq("_id", song.id().as_str()))
            .await?;
        self.pipeline.detach_child(&SONG_MODEL, &document).await?;
        info!(song = song.code(), "deleted song");

        self.view(song).await
    }

    async fn resolve_scoped(
        &self,
        ancestors: &[&str],
        key: &str,
        body: &Map<String, Value>,
        mandatory_field: Option<&str>,
    ) -> AppResult<Document> {
        let album = self.pipeline.resolve_lineage(&SONG_MODEL, ancestors).await?;
        let document = self
            .pipeline
            .resolve_identity(&SONG_MODEL, body, key, mandatory_field)
            .await?;
        if let (Some(album), Some(link)) = (album.as_ref(), SONG_MODEL.parent.as_ref()) {
            self.pipeline
                .verify_ownership(&SONG_MODEL, &document, link, album)
                .await?;
        }

        Ok(document)
    }

    /// Rejects a position already held by another song of the same album.
    async fn ensure_free_position(&self, song: &Song) -> AppResult<()> {
        let siblings = self
            .pipeline
            .store()
            .find(
                Collection::Songs,
                &Filter::and(vec![
                    Filter::eq("album", song.album().as_str()),
                    Filter::eq("position", song.position()),
                ]),
                &FindOptions::first(2),
            )
            .await?;

        match siblings
            .iter()
            .find(|sibling| sibling.id() != Some(song.id().as_str()))
        {
            Some(sibling) => Err(AppError::Validation(
                Rejection::new(
                    Message::new(MessageKey::DuplicatePosition)
                        .with("position", song.position()),
                )
                .with_attachment(SONG_MODEL.name, SONG_MODEL.public_document(sibling.fields())),
            )),
            None => Ok(()),
        }
    }

    async fn view(&self, song: Song) -> AppResult<SongView> {
        let mut views = self.views(vec![song]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("song view could not be assembled".to_owned()))
    }

    async fn views(&self, songs: Vec<Song>) -> AppResult<Vec<SongView>> {
        let mut album_ids = Vec::new();
        for song in &songs {
            let album_id = song.album().as_str().to_owned();
            if !album_ids.contains(&album_id) {
                album_ids.push(album_id);
            }
        }
        let albums = self
            .pipeline
            .find_by_ids(ALBUM_MODEL.collection, &album_ids)
            .await?
            .iter()
            .map(Document::to_entity::<Album>)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(songs
            .into_iter()
            .map(|song| {
                let album = albums
                    .iter()
                    .find(|album| album.id() == song.album())
                    .cloned();
                SongView { song, album }
            })
            .collect())
    }
}
