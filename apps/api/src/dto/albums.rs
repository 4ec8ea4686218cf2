use bandstand_application::{AlbumView, Revision};
use bandstand_domain::Album;
use serde::Serialize;
use ts_rs::TS;

use super::bands::BandFields;
use super::songs::SongFields;

/// Stored album fields.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/album-fields.ts"
)]
pub struct AlbumFields {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub code: String,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub release_date: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub album_type: Option<String>,
    pub tags: Vec<String>,
}

/// Band embedded in an album: albums as ids.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/album-band-response.ts"
)]
pub struct AlbumBandResponse {
    #[serde(flatten)]
    pub band: BandFields,
    pub albums: Vec<String>,
}

/// API representation of an album with its band and songs.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/album-response.ts"
)]
pub struct AlbumResponse {
    #[serde(flatten)]
    pub album: AlbumFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub band: Option<AlbumBandResponse>,
    pub songs: Vec<SongFields>,
}

/// Album update result.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/updated-album-response.ts"
)]
pub struct UpdatedAlbumResponse {
    pub updated_album: AlbumResponse,
    pub original_album: AlbumResponse,
}

/// Album deletion result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/deleted-album-response.ts"
)]
pub struct DeletedAlbumResponse {
    pub success: bool,
    pub deleted: AlbumResponse,
}

impl From<&Album> for AlbumFields {
    fn from(album: &Album) -> Self {
        Self {
            id: album.id().as_str().to_owned(),
            title: album.title().as_str().to_owned(),
            code: album.code().to_owned(),
            release_date: album
                .release_date()
                .map(|date| date.format("%Y-%m-%d").to_string()),
            album_type: album
                .album_type()
                .map(|album_type| album_type.as_str().to_owned()),
            tags: album.tags().to_vec(),
        }
    }
}

impl From<AlbumView> for AlbumResponse {
    fn from(view: AlbumView) -> Self {
        Self {
            album: AlbumFields::from(&view.album),
            band: view.band.as_ref().map(|band| AlbumBandResponse {
                band: BandFields::from(band),
                albums: band
                    .albums()
                    .iter()
                    .map(|id| id.as_str().to_owned())
                    .collect(),
            }),
            songs: view.songs.iter().map(SongFields::from).collect(),
        }
    }
}

impl From<Revision<AlbumView>> for UpdatedAlbumResponse {
    fn from(revision: Revision<AlbumView>) -> Self {
        Self {
            updated_album: revision.updated.into(),
            original_album: revision.original.into(),
        }
    }
}

impl From<AlbumView> for DeletedAlbumResponse {
    fn from(view: AlbumView) -> Self {
        Self {
            success: true,
            deleted: view.into(),
        }
    }
}
