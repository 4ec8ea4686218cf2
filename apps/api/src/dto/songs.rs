use bandstand_application::{Revision, SongView};
use bandstand_domain::{Song, format_duration};
use serde::Serialize;
use ts_rs::TS;

use super::albums::AlbumFields;

/// Stored song fields. Vote totals stay private.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/song-fields.ts"
)]
pub struct SongFields {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub code: String,
    pub position: u32,
    /// `mm:ss`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub singers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub lyrics: Option<String>,
    /// Average of every vote, two decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub rating: Option<f64>,
}

/// Album embedded in a song: band and songs as ids.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/song-album-response.ts"
)]
pub struct SongAlbumResponse {
    #[serde(flatten)]
    pub album: AlbumFields,
    pub band: String,
    pub songs: Vec<String>,
}

/// API representation of a song with its album.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/song-response.ts"
)]
pub struct SongResponse {
    #[serde(flatten)]
    pub song: SongFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub album: Option<SongAlbumResponse>,
}

/// Song update result.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/updated-song-response.ts"
)]
pub struct UpdatedSongResponse {
    pub updated_song: SongResponse,
    pub original_song: SongResponse,
}

/// Song deletion result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/deleted-song-response.ts"
)]
pub struct DeletedSongResponse {
    pub success: bool,
    pub deleted: SongResponse,
}

impl From<&Song> for SongFields {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id().as_str().to_owned(),
            title: song.title().as_str().to_owned(),
            code: song.code().to_owned(),
            position: song.position(),
            duration: song.duration().map(format_duration),
            singers: song.singers().map(str::to_owned),
            lyrics: song.lyrics().map(str::to_owned),
            rating: song.rating(),
        }
    }
}

impl From<SongView> for SongResponse {
    fn from(view: SongView) -> Self {
        Self {
            song: SongFields::from(&view.song),
            album: view.album.as_ref().map(|album| SongAlbumResponse {
                album: AlbumFields::from(album),
                band: album.band().as_str().to_owned(),
                songs: album
                    .songs()
                    .iter()
                    .map(|id| id.as_str().to_owned())
                    .collect(),
            }),
        }
    }
}

impl From<Revision<SongView>> for UpdatedSongResponse {
    fn from(revision: Revision<SongView>) -> Self {
        Self {
            updated_song: revision.updated.into(),
            original_song: revision.original.into(),
        }
    }
}

impl From<SongView> for DeletedSongResponse {
    fn from(view: SongView) -> Self {
        Self {
            success: true,
            deleted: view.into(),
        }
    }
}
