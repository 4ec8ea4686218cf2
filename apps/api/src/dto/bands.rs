use bandstand_application::{BandView, Revision};
use bandstand_domain::Band;
use serde::Serialize;
use ts_rs::TS;

use super::albums::AlbumFields;

/// Stored band fields.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/band-fields.ts"
)]
pub struct BandFields {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub formation_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub bio: Option<String>,
    pub tags: Vec<String>,
}

/// Album embedded in a band: no back-reference, songs as ids.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/band-album-response.ts"
)]
pub struct BandAlbumResponse {
    #[serde(flatten)]
    pub album: AlbumFields,
    pub songs: Vec<String>,
}

/// API representation of a band with its albums.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/band-response.ts"
)]
pub struct BandResponse {
    #[serde(flatten)]
    pub band: BandFields,
    pub albums: Vec<BandAlbumResponse>,
}

/// Band update result.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/updated-band-response.ts"
)]
pub struct UpdatedBandResponse {
    pub updated_band: BandResponse,
    pub original_band: BandResponse,
}

/// Band deletion result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/deleted-band-response.ts"
)]
pub struct DeletedBandResponse {
    pub success: bool,
    pub deleted: BandResponse,
}

impl From<&Band> for BandFields {
    fn from(band: &Band) -> Self {
        Self {
            id: band.id().as_str().to_owned(),
            name: band.name().as_str().to_owned(),
            code: band.code().to_owned(),
            formation_year: band.formation_year(),
            bio: band.bio().map(str::to_owned),
            tags: band.tags().to_vec(),
        }
    }
}

impl From<BandView> for BandResponse {
    fn from(view: BandView) -> Self {
        Self {
            band: BandFields::from(&view.band),
            albums: view
                .albums
                .iter()
                .map(|album| BandAlbumResponse {
                    album: AlbumFields::from(album),
                    songs: album
                        .songs()
                        .iter()
                        .map(|id| id.as_str().to_owned())
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<Revision<BandView>> for UpdatedBandResponse {
    fn from(revision: Revision<BandView>) -> Self {
        Self {
            updated_band: revision.updated.into(),
            original_band: revision.original.into(),
        }
    }
}

impl From<BandView> for DeletedBandResponse {
    fn from(view: BandView) -> Self {
        Self {
            success: true,
            deleted: view.into(),
        }
    }
}
