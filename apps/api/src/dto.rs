mod albums;
mod bands;
mod common;
mod songs;

pub use albums::{
    AlbumBandResponse, AlbumFields, AlbumResponse, DeletedAlbumResponse, UpdatedAlbumResponse,
};
pub use bands::{
    BandAlbumResponse, BandFields, BandResponse, DeletedBandResponse, UpdatedBandResponse,
};
pub use common::HealthResponse;
pub use songs::{
    DeletedSongResponse, SongAlbumResponse, SongFields, SongResponse, UpdatedSongResponse,
};

#[cfg(test)]
mod tests {
    use super::{
        AlbumBandResponse, AlbumFields, AlbumResponse, BandAlbumResponse, BandFields,
        BandResponse, DeletedAlbumResponse, DeletedBandResponse, DeletedSongResponse,
        HealthResponse, SongAlbumResponse, SongFields, SongResponse, UpdatedAlbumResponse,
        UpdatedBandResponse, UpdatedSongResponse,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        BandFields::export(&config)?;
        AlbumFields::export(&config)?;
        SongFields::export(&config)?;
        BandResponse::export(&config)?;
        BandAlbumResponse::export(&config)?;
        UpdatedBandResponse::export(&config)?;
        DeletedBandResponse::export(&config)?;
        AlbumResponse::export(&config)?;
        AlbumBandResponse::export(&config)?;
        UpdatedAlbumResponse::export(&config)?;
        DeletedAlbumResponse::export(&config)?;
        SongResponse::export(&config)?;
        SongAlbumResponse::export(&config)?;
        UpdatedSongResponse::export(&config)?;
        DeletedSongResponse::export(&config)?;
        ErrorResponse::export(&config)?;
        HealthResponse::export(&config)?;

        Ok(())
    }
}
