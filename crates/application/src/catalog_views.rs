use bandstand_domain::{Album, Band, Song};

/// A band with its albums embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct BandView {
    /// The band.
    pub band: Band,
    /// Owned albums in the band's order.
    pub albums: Vec<Album>,
}

/// An album with its band and songs embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumView {
    /// The album.
    pub album: Album,
    /// Owning band, absent when the reference dangles.
    pub band: Option<Band>,
    /// Owned songs in the album's order.
    pub songs: Vec<Song>,
}

/// A song with its album embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct SongView {
    /// The song.
    pub song: Song,
    /// Owning album, absent when the reference dangles.
    pub album: Option<Album>,
}

/// One page of a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Documents on the page.
    pub items: Vec<T>,
    /// Estimated size of the whole collection.
    pub total: u64,
}

/// Before and after states of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision<T> {
    /// State after the update.
    pub updated: T,
    /// State before the update.
    pub original: T,
}
