//! Catalog entities, field constraints and model descriptors.

#![forbid(unsafe_code)]

mod album;
mod band;
mod constraints;
mod duration;
mod model;
mod rating;
mod song;

pub use album::{ALBUM_TYPES, Album, AlbumType};
pub use band::Band;
pub use constraints::{
    FieldConstraint, FieldUpdate, NormalizedPayload, NormalizedValue, PayloadMode, UpperBound,
    ValueRule, normalize_payload, normalize_tags, parse_calendar_date,
};
pub use duration::{format_duration, parse_duration};
pub use model::{
    ALBUM_MODEL, BAND_MODEL, Collection, FilterField, FilterKind, ModelDescriptor, ParentLink,
    SONG_MODEL,
};
pub use rating::Rating;
pub use song::Song;
