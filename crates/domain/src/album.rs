use std::str::FromStr;

use bandstand_core::{AppError, AppResult, EntityId, Message, MessageKey, NonEmptyString, slugify};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constraints::{
    FieldConstraint, NormalizedPayload, PayloadMode, ValueRule, normalize_payload,
};

/// Canonical spellings of every album type.
pub const ALBUM_TYPES: &[&str] = &["Compilation", "EP", "Live", "Single", "Studio"];

pub(crate) const CONSTRAINTS: &[FieldConstraint] = &[
    FieldConstraint::required(
        "title",
        ValueRule::Text {
            collapse_spacing: false,
        },
    ),
    FieldConstraint::optional(
        "releaseDate",
        ValueRule::Date {
            not_before: "1900-01-01",
        },
    ),
    FieldConstraint::optional("type", ValueRule::Choice(ALBUM_TYPES)),
    FieldConstraint::optional("tags", ValueRule::Tags),
];

/// Release format of an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlbumType {
    /// Compilation of earlier material.
    Compilation,
    /// Extended play.
    #[serde(rename = "EP")]
    Ep,
    /// Live recording.
    Live,
    /// Single release.
    Single,
    /// Studio album.
    Studio,
}

impl AlbumType {
    /// Returns the canonical spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compilation => "Compilation",
            Self::Ep => "EP",
            Self::Live => "Live",
            Self::Single => "Single",
            Self::Studio => "Studio",
        }
    }
}

impl FromStr for AlbumType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        [
            Self::Compilation,
            Self::Ep,
            Self::Live,
            Self::Single,
            Self::Studio,
        ]
        .into_iter()
        .find(|album_type| album_type.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| {
            AppError::validation(
                Message::new(MessageKey::NotInEnum)
                    .with("field", "type")
                    .with("value", value)
                    .with("allowed", ALBUM_TYPES.join(", ")),
            )
        })
    }
}

/// An album owned by exactly one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(rename = "_id")]
    id: EntityId,
    title: NonEmptyString,
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release_date: Option<NaiveDate>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    album_type: Option<AlbumType>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    songs: Vec<EntityId>,
    band: EntityId,
}

impl Album {
    /// Builds a new album under `band`; `sequence` prefixes the code.
    pub fn create(
        id: EntityId,
        sequence: u64,
        band: EntityId,
        payload: &Map<String, Value>,
    ) -> AppResult<Self> {
        Self::draft(id, band, payload).map(|album| album.numbered(sequence))
    }

    /// Validates a creation payload without assigning the code number.
    pub fn draft(
        id: EntityId,
        band: EntityId,
        payload: &Map<String, Value>,
    ) -> AppResult<Self> {
        let fields = normalize_payload(CONSTRAINTS, payload, PayloadMode::Create)?;
        let title = NonEmptyString::new(fields.text("title").flatten().unwrap_or_default())?;

        let mut album = Self {
            id,
            code: slugify(title.as_str()),
            title,
            release_date: None,
            album_type: None,
            tags: Vec::new(),
            songs: Vec::new(),
            band,
        };
        album.apply(&fields)?;

        Ok(album)
    }

    /// Prefixes the code with its creation number: `{sequence}-{slug}`.
    #[must_use]
    pub fn numbered(mut self, sequence: u64) -> Self {
        self.code = format!("{sequence}-{}", slugify(self.title.as_str()));
        self
    }

    /// Applies a partial update payload. The code never changes.
    pub fn update(&mut self, payload: &Map<String, Value>) -> AppResult<()> {
        let fields = normalize_payload(CONSTRAINTS, payload, PayloadMode::Update)?;
        self.apply(&fields)
    }

    fn apply(&mut self, fields: &NormalizedPayload) -> AppResult<()> {
        if let Some(Some(title)) = fields.text("title") {
            self.title = NonEmptyString::new(title)?;
        }
        if let Some(release_date) = fields.date("releaseDate") {
            self.release_date = release_date;
        }
        if let Some(album_type) = fields.choice("type") {
            self.album_type = album_type.map(AlbumType::from_str).transpose()?;
        }
        if let Some(tags) = fields.tags("tags") {
            self.tags = tags;
        }

        Ok(())
    }

    /// Returns the id.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the code assigned at creation.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the release date.
    #[must_use]
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date
    }

    /// Returns the release format.
    #[must_use]
    pub fn album_type(&self) -> Option<AlbumType> {
        self.album_type
    }

    /// Returns the normalized tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    /// Returns the owned song ids in insertion order.
    #[must_use]
    pub fn songs(&self) -> &[EntityId] {
        self.songs.as_slice()
    }

    /// Returns the owning band id.
    #[must_use]
    pub fn band(&self) -> &EntityId {
        &self.band
    }
}
