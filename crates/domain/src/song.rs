use bandstand_core::{AppResult, EntityId, NonEmptyString, slugify};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constraints::{
    FieldConstraint, NormalizedPayload, PayloadMode, UpperBound, ValueRule, normalize_payload,
};
use crate::rating::Rating;

pub(crate) const CONSTRAINTS: &[FieldConstraint] = &[
    FieldConstraint::required(
        "title",
        ValueRule::Text {
            collapse_spacing: false,
        },
    ),
    FieldConstraint::required(
        "position",
        ValueRule::Integer {
            min: 1,
            max: Some(UpperBound::Fixed(u32::MAX as i64)),
        },
    ),
    FieldConstraint::optional("duration", ValueRule::Duration),
    FieldConstraint::optional(
        "singers",
        ValueRule::Text {
            collapse_spacing: false,
        },
    ),
    FieldConstraint::optional(
        "lyrics",
        ValueRule::Text {
            collapse_spacing: true,
        },
    ),
    FieldConstraint::optional(
        "rating",
        ValueRule::Number {
            min: Rating::MIN,
            max: Rating::MAX,
        },
    ),
];

/// A song owned by exactly one album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(rename = "_id")]
    id: EntityId,
    title: NonEmptyString,
    code: String,
    position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    singers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lyrics: Option<String>,
    #[serde(flatten)]
    votes: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    album: EntityId,
}

impl Song {
    /// Builds a new song under `album`; `sequence` prefixes the code.
    pub fn create(
        id: EntityId,
        sequence: u64,
        album: EntityId,
        payload: &Map<String, Value>,
    ) -> AppResult<Self> {
        Self::draft(id, album, payload).map(|song| song.numbered(sequence))
    }

    /// Validates a creation payload without assigning the code number.
    pub fn draft(
        id: EntityId,
        album: EntityId,
        payload: &Map<String, Value>,
    ) -> AppResult<Self> {
        let fields = normalize_payload(CONSTRAINTS, payload, PayloadMode::Create)?;
        let title = NonEmptyString::new(fields.text("title").flatten().unwrap_or_default())?;

        let mut song = Self {
            id,
            code: slugify(title.as_str()),
            title,
            position: 1,
            duration: None,
            singers: None,
            lyrics: None,
            votes: Rating::default(),
            rating: None,
            album,
        };
        song.apply(&fields)?;

        Ok(song)
    }

    /// Prefixes the code with its creation number: `{sequence}-{slug}`.
    #[must_use]
    pub fn numbered(mut self, sequence: u64) -> Self {
        self.code = format!("{sequence}-{}", slugify(self.title.as_str()));
        self
    }

    /// Applies a partial update payload. A `rating` value counts as one vote.
    pub fn update(&mut self, payload: &Map<String, Value>) -> AppResult<()> {
        let fields = normalize_payload(CONSTRAINTS, payload, PayloadMode::Update)?;
        self.apply(&fields)
    }

    fn apply(&mut self, fields: &NormalizedPayload) -> AppResult<()> {
        if let Some(Some(title)) = fields.text("title") {
            self.title = NonEmptyString::new(title)?;
        }
        if let Some(Some(position)) = fields.integer("position") {
            self.position = u32::try_from(position).unwrap_or(u32::MAX);
        }
        if let Some(duration) = fields.seconds("duration") {
            self.duration = duration;
        }
        if let Some(singers) = fields.text("singers") {
            self.singers = singers.map(str::to_owned);
        }
        if let Some(lyrics) = fields.text("lyrics") {
            self.lyrics = lyrics.map(str::to_owned);
        }
        if let Some(Some(vote)) = fields.number("rating") {
            self.votes.add_vote(vote);
            self.rating = self.votes.average();
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

    /// Returns the track position within the album.
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Returns the track length in seconds.
    #[must_use]
    pub fn duration(&self) -> Option<u32> {
        self.duration
    }

    /// Returns the singers.
    #[must_use]
    pub fn singers(&self) -> Option<&str> {
        self.singers.as_deref()
    }

    /// Returns the lyrics.
    #[must_use]
    pub fn lyrics(&self) -> Option<&str> {
        self.lyrics.as_deref()
    }

    /// Returns the published average rating.
    #[must_use]
    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    /// Returns the vote accumulator.
    #[must_use]
    pub fn votes(&self) -> &Rating {
        &self.votes
    }

    /// Returns the owning album id.
    #[must_use]
    pub fn album(&self) -> &EntityId {
        &self.album
    }
}
