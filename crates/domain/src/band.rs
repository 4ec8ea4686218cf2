use bandstand_core::{AppResult, EntityId, NonEmptyString, slugify};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constraints::{
    FieldConstraint, NormalizedPayload, PayloadMode, UpperBound, ValueRule, normalize_payload,
};

pub(crate) const CONSTRAINTS: &[FieldConstraint] = &[
    FieldConstraint::required(
        "name",
        ValueRule::Text {
            collapse_spacing: false,
        },
    ),
    FieldConstraint::optional(
        "formationYear",
        ValueRule::Integer {
            min: 1900,
            max: Some(UpperBound::CurrentYear),
        },
    ),
    FieldConstraint::optional(
        "bio",
        ValueRule::Text {
            collapse_spacing: false,
        },
    ),
    FieldConstraint::optional("tags", ValueRule::Tags),
];

/// A band, the root of the catalog hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    #[serde(rename = "_id")]
    id: EntityId,
    name: NonEmptyString,
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bio: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    albums: Vec<EntityId>,
}

impl Band {
    /// Builds a new band from a creation payload.
    pub fn create(id: EntityId, payload: &Map<String, Value>) -> AppResult<Self> {
        let fields = normalize_payload(CONSTRAINTS, payload, PayloadMode::Create)?;
        let name = NonEmptyString::new(fields.text("name").flatten().unwrap_or_default())?;

        let mut band = Self {
            id,
            code: slugify(name.as_str()),
            name,
            formation_year: None,
            bio: None,
            tags: Vec::new(),
            albums: Vec::new(),
        };
        band.apply(&fields)?;

        Ok(band)
    }

    /// Applies a partial update payload. A new name recomputes the code.
    pub fn update(&mut self, payload: &Map<String, Value>) -> AppResult<()> {
        let fields = normalize_payload(CONSTRAINTS, payload, PayloadMode::Update)?;
        self.apply(&fields)
    }

    fn apply(&mut self, fields: &NormalizedPayload) -> AppResult<()> {
        if let Some(Some(name)) = fields.text("name") {
            self.name = NonEmptyString::new(name)?;
            self.code = slugify(self.name.as_str());
        }
        if let Some(year) = fields.integer("formationYear") {
            self.formation_year = year.and_then(|year| i32::try_from(year).ok());
        }
        if let Some(bio) = fields.text("bio") {
            self.bio = bio.map(str::to_owned);
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

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the code derived from the current name.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the formation year.
    #[must_use]
    pub fn formation_year(&self) -> Option<i32> {
        self.formation_year
    }

    /// Returns the biography.
    #[must_use]
    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    /// Returns the normalized tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    /// Returns the owned album ids in insertion order.
    #[must_use]
    pub fn albums(&self) -> &[EntityId] {
        self.albums.as_slice()
    }
}
