use serde_json::{Map, Value};

use crate::constraints::FieldConstraint;
use crate::duration::format_duration;
use crate::{album, band, song};

/// Storage collection holding one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Band documents.
    Bands,
    /// Album documents.
    Albums,
    /// Song documents.
    Songs,
}

impl Collection {
    /// Every collection, parents first.
    pub const ALL: [Self; 3] = [Self::Bands, Self::Albums, Self::Songs];

    /// Returns the stable storage name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bands => "bands",
            Self::Albums => "albums",
            Self::Songs => "songs",
        }
    }

    /// Returns the document fields whose values must be unique in the collection.
    #[must_use]
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Bands => &["name", "code"],
            Self::Albums | Self::Songs => &["code"],
        }
    }
}

/// How a query-string filter value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    /// Case-insensitive literal substring.
    Text,
    /// Exact integer or decimal.
    Numeric,
    /// Single value `v` meaning `[v, v + 1)`, or inclusive `min-max`.
    ///
    /// Accepted values are multiplied by `scale` before reaching storage and
    /// must fall within `bounds` when declared.
    Range {
        /// Multiplier from query units to stored units.
        scale: f64,
        /// Inclusive accepted bounds in query units.
        bounds: Option<(f64, f64)>,
    },
    /// Comma-separated members of a closed set.
    Enum(&'static [&'static str]),
    /// Exact `YYYY-MM-DD` date.
    Date,
    /// Four-digit year, translated to a half-open date range.
    Year,
    /// Comma-separated values, matched when the stored array contains any.
    Array,
}

/// A declared filterable query parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterField {
    /// Query-string name.
    pub name: &'static str,
    /// Stored document field the filter applies to.
    pub target: &'static str,
    /// Value interpretation.
    pub kind: FilterKind,
}

impl FilterField {
    /// Declares a filter on the field of the same name.
    #[must_use]
    pub const fn on(name: &'static str, kind: FilterKind) -> Self {
        Self {
            name,
            target: name,
            kind,
        }
    }
}

/// Ownership edge from a child model to its parent.
#[derive(Debug, Clone, Copy)]
pub struct ParentLink {
    /// Parent model.
    pub model: &'static ModelDescriptor,
    /// Child field holding the parent id.
    pub foreign_key: &'static str,
    /// Parent field listing child ids.
    pub children_field: &'static str,
}

/// Capability descriptor driving the generic request pipeline for one model.
#[derive(Debug)]
pub struct ModelDescriptor {
    /// Singular model name used in messages.
    pub name: &'static str,
    /// Capitalised name used in response keys such as `updatedBand`.
    pub label: &'static str,
    /// Backing collection.
    pub collection: Collection,
    /// Writable fields and their constraints.
    pub constraints: &'static [FieldConstraint],
    /// Filterable query parameters.
    pub filters: &'static [FilterField],
    /// Sortable fields; the first one is the default sort.
    pub sortables: &'static [&'static str],
    /// Field a delete request must repeat to confirm the target.
    pub discriminator: &'static str,
    /// Owning model, for child models.
    pub parent: Option<ParentLink>,
    /// Stored fields never shown to clients.
    pub private_fields: &'static [&'static str],
    /// Stored second counts rendered as `mm:ss`.
    pub duration_fields: &'static [&'static str],
}

impl ModelDescriptor {
    /// Returns the writable payload fields in declaration order.
    #[must_use]
    pub fn writable_fields(&self) -> Vec<&'static str> {
        self.constraints
            .iter()
            .map(|constraint| constraint.field)
            .collect()
    }

    /// Looks up a declared filter by query-string name.
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&FilterField> {
        self.filters.iter().find(|filter| filter.name == name)
    }

    /// Returns every declared filter name.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name).collect()
    }

    /// Returns whether the field may appear in a `sort` parameter.
    #[must_use]
    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortables.contains(&field)
    }

    /// Returns the field used when a request does not specify `sort`.
    #[must_use]
    pub fn default_sort(&self) -> &'static str {
        self.sortables.first().copied().unwrap_or("_id")
    }

    /// Renders a stored document for clients.
    #[must_use]
    pub fn public_document(&self, document: &Map<String, Value>) -> Value {
        let mut public = document.clone();
        for field in self.private_fields {
            public.remove(*field);
        }
        for field in self.duration_fields {
            if let Some(seconds) = public
                .get(*field)
                .and_then(Value::as_u64)
                .and_then(|seconds| u32::try_from(seconds).ok())
            {
                public.insert((*field).to_owned(), Value::String(format_duration(seconds)));
            }
        }

        Value::Object(public)
    }
}

/// Band descriptor.
pub static BAND_MODEL: ModelDescriptor = ModelDescriptor {
    name: "band",
    label: "Band",
    collection: Collection::Bands,
    constraints: band::CONSTRAINTS,
    filters: &[
        FilterField::on("name", FilterKind::Text),
        FilterField::on("bio", FilterKind::Text),
        FilterField::on("formationYear", FilterKind::Numeric),
        FilterField::on("tags", FilterKind::Array),
    ],
    sortables: &["_id", "name", "formationYear"],
    discriminator: "name",
    parent: None,
    private_fields: &[],
    duration_fields: &[],
};

/// Album descriptor.
pub static ALBUM_MODEL: ModelDescriptor = ModelDescriptor {
    name: "album",
    label: "Album",
    collection: Collection::Albums,
    constraints: album::CONSTRAINTS,
    filters: &[
        FilterField::on("title", FilterKind::Text),
        FilterField::on("type", FilterKind::Enum(album::ALBUM_TYPES)),
        FilterField::on("releaseDate", FilterKind::Date),
        FilterField {
            name: "releaseYear",
            target: "releaseDate",
            kind: FilterKind::Year,
        },
        FilterField::on("tags", FilterKind::Array),
    ],
    sortables: &["_id", "title", "releaseDate", "type"],
    discriminator: "title",
    parent: Some(ParentLink {
        model: &BAND_MODEL,
        foreign_key: "band",
        children_field: "albums",
    }),
    private_fields: &[],
    duration_fields: &[],
};

/// Song descriptor.
pub static SONG_MODEL: ModelDescriptor = ModelDescriptor {
    name: "song",
    label: "Song",
    collection: Collection::Songs,
    constraints: song::CONSTRAINTS,
    filters: &[
        FilterField::on("title", FilterKind::Text),
        FilterField::on("singers", FilterKind::Text),
        FilterField::on("lyrics", FilterKind::Text),
        FilterField::on("position", FilterKind::Numeric),
        FilterField::on(
            "duration",
            FilterKind::Range {
                scale: 60.0,
                bounds: None,
            },
        ),
        FilterField::on(
            "rating",
            FilterKind::Range {
                scale: 1.0,
                bounds: Some((0.0, 10.0)),
            },
        ),
    ],
    sortables: &["position", "title", "duration", "rating", "_id"],
    discriminator: "title",
    parent: Some(ParentLink {
        model: &ALBUM_MODEL,
        foreign_key: "album",
        children_field: "songs",
    }),
    private_fields: &["ratingSum", "voters"],
    duration_fields: &["duration"],
};
