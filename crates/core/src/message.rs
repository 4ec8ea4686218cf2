use std::fmt::{Display, Formatter};

use serde_json::Value;

/// Stable keys of every user-facing message.
///
/// The string form is the lookup key in translation tables and the literal
/// fallback when a translation cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Summary: unknown fields in a write payload.
    InvalidFields,
    /// Summary: unknown query filters.
    InvalidFilters,
    /// Summary: non-numeric values for numeric filters.
    InvalidNumericFilters,
    /// Summary: malformed or out-of-bounds range filters.
    InvalidRangeFilters,
    /// Summary: values outside an enum filter's domain.
    InvalidEnumFilters,
    /// Summary: unparseable date or year filters.
    InvalidDateFilters,
    /// Summary: unknown sort fields.
    InvalidSortables,
    /// Summary: invalid `limit`/`skip` values.
    InvalidQueryOptions,
    /// Summary: inconsistent `_id`/`code` identity in a write payload.
    InvalidIdentity,
    /// Summary: field constraint violations.
    ValidationFailed,
    /// Summary: request body is not a JSON object.
    MalformedBody,
    /// Summary: no entity matches the requested key.
    ModelNotFound,
    /// Summary: the ancestor named in the path does not exist.
    RelatedNotFound,
    /// Summary: the ancestor exists but does not own the addressed entity.
    RelatedMismatch,
    /// Summary: discriminator value differs from the stored entity.
    MandatoryKeyMismatch,
    /// Summary: band deletion refused while albums remain.
    CascadeRefused,
    /// Summary: song position already taken within the album.
    DuplicatePosition,
    /// Summary: no route matches the request.
    RouteNotFound,
    /// Summary: unexpected failure.
    InternalError,
    /// Requested translation table is not bundled.
    UnsupportedLanguage,
    /// `limit` is not an integer within bounds.
    InvalidLimit,
    /// `skip` is not a non-negative integer.
    InvalidSkip,
    /// Neither `_id` nor `code` present in the body.
    KeyNotFound,
    /// Both `_id` and `code` present in the body.
    BothKeysProvided,
    /// Body `_id` differs from the path key.
    IdMismatch,
    /// Body `code` differs from the path key.
    CodeMismatch,
    /// Path key is not a well-formed id.
    InvalidId,
    /// Discriminator field missing from the body.
    MandatoryKeyMissing,
    /// Required field missing or blank.
    Required,
    /// Field must be a string.
    MustBeString,
    /// Field must be an integer.
    MustBeInteger,
    /// Field must be a number.
    MustBeNumber,
    /// Field must be an array of strings.
    MustBeStringArray,
    /// Field must be a boolean.
    MustBeBoolean,
    /// Numeric field outside its bounds.
    OutOfRange,
    /// Field is not a parseable date.
    InvalidDate,
    /// Date before the earliest accepted date.
    DateTooEarly,
    /// Field value outside its enumerated domain.
    NotInEnum,
    /// Duration not in `mm:ss` form.
    InvalidDuration,
    /// Unique field value already used by another document.
    DuplicateValue,
    /// Value is empty once trimmed.
    BlankValue,
}

impl MessageKey {
    /// Returns the stable translation key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFields => "invalidFields",
            Self::InvalidFilters => "invalidFilters",
            Self::InvalidNumericFilters => "invalidNumericFilters",
            Self::InvalidRangeFilters => "invalidRangeFilters",
            Self::InvalidEnumFilters => "invalidEnumFilters",
            Self::InvalidDateFilters => "invalidDateFilters",
            Self::InvalidSortables => "invalidSortables",
            Self::InvalidQueryOptions => "invalidQueryOptions",
            Self::InvalidIdentity => "invalidIdentity",
            Self::ValidationFailed => "validationFailed",
            Self::MalformedBody => "malformedBody",
            Self::ModelNotFound => "modelNotFound",
            Self::RelatedNotFound => "relatedNotFound",
            Self::RelatedMismatch => "relatedMismatch",
            Self::MandatoryKeyMismatch => "mandatoryKeyMismatch",
            Self::CascadeRefused => "cascadeRefused",
            Self::DuplicatePosition => "duplicatePosition",
            Self::RouteNotFound => "routeNotFound",
            Self::InternalError => "internalError",
            Self::UnsupportedLanguage => "unsupportedLanguage",
            Self::InvalidLimit => "invalidLimit",
            Self::InvalidSkip => "invalidSkip",
            Self::KeyNotFound => "keyNotFound",
            Self::BothKeysProvided => "bothKeysProvided",
            Self::IdMismatch => "idMismatch",
            Self::CodeMismatch => "codeMismatch",
            Self::InvalidId => "invalidId",
            Self::MandatoryKeyMissing => "mandatoryKeyMissing",
            Self::Required => "required",
            Self::MustBeString => "mustBeString",
            Self::MustBeInteger => "mustBeInteger",
            Self::MustBeNumber => "mustBeNumber",
            Self::MustBeStringArray => "mustBeStringArray",
            Self::MustBeBoolean => "mustBeBoolean",
            Self::OutOfRange => "outOfRange",
            Self::InvalidDate => "invalidDate",
            Self::DateTooEarly => "dateTooEarly",
            Self::NotInEnum => "notInEnum",
            Self::InvalidDuration => "invalidDuration",
            Self::DuplicateValue => "duplicateValue",
            Self::BlankValue => "blankValue",
        }
    }
}

impl Display for MessageKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A message key plus the placeholder values it is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    key: MessageKey,
    params: Vec<(&'static str, String)>,
}

impl Message {
    /// Creates a message without placeholders.
    #[must_use]
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            params: Vec::new(),
        }
    }

    /// Adds a `{name}` placeholder value.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Display) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// Returns the message key.
    #[must_use]
    pub fn key(&self) -> MessageKey {
        self.key
    }

    /// Returns the value bound to a placeholder.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(param_name, _)| *param_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces every `{name}` occurrence in the template with its bound value.
    ///
    /// Placeholders without a bound value are left untouched.
    #[must_use]
    pub fn interpolate(&self, template: &str) -> String {
        self.params
            .iter()
            .fold(template.to_owned(), |rendered, (name, value)| {
                rendered.replace(&format!("{{{name}}}"), value)
            })
    }
}

impl Display for Message {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.key.as_str())
    }
}

/// Constraint family of an `invalidX` detail field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidKind {
    /// Unknown payload fields.
    Fields,
    /// Unknown filter names.
    Filters,
    /// Non-numeric numeric filter values.
    NumericFilters,
    /// Malformed range filter values.
    RangeFilters,
    /// Unknown enum filter values.
    EnumFilters,
    /// Unknown sort fields.
    Sortables,
    /// Unparseable date filter values.
    DateFilters,
}

impl InvalidKind {
    /// Returns the response body field carrying the offending values.
    #[must_use]
    pub fn response_field(&self) -> &'static str {
        match self {
            Self::Fields => "invalidFields",
            Self::Filters => "invalidFilters",
            Self::NumericFilters => "invalidNumericFilters",
            Self::RangeFilters => "invalidRangeFilters",
            Self::EnumFilters => "invalidEnumFilters",
            Self::Sortables => "invalidSortables",
            Self::DateFilters => "invalidDateFilters",
        }
    }
}

/// Field-level failure reported by a validator or a storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Offending field.
    pub field: String,
    /// Message describing the failure.
    pub message: Message,
}

impl FieldViolation {
    /// Creates a field violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: Message) -> Self {
        Self {
            field: field.into(),
            message,
        }
    }
}

/// Structured, localizable body of a rejected request.
///
/// Renders as `{error}`, `{error, messages}` or `{error, invalidX}`, plus any
/// named attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    error: Message,
    messages: Vec<Message>,
    invalid: Option<(InvalidKind, Value)>,
    attachments: Vec<(String, Value)>,
}

impl Rejection {
    /// Creates a rejection with only a summary message.
    #[must_use]
    pub fn new(error: Message) -> Self {
        Self {
            error,
            messages: Vec::new(),
            invalid: None,
            attachments: Vec::new(),
        }
    }

    /// Maps field violations into the `{error, messages}` shape.
    #[must_use]
    pub fn from_violations(violations: Vec<FieldViolation>) -> Self {
        Self::new(Message::new(MessageKey::ValidationFailed)).with_messages(
            violations
                .into_iter()
                .map(|violation| violation.message)
                .collect(),
        )
    }

    /// Sets the detail messages.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Sets the `invalidX` detail.
    #[must_use]
    pub fn with_invalid(mut self, kind: InvalidKind, values: Value) -> Self {
        self.invalid = Some((kind, values));
        self
    }

    /// Attaches a named JSON value for client diagnostics.
    #[must_use]
    pub fn with_attachment(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attachments.push((name.into(), value));
        self
    }

    /// Returns the summary message.
    #[must_use]
    pub fn error(&self) -> &Message {
        &self.error
    }

    /// Returns the detail messages.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.messages.as_slice()
    }

    /// Returns the `invalidX` detail.
    #[must_use]
    pub fn invalid(&self) -> Option<(InvalidKind, &Value)> {
        self.invalid.as_ref().map(|(kind, values)| (*kind, values))
    }

    /// Returns named attachments in insertion order.
    #[must_use]
    pub fn attachments(&self) -> &[(String, Value)] {
        self.attachments.as_slice()
    }

    /// Returns whether any detail message uses the given key.
    #[must_use]
    pub fn has_message(&self, key: MessageKey) -> bool {
        self.messages.iter().any(|message| message.key() == key)
    }
}

impl Display for Rejection {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.error)?;
        if !self.messages.is_empty() {
            let keys = self
                .messages
                .iter()
                .map(|message| message.key().as_str())
                .collect::<Vec<_>>()
                .join(", ");
            write!(formatter, " [{keys}]")?;
        }

        Ok(())
    }
}
