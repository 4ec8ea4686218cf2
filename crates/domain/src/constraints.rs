use std::collections::HashSet;

use bandstand_core::{AppError, AppResult, FieldViolation, Message, MessageKey, Rejection, slugify};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::duration::parse_duration;

/// Upper bound of an integer constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperBound {
    /// Fixed inclusive maximum.
    Fixed(i64),
    /// The current calendar year, evaluated at validation time.
    CurrentYear,
}

impl UpperBound {
    fn resolve(self) -> i64 {
        match self {
            Self::Fixed(value) => value,
            Self::CurrentYear => i64::from(Utc::now().year()),
        }
    }
}

/// Normalization and validation applied to one payload field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRule {
    /// Trimmed text; `collapse_spacing` squeezes runs of spaces and tabs.
    Text {
        /// Whether runs of horizontal whitespace collapse to one space.
        collapse_spacing: bool,
    },
    /// Whole number within inclusive bounds.
    Integer {
        /// Inclusive minimum.
        min: i64,
        /// Inclusive maximum, when bounded.
        max: Option<UpperBound>,
    },
    /// Decimal number within inclusive bounds.
    Number {
        /// Inclusive minimum.
        min: f64,
        /// Inclusive maximum.
        max: f64,
    },
    /// Calendar date no earlier than `not_before` (`YYYY-MM-DD`).
    Date {
        /// Earliest accepted date.
        not_before: &'static str,
    },
    /// One of a closed set of values, matched case-insensitively.
    Choice(&'static [&'static str]),
    /// Array of free-text tags, slugified and deduplicated.
    Tags,
    /// `mm:ss` track length stored as seconds.
    Duration,
}

/// Declarative constraint record for one writable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConstraint {
    /// Payload field name.
    pub field: &'static str,
    /// Whether the field must be present (on create) and never cleared.
    pub required: bool,
    /// Normalization rule.
    pub rule: ValueRule,
}

impl FieldConstraint {
    /// Declares an optional field.
    #[must_use]
    pub const fn optional(field: &'static str, rule: ValueRule) -> Self {
        Self {
            field,
            required: false,
            rule,
        }
    }

    /// Declares a required field.
    #[must_use]
    pub const fn required(field: &'static str, rule: ValueRule) -> Self {
        Self {
            field,
            required: true,
            rule,
        }
    }
}

/// A payload value after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    /// Trimmed text.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Decimal number.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Canonical spelling of a closed-set value.
    Choice(&'static str),
    /// Slugified, deduplicated tags.
    Tags(Vec<String>),
    /// Duration in seconds.
    Seconds(u32),
}

/// Requested change to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Store the value.
    Set(NormalizedValue),
    /// Remove the stored value.
    Clear,
}

/// Whether required fields must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// Every required field must be supplied.
    Create,
    /// Only supplied fields are checked.
    Update,
}

/// Validated field updates in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPayload {
    updates: Vec<(&'static str, FieldUpdate)>,
}

impl NormalizedPayload {
    /// Returns the update requested for a field, if the payload carried it.
    #[must_use]
    pub fn update(&self, field: &str) -> Option<&FieldUpdate> {
        self.updates
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, update)| update)
    }

    /// Returns whether the payload touched the field.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.update(field).is_some()
    }

    /// Text update: `Some(None)` clears, `None` leaves the field alone.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<Option<&str>> {
        self.project(field, |value| match value {
            NormalizedValue::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Integer update.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<Option<i64>> {
        self.project(field, |value| match value {
            NormalizedValue::Integer(number) => Some(*number),
            _ => None,
        })
    }

    /// Decimal update.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<Option<f64>> {
        self.project(field, |value| match value {
            NormalizedValue::Number(number) => Some(*number),
            _ => None,
        })
    }

    /// Date update.
    #[must_use]
    pub fn date(&self, field: &str) -> Option<Option<NaiveDate>> {
        self.project(field, |value| match value {
            NormalizedValue::Date(date) => Some(*date),
            _ => None,
        })
    }

    /// Closed-set value update.
    #[must_use]
    pub fn choice(&self, field: &str) -> Option<Option<&'static str>> {
        self.project(field, |value| match value {
            NormalizedValue::Choice(choice) => Some(*choice),
            _ => None,
        })
    }

    /// Tags update; clearing yields an empty list.
    #[must_use]
    pub fn tags(&self, field: &str) -> Option<Vec<String>> {
        self.project(field, |value| match value {
            NormalizedValue::Tags(tags) => Some(tags.clone()),
            _ => None,
        })
        .map(Option::unwrap_or_default)
    }

    /// Duration update in seconds.
    #[must_use]
    pub fn seconds(&self, field: &str) -> Option<Option<u32>> {
        self.project(field, |value| match value {
            NormalizedValue::Seconds(seconds) => Some(*seconds),
            _ => None,
        })
    }

    fn project<'a, T>(
        &'a self,
        field: &str,
        extract: impl Fn(&'a NormalizedValue) -> Option<T>,
    ) -> Option<Option<T>> {
        match self.update(field)? {
            FieldUpdate::Set(value) => extract(value).map(Some),
            FieldUpdate::Clear => Some(None),
        }
    }
}

/// Validates and normalizes a write payload against constraint records.
///
/// Fields without a constraint are ignored; every violation is collected
/// before failing with a `validationFailed` rejection.
pub fn normalize_payload(
    constraints: &[FieldConstraint],
    payload: &Map<String, Value>,
    mode: PayloadMode,
) -> AppResult<NormalizedPayload> {
    let mut updates = Vec::new();
    let mut violations = Vec::new();

    for constraint in constraints {
        let field = constraint.field;
        match payload.get(field) {
            None => {
                if constraint.required && mode == PayloadMode::Create {
                    violations.push(required(field));
                }
            }
            Some(Value::Null) => {
                if constraint.required {
                    violations.push(required(field));
                } else {
                    updates.push((field, FieldUpdate::Clear));
                }
            }
            Some(value) => match normalize_value(field, constraint.rule, value) {
                Ok(Some(normalized)) => updates.push((field, FieldUpdate::Set(normalized))),
                Ok(None) if constraint.required => violations.push(required(field)),
                Ok(None) => updates.push((field, FieldUpdate::Clear)),
                Err(message) => violations.push(FieldViolation::new(field, message)),
            },
        }
    }

    if !violations.is_empty() {
        return Err(AppError::Validation(Rejection::from_violations(violations)));
    }

    Ok(NormalizedPayload { updates })
}

/// Slugifies tags, dropping blanks and keeping the first occurrence of each.
#[must_use]
pub fn normalize_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(slugify)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp keeping its date part.
#[must_use]
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

fn required(field: &'static str) -> FieldViolation {
    FieldViolation::new(field, Message::new(MessageKey::Required).with("field", field))
}

fn normalize_value(
    field: &'static str,
    rule: ValueRule,
    value: &Value,
) -> Result<Option<NormalizedValue>, Message> {
    match rule {
        ValueRule::Text { collapse_spacing } => {
            let text = expect_string(field, value)?;
            let text = if collapse_spacing {
                collapse_horizontal_whitespace(text.trim())
            } else {
                text.trim().to_owned()
            };
            Ok((!text.is_empty()).then_some(NormalizedValue::Text(text)))
        }
        ValueRule::Integer { min, max } => {
            let number = value
                .as_i64()
                .ok_or_else(|| Message::new(MessageKey::MustBeInteger).with("field", field))?;
            let max = max.map(UpperBound::resolve);
            if number < min || max.is_some_and(|max| number > max) {
                return Err(out_of_range(field, min, max));
            }
            Ok(Some(NormalizedValue::Integer(number)))
        }
        ValueRule::Number { min, max } => {
            let number = value
                .as_f64()
                .ok_or_else(|| Message::new(MessageKey::MustBeNumber).with("field", field))?;
            if !(min..=max).contains(&number) {
                return Err(Message::new(MessageKey::OutOfRange)
                    .with("field", field)
                    .with("min", min)
                    .with("max", max));
            }
            Ok(Some(NormalizedValue::Number(number)))
        }
        ValueRule::Date { not_before } => {
            let text = expect_string(field, value)?;
            if text.trim().is_empty() {
                return Ok(None);
            }
            let date = parse_calendar_date(text).ok_or_else(|| {
                Message::new(MessageKey::InvalidDate)
                    .with("field", field)
                    .with("value", text)
            })?;
            if parse_calendar_date(not_before).is_some_and(|earliest| date < earliest) {
                return Err(Message::new(MessageKey::DateTooEarly)
                    .with("field", field)
                    .with("min", not_before));
            }
            Ok(Some(NormalizedValue::Date(date)))
        }
        ValueRule::Choice(allowed) => {
            let text = expect_string(field, value)?.trim();
            if text.is_empty() {
                return Ok(None);
            }
            allowed
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(text))
                .map(|candidate| Some(NormalizedValue::Choice(*candidate)))
                .ok_or_else(|| {
                    Message::new(MessageKey::NotInEnum)
                        .with("field", field)
                        .with("value", text)
                        .with("allowed", allowed.join(", "))
                })
        }
        ValueRule::Tags => {
            let must_be_array =
                || Message::new(MessageKey::MustBeStringArray).with("field", field);
            let items = value.as_array().ok_or_else(must_be_array)?;
            let texts = items
                .iter()
                .map(Value::as_str)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(must_be_array)?;
            Ok(Some(NormalizedValue::Tags(normalize_tags(texts))))
        }
        ValueRule::Duration => {
            let text = expect_string(field, value)?;
            if text.trim().is_empty() {
                return Ok(None);
            }
            parse_duration(text)
                .map(|seconds| Some(NormalizedValue::Seconds(seconds)))
                .ok_or_else(|| {
                    Message::new(MessageKey::InvalidDuration)
                        .with("field", field)
                        .with("value", text)
                })
        }
    }
}

fn expect_string<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, Message> {
    value
        .as_str()
        .ok_or_else(|| Message::new(MessageKey::MustBeString).with("field", field))
}

fn out_of_range(field: &'static str, min: i64, max: Option<i64>) -> Message {
    let message = Message::new(MessageKey::OutOfRange)
        .with("field", field)
        .with("min", min);
    match max {
        Some(max) => message.with("max", max),
        None => message.with("max", "∞"),
    }
}

fn collapse_horizontal_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_run = false;
    for character in text.chars() {
        if character == ' ' || character == '\t' {
            if !in_run {
                collapsed.push(' ');
            }
            in_run = true;
        } else {
            in_run = false;
            collapsed.push(character);
        }
    }

    collapsed
}
