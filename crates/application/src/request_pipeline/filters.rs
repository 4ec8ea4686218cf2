use bandstand_domain::normalize_tags;
use chrono::NaiveDate;

use super::*;

/// Storage filter and find options built from a collection or singular GET.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    /// Combined predicate.
    pub filter: Filter,
    /// Pagination and ordering.
    pub options: FindOptions,
}

#[derive(Default)]
struct ValueErrors {
    numeric: Map<String, Value>,
    range: Map<String, Value>,
    enumeration: Map<String, Value>,
    date: Map<String, Value>,
}

impl RequestPipeline {
    /// Translates query parameters into a storage query.
    ///
    /// Unknown filter names fail first, then malformed numeric, range, enum
    /// and date values, each family reported as a whole. Ancestor keys scope
    /// the query to the nearest ancestor's children, and a path `key` narrows
    /// it to one document.
    pub async fn build_query(
        &self,
        model: &ModelDescriptor,
        params: &[(String, String)],
        ancestor_keys: &[&str],
        key: Option<&str>,
    ) -> AppResult<CatalogQuery> {
        let mut limit = None;
        let mut skip = None;
        let mut sort = None;
        let mut filter_params = Vec::new();
        for (name, value) in params {
            match name.as_str() {
                "limit" => limit = Some(value.as_str()),
                "skip" => skip = Some(value.as_str()),
                "sort" => sort = Some(value.as_str()),
                _ => filter_params.push((name.as_str(), value.as_str())),
            }
        }

        let mut unknown = Vec::new();
        for (name, _) in &filter_params {
            if model.filter(name).is_none() && !unknown.contains(name) {
                unknown.push(*name);
            }
        }
        if !unknown.is_empty() {
            return Err(AppError::Validation(
                Rejection::new(
                    Message::new(MessageKey::InvalidFilters)
                        .with("expected", model.filter_names().join(", ")),
                )
                .with_invalid(InvalidKind::Filters, json!(unknown)),
            ));
        }

        let mut clauses = Vec::new();
        let mut errors = ValueErrors::default();
        for (name, value) in filter_params {
            let Some(field) = model.filter(name) else {
                continue;
            };
            if let Some(clause) = filter_clause(field.target, field.kind, name, value, &mut errors)
            {
                clauses.push(clause);
            }
        }
        errors.into_result()?;

        let mut options = build_find_options(limit, skip, sort, model, self.max_limit)?;

        if let Some(ancestor) = self.resolve_lineage(model, ancestor_keys).await?
            && let Some(link) = model.parent
        {
            clauses.push(Filter::eq(
                link.foreign_key,
                ancestor.id().unwrap_or_default(),
            ));
        }

        if let Some(key) = key {
            clauses.push(key_filter(key));
            options.limit = 1;
        }

        let filter = Filter::and(clauses);
        debug!(model = model.name, ?filter, ?options, "built catalog query");

        Ok(CatalogQuery { filter, options })
    }
}

impl RequestPipeline {
    /// Runs a collection query, returning the page and the collection size.
    pub async fn find_page(
        &self,
        model: &ModelDescriptor,
        query: &CatalogQuery,
    ) -> AppResult<(Vec<Document>, u64)> {
        let documents = self
            .store
            .find(model.collection, &query.filter, &query.options)
            .await?;
        let total = self.store.estimated_count(model.collection).await?;

        Ok((documents, total))
    }

    /// Runs a singular query; no match is `modelNotFound` (404).
    pub async fn find_single(
        &self,
        model: &ModelDescriptor,
        query: &CatalogQuery,
        key: &str,
    ) -> AppResult<Document> {
        self.store
            .find(model.collection, &query.filter, &query.options)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::not_found(
                    Message::new(MessageKey::ModelNotFound)
                        .with("model", model.name)
                        .with("keyKind", "key")
                        .with("key", key),
                )
            })
    }
}

impl ValueErrors {
    fn into_result(self) -> AppResult<()> {
        let families = [
            (MessageKey::InvalidNumericFilters, InvalidKind::NumericFilters, self.numeric),
            (MessageKey::InvalidRangeFilters, InvalidKind::RangeFilters, self.range),
            (MessageKey::InvalidEnumFilters, InvalidKind::EnumFilters, self.enumeration),
            (MessageKey::InvalidDateFilters, InvalidKind::DateFilters, self.date),
        ];
        for (key, kind, invalid) in families {
            if !invalid.is_empty() {
                return Err(AppError::Validation(
                    Rejection::new(Message::new(key)).with_invalid(kind, Value::Object(invalid)),
                ));
            }
        }

        Ok(())
    }
}

fn filter_clause(
    target: &str,
    kind: FilterKind,
    name: &str,
    value: &str,
    errors: &mut ValueErrors,
) -> Option<Filter> {
    let reject = |family: &mut Map<String, Value>| {
        family.insert(name.to_owned(), Value::String(value.to_owned()));
        None
    };

    match kind {
        FilterKind::Text => Some(Filter::ContainsText {
            field: target.to_owned(),
            text: value.to_owned(),
        }),
        FilterKind::Array => Some(Filter::ContainsAny {
            field: target.to_owned(),
            values: normalize_tags(value.split(','))
                .into_iter()
                .map(Value::String)
                .collect(),
        }),
        FilterKind::Numeric => match numeric_value(value) {
            Some(number) => Some(Filter::eq(target, number)),
            None => reject(&mut errors.numeric),
        },
        FilterKind::Range { scale, bounds } => match parse_range(value, bounds) {
            Some((min, None)) => Some(Filter::Range {
                field: target.to_owned(),
                lower: Some(RangeBound::inclusive(min * scale)),
                upper: Some(RangeBound::exclusive((min + 1.0) * scale)),
            }),
            Some((min, Some(max))) => Some(Filter::Range {
                field: target.to_owned(),
                lower: Some(RangeBound::inclusive(min * scale)),
                upper: Some(RangeBound::inclusive(max * scale)),
            }),
            None => reject(&mut errors.range),
        },
        FilterKind::Enum(allowed) => {
            let mut members = Vec::new();
            for candidate in value.split(',').map(str::trim).filter(|text| !text.is_empty()) {
                match allowed
                    .iter()
                    .find(|member| member.eq_ignore_ascii_case(candidate))
                {
                    Some(member) => members.push(Value::String((*member).to_owned())),
                    None => return reject(&mut errors.enumeration),
                }
            }
            if members.is_empty() {
                return reject(&mut errors.enumeration);
            }
            Some(Filter::In {
                field: target.to_owned(),
                values: members,
            })
        }
        FilterKind::Date => match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
            Ok(date) => Some(Filter::eq(target, date.format("%Y-%m-%d").to_string())),
            Err(_) => reject(&mut errors.date),
        },
        FilterKind::Year => match parse_year(value) {
            Some(year) => Some(Filter::Range {
                field: target.to_owned(),
                lower: Some(RangeBound::inclusive(format!("{year:04}-01-01"))),
                upper: Some(RangeBound::exclusive(format!("{:04}-01-01", year + 1))),
            }),
            None => reject(&mut errors.date),
        },
    }
}

/// Accepts `-?digits(.digits)?`.
fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());

    digits(whole) && fraction.is_none_or(digits)
}

fn numeric_value(text: &str) -> Option<Value> {
    let text = text.trim();
    if !is_decimal(text) {
        return None;
    }

    match text.parse::<i64>() {
        Ok(integer) => Some(json!(integer)),
        Err(_) => text.parse::<f64>().ok().map(|decimal| json!(decimal)),
    }
}

fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if is_decimal(text) {
        text.parse().ok()
    } else {
        None
    }
}

/// Parses `v` or `min-max`, checking declared bounds.
fn parse_range(text: &str, bounds: Option<(f64, f64)>) -> Option<(f64, Option<f64>)> {
    let parsed = match parse_decimal(text) {
        Some(value) => (value, None),
        None => {
            let (min, max) = text.trim().split_once('-')?;
            let (min, max) = (parse_decimal(min)?, parse_decimal(max)?);
            if min > max {
                return None;
            }
            (min, Some(max))
        }
    };

    let within = |value: f64| bounds.is_none_or(|(lower, upper)| (lower..=upper).contains(&value));
    if !within(parsed.0) || !parsed.1.is_none_or(within) {
        return None;
    }

    Some(parsed)
}

fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.len() != 4 || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    text.parse::<i32>().ok().filter(|year| *year >= 1900)
}
