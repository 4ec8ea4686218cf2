use super::*;

/// Validates `limit`, `skip` and `sort` query values.
///
/// `limit` defaults to `max_limit` and must be an integer in
/// `0..=max_limit`; `skip` defaults to 0. Both are checked before failing with
/// `invalidQueryOptions`. `sort` lists sortable fields, each optionally
/// prefixed with `-` for descending order; unknown fields fail together with
/// `invalidSortables`. An `_id` tie-break always closes the sort.
pub fn build_find_options(
    limit: Option<&str>,
    skip: Option<&str>,
    sort: Option<&str>,
    model: &ModelDescriptor,
    max_limit: usize,
) -> AppResult<FindOptions> {
    let mut messages = Vec::new();

    let parsed_limit = match limit {
        None => Some(max_limit),
        Some(text) => parse_count(text).filter(|limit| *limit <= max_limit),
    };
    if parsed_limit.is_none() {
        messages.push(
            Message::new(MessageKey::InvalidLimit)
                .with("value", limit.unwrap_or_default())
                .with("max", max_limit),
        );
    }

    let parsed_skip = match skip {
        None => Some(0),
        Some(text) => parse_count(text),
    };
    if parsed_skip.is_none() {
        messages.push(
            Message::new(MessageKey::InvalidSkip).with("value", skip.unwrap_or_default()),
        );
    }

    let (Some(limit), Some(skip)) = (parsed_limit, parsed_skip) else {
        return Err(AppError::Validation(
            Rejection::new(Message::new(MessageKey::InvalidQueryOptions)).with_messages(messages),
        ));
    };

    Ok(FindOptions {
        limit,
        skip,
        sort: parse_sort(sort, model)?,
    })
}

fn parse_count(text: &str) -> Option<usize> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    text.parse().ok()
}

fn parse_sort(sort: Option<&str>, model: &ModelDescriptor) -> AppResult<Vec<SortKey>> {
    let mut keys: Vec<SortKey> = Vec::new();
    let mut invalid = Vec::new();

    for part in sort.unwrap_or_default().split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }
        let key = match part.strip_prefix('-') {
            Some(field) => SortKey::descending(field),
            None => SortKey::ascending(part),
        };
        if !model.is_sortable(&key.field) {
            invalid.push(part);
        } else if keys.iter().all(|existing| existing.field != key.field) {
            keys.push(key);
        }
    }

    if !invalid.is_empty() {
        return Err(AppError::Validation(
            Rejection::new(
                Message::new(MessageKey::InvalidSortables)
                    .with("expected", model.sortables.join(", ")),
            )
            .with_invalid(InvalidKind::Sortables, json!(invalid)),
        ));
    }

    if keys.is_empty() {
        keys.push(SortKey::ascending(model.default_sort()));
    }
    if keys.iter().all(|key| key.field != "_id") {
        keys.push(SortKey::ascending("_id"));
    }

    Ok(keys)
}
