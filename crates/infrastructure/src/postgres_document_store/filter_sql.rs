use bandstand_application::{Filter, RangeBound, SortDirection, SortKey};
use serde_json::{Value, json};
use sqlx::{Postgres, QueryBuilder};

/// Appends a boolean SQL expression over the `data` column.
pub(super) fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            builder.push("TRUE");
        }
        Filter::And(filters) => push_group(builder, filters, " AND ", "TRUE"),
        Filter::Or(filters) => push_group(builder, filters, " OR ", "FALSE"),
        Filter::Eq { field, value } => push_equals(builder, field, value),
        Filter::In { field, values } => {
            builder.push('(');
            if values.is_empty() {
                builder.push("FALSE");
            }
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                push_equals(builder, field, value);
            }
            builder.push(')');
        }
        Filter::ContainsAny { field, values } => {
            builder.push('(');
            if values.is_empty() {
                builder.push("FALSE");
            }
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                builder.push("data -> ");
                builder.push_bind(field.clone());
                builder.push(" @> ");
                builder.push_bind(json!([value]));
            }
            builder.push(')');
        }
        Filter::ContainsText { field, text } => {
            builder.push("data ->> ");
            builder.push_bind(field.clone());
            builder.push(" ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(text)));
            builder.push(" ESCAPE '\\'");
        }
        Filter::Range {
            field,
            lower,
            upper,
        } => {
            builder.push('(');
            match (lower, upper) {
                (None, None) => {
                    builder.push("data ? ");
                    builder.push_bind(field.clone());
                }
                _ => {
                    let mut first = true;
                    for (bound, inclusive_operator, exclusive_operator) in
                        [(lower, ">=", ">"), (upper, "<=", "<")]
                    {
                        let Some(bound) = bound else {
                            continue;
                        };
                        if !first {
                            builder.push(" AND ");
                        }
                        first = false;
                        let operator = if bound.inclusive {
                            inclusive_operator
                        } else {
                            exclusive_operator
                        };
                        push_bound(builder, field, bound, operator);
                    }
                }
            }
            builder.push(')');
        }
    }
}

/// Appends `ORDER BY` over JSONB values; JSONB orders numbers numerically and
/// absent fields come last ascending, first descending.
pub(super) fn push_sort(builder: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) {
    builder.push(" ORDER BY ");
    for (index, key) in sort.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push("data -> ");
        builder.push_bind(key.field.clone());
        match key.direction {
            SortDirection::Ascending => builder.push(" ASC"),
            SortDirection::Descending => builder.push(" DESC"),
        };
    }
    if sort.is_empty() {
        builder.push("id ASC");
    } else {
        builder.push(", id ASC");
    }
}

fn push_group(
    builder: &mut QueryBuilder<'_, Postgres>,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) {
    builder.push('(');
    if filters.is_empty() {
        builder.push(empty);
    }
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_filter(builder, filter);
    }
    builder.push(')');
}

fn push_equals(builder: &mut QueryBuilder<'_, Postgres>, field: &str, value: &Value) {
    builder.push("data -> ");
    builder.push_bind(field.to_owned());
    builder.push(" = ");
    builder.push_bind(value.clone());
}

fn push_bound(
    builder: &mut QueryBuilder<'_, Postgres>,
    field: &str,
    bound: &RangeBound,
    operator: &str,
) {
    match &bound.value {
        Value::Number(number) => {
            builder.push("(CASE WHEN jsonb_typeof(data -> ");
            builder.push_bind(field.to_owned());
            builder.push(") = 'number' THEN (data ->> ");
            builder.push_bind(field.to_owned());
            builder.push(")::NUMERIC END) ");
            builder.push(operator);
            builder.push(" (");
            builder.push_bind(number.to_string());
            builder.push(")::NUMERIC");
        }
        other => {
            let text = match other {
                Value::String(text) => text.clone(),
                value => value.to_string(),
            };
            builder.push("(data ->> ");
            builder.push_bind(field.to_owned());
            builder.push(") COLLATE \"C\" ");
            builder.push(operator);
            builder.push(' ');
            builder.push_bind(text);
        }
    }
}

/// Escapes `ILIKE` wildcards so the text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use bandstand_application::{Filter, RangeBound, SortKey};
    use sqlx::{Postgres, QueryBuilder};

    use super::{escape_like, push_filter, push_sort};

    fn render(filter: &Filter) -> String {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("");
        push_filter(&mut builder, filter);
        builder.sql().to_owned()
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("Phoenix"), "Phoenix");
    }

    #[test]
    fn conjunctions_render_nested_groups() {
        let filter = Filter::And(vec![
            Filter::eq("band", "abc"),
            Filter::Or(vec![Filter::eq("_id", "x"), Filter::eq("code", "x")]),
        ]);

        assert_eq!(
            render(&filter),
            "(data -> $1 = $2 AND (data -> $3 = $4 OR data -> $5 = $6))"
        );
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let filter = Filter::In {
            field: "type".to_owned(),
            values: Vec::new(),
        };

        assert_eq!(render(&filter), "(FALSE)");
    }

    #[test]
    fn half_open_ranges_use_strict_upper_bound() {
        let filter = Filter::Range {
            field: "releaseDate".to_owned(),
            lower: Some(RangeBound::inclusive("2009-01-01")),
            upper: Some(RangeBound::exclusive("2010-01-01")),
        };

        assert_eq!(
            render(&filter),
            "((data ->> $1) COLLATE \"C\" >= $2 AND (data ->> $3) COLLATE \"C\" < $4)"
        );
    }

    #[test]
    fn sort_always_ends_with_row_id() {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("");
        push_sort(
            &mut builder,
            &[SortKey::descending("rating"), SortKey::ascending("_id")],
        );

        assert_eq!(
            builder.sql(),
            " ORDER BY data -> $1 DESC, data -> $2 ASC, id ASC"
        );
    }
}
