use bandstand_application::{Document, DocumentStore, Filter, FindOptions, RangeBound, SortKey};
use bandstand_core::{AppError, EntityId, MessageKey};
use bandstand_domain::Collection;
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresDocumentStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres document store tests: {error}");
    }

    Some(pool)
}

fn document(value: Value) -> Document {
    match value {
        Value::Object(fields) => Document::new(fields),
        _ => unreachable!(),
    }
}

/// Album in a throwaway band so tests never see each other's rows.
fn album(band: &str, title: &str, year: i64, tags: &[&str]) -> Document {
    let id = EntityId::generate();
    document(json!({
        "_id": id.as_str(),
        "code": format!("{band}-{}", id.as_str()),
        "title": title,
        "band": band,
        "releaseYear": year,
        "tags": tags,
    }))
}

fn titles(documents: &[Document]) -> Vec<&str> {
    documents
        .iter()
        .filter_map(|document| document.get("title").and_then(Value::as_str))
        .collect()
}

#[tokio::test]
async fn filters_sort_and_paginate_over_jsonb() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresDocumentStore::new(pool);
    let band = EntityId::generate().as_str().to_owned();

    for (title, year, tags) in [
        ("United", 2000, vec!["indie"]),
        ("Alphabetical", 2004, vec!["indie", "pop"]),
        ("Wolfgang 100% Live", 2009, vec!["live"]),
        ("Bankrupt!", 2013, vec!["pop"]),
    ] {
        let inserted = store
            .insert(Collection::Albums, album(&band, title, year, &tags))
            .await;
        assert!(inserted.is_ok());
    }

    let scoped = |filter: Filter| Filter::and(vec![Filter::eq("band", band.as_str()), filter]);
    let newest_first = FindOptions {
        limit: 10,
        skip: 0,
        sort: vec![SortKey::descending("releaseYear"), SortKey::ascending("_id")],
    };

    let ranged = store
        .find(
            Collection::Albums,
            &scoped(Filter::Range {
                field: "releaseYear".to_owned(),
                lower: Some(RangeBound::inclusive(2004)),
                upper: Some(RangeBound::exclusive(2013)),
            }),
            &newest_first,
        )
        .await
        .unwrap_or_default();
    assert_eq!(titles(&ranged), ["Wolfgang 100% Live", "Alphabetical"]);

    let tagged = store
        .find(
            Collection::Albums,
            &scoped(Filter::ContainsAny {
                field: "tags".to_owned(),
                values: vec![json!("pop")],
            }),
            &newest_first,
        )
        .await
        .unwrap_or_default();
    assert_eq!(titles(&tagged), ["Bankrupt!", "Alphabetical"]);

    let literal = store
        .find(
            Collection::Albums,
            &scoped(Filter::ContainsText {
                field: "title".to_owned(),
                text: "100%".to_owned(),
            }),
            &newest_first,
        )
        .await
        .unwrap_or_default();
    assert_eq!(titles(&literal), ["Wolfgang 100% Live"]);

    let paged = store
        .find(
            Collection::Albums,
            &scoped(Filter::All),
            &FindOptions {
                skip: 1,
                limit: 2,
                ..newest_first.clone()
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(titles(&paged), ["Wolfgang 100% Live", "Alphabetical"]);

    let removed = store
        .delete_many(Collection::Albums, &scoped(Filter::All))
        .await
        .unwrap_or_default();
    assert_eq!(removed, 4);
}

#[tokio::test]
async fn unique_indexes_surface_as_duplicate_values() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresDocumentStore::new(pool);
    let band = EntityId::generate().as_str().to_owned();
    let original = album(&band, "United", 2000, &[]);
    let code = original.get("code").cloned().unwrap_or(Value::Null);
    assert!(store.insert(Collection::Albums, original).await.is_ok());

    let mut clash = album(&band, "Alphabetical", 2004, &[]);
    clash.set("code", code);
    let result = store.insert(Collection::Albums, clash).await;

    let Err(AppError::Validation(rejection)) = result else {
        unreachable!()
    };
    assert_eq!(rejection.error().key(), MessageKey::ValidationFailed);
    assert!(rejection.has_message(MessageKey::DuplicateValue));

    let cleaned = store
        .delete_many(Collection::Albums, &Filter::eq("band", band.as_str()))
        .await
        .unwrap_or_default();
    assert_eq!(cleaned, 1);
}

#[tokio::test]
async fn field_updates_and_delete_one_work_by_id() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresDocumentStore::new(pool);
    let band = EntityId::generate().as_str().to_owned();
    let stored = album(&band, "United", 2000, &["indie"]);
    let id = stored.id().unwrap_or_default().to_owned();
    assert!(store.insert(Collection::Albums, stored).await.is_ok());

    let mut changes = Map::new();
    changes.insert("title".to_owned(), json!("United (Remastered)"));
    let updated = store
        .update_fields(Collection::Albums, &id, changes, &["tags".to_owned()])
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(updated.get("title"), Some(&json!("United (Remastered)")));
    assert_eq!(updated.get("releaseYear"), Some(&json!(2000)));
    assert!(updated.get("tags").is_none());

    let missing = store
        .update_fields(Collection::Albums, EntityId::generate().as_str(), Map::new(), &[])
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let deleted = store
        .delete_one(Collection::Albums, &Filter::eq("band", band.as_str()))
        .await
        .unwrap_or_default();
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn concurrent_array_appends_are_not_lost() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = std::sync::Arc::new(PostgresDocumentStore::new(pool));
    let band = EntityId::generate();
    let inserted = store
        .insert(
            Collection::Bands,
            document(json!({
                "_id": band.as_str(),
                "name": format!("Band {}", band.as_str()),
                "code": format!("band-{}", band.as_str()),
                "albums": [],
            })),
        )
        .await;
    assert!(inserted.is_ok());

    let tasks = (0..8)
        .map(|index| {
            let store = std::sync::Arc::clone(&store);
            let id = band.as_str().to_owned();
            tokio::spawn(async move {
                store
                    .add_to_set(Collection::Bands, &id, "albums", json!(format!("album-{index}")))
                    .await
                    .is_ok()
            })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        assert!(task.await.unwrap_or_default());
    }

    let pulled = store
        .pull(Collection::Bands, band.as_str(), "albums", json!("album-0"))
        .await
        .unwrap_or_default();
    assert_eq!(pulled, 1);

    let stored = store
        .find_one(Collection::Bands, &Filter::eq("_id", band.as_str()))
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(
        stored.get("albums").and_then(Value::as_array).map(Vec::len),
        Some(7)
    );

    let cleaned = store
        .delete_one(Collection::Bands, &Filter::eq("_id", band.as_str()))
        .await
        .unwrap_or_default();
    assert_eq!(cleaned, 1);
}

#[tokio::test]
async fn sequences_advance_monotonically() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PostgresDocumentStore::new(pool);

    let first = store.next_sequence(Collection::Songs).await.unwrap_or_default();
    let second = store.next_sequence(Collection::Songs).await.unwrap_or_default();

    assert!(first >= 1);
    assert!(second > first);
    assert!(
        store
            .estimated_count(Collection::Songs)
            .await
            .is_ok()
    );
}
