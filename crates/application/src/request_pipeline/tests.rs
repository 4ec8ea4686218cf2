use bandstand_domain::{ALBUM_MODEL, Album, BAND_MODEL, Band, SONG_MODEL};

use super::*;
use crate::test_support::{FakeStore, MAX_LIMIT, object, params, pipeline, rejection};

async fn seed_band(store: &FakeStore, name: &str) -> Document {
    let band = Band::create(EntityId::generate(), &object(json!({ "name": name })))
        .unwrap_or_else(|_| unreachable!());
    store
        .insert(
            Collection::Bands,
            Document::from_entity(&band).unwrap_or_else(|_| unreachable!()),
        )
        .await
        .unwrap_or_else(|_| unreachable!())
}

async fn seed_album(
    pipeline: &RequestPipeline,
    store: &FakeStore,
    band: Document,
    title: &str,
) -> Document {
    let band: Band = band.to_entity().unwrap_or_else(|_| unreachable!());
    let sequence = store
        .next_sequence(Collection::Albums)
        .await
        .unwrap_or_else(|_| unreachable!());
    let album = Album::create(
        EntityId::generate(),
        sequence,
        band.id().clone(),
        &object(json!({ "title": title })),
    )
    .unwrap_or_else(|_| unreachable!());
    let stored = store
        .insert(
            Collection::Albums,
            Document::from_entity(&album).unwrap_or_else(|_| unreachable!()),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let band_document = store
        .find_one(Collection::Bands, &Filter::eq("_id", band.id().as_str()))
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    pipeline
        .attach_child(&ALBUM_MODEL, &stored, band_document)
        .await
        .unwrap_or_else(|_| unreachable!());

    stored
}

#[test]
fn key_filter_matches_id_or_code_for_id_shaped_keys() {
    let id = EntityId::generate();
    assert_eq!(
        key_filter(id.as_str()),
        Filter::Or(vec![
            Filter::eq("_id", id.as_str()),
            Filter::eq("code", id.as_str()),
        ])
    );
    assert_eq!(key_filter("phoenix"), Filter::eq("code", "phoenix"));
}

#[test]
fn whitelist_reports_every_unknown_field() {
    let payload = object(json!({
        "_id": "ignored",
        "code": "ignored",
        "name": "Phoenix",
        "genre": "pop",
        "label": "Glassnote",
    }));

    let rejection = rejection(
        whitelist_fields(&payload, &BAND_MODEL)
            .err()
            .unwrap_or_else(|| unreachable!()),
    );

    assert_eq!(rejection.error().key(), MessageKey::InvalidFields);
    assert_eq!(
        rejection.error().param("allowed"),
        Some("name, formationYear, bio, tags")
    );
    assert_eq!(
        rejection.invalid(),
        Some((InvalidKind::Fields, &json!(["genre", "label"])))
    );
}

#[test]
fn whitelist_accepts_declared_fields() {
    let payload = object(json!({ "title": "Intro", "position": 1, "rating": 7 }));
    assert!(whitelist_fields(&payload, &SONG_MODEL).is_ok());
}

#[tokio::test]
async fn resolve_identity_reports_every_body_problem_at_once() {
    let (_, pipeline) = pipeline();

    let error = pipeline
        .resolve_identity(&BAND_MODEL, &Map::new(), "phoenix", Some("name"))
        .await
        .err()
        .unwrap_or_else(|| unreachable!());

    assert!(matches!(error, AppError::Validation(_)));
    let rejection = rejection(error);
    assert_eq!(rejection.error().key(), MessageKey::InvalidIdentity);
    assert!(rejection.has_message(MessageKey::KeyNotFound));
    assert!(rejection.has_message(MessageKey::MandatoryKeyMissing));
    assert_eq!(rejection.messages().len(), 2);
}

#[tokio::test]
async fn resolve_identity_rejects_conflicting_keys() {
    let (_, pipeline) = pipeline();
    let body = object(json!({ "_id": "abc", "code": "daft-punk" }));

    let rejection = rejection(
        pipeline
            .resolve_identity(&BAND_MODEL, &body, "phoenix", None)
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );

    assert!(rejection.has_message(MessageKey::BothKeysProvided));
    assert!(rejection.has_message(MessageKey::IdMismatch));
    assert!(rejection.has_message(MessageKey::CodeMismatch));
    assert!(rejection.has_message(MessageKey::InvalidId));
}

#[tokio::test]
async fn resolve_identity_finds_by_code_and_by_id() {
    let (store, pipeline) = pipeline();
    let band = seed_band(&store, "Phoenix").await;
    let id = band.id().unwrap_or_default().to_owned();

    let by_code = pipeline
        .resolve_identity(&BAND_MODEL, &object(json!({ "code": "phoenix" })), "phoenix", None)
        .await;
    assert_eq!(by_code.ok().as_ref().and_then(Document::id), Some(id.as_str()));

    let by_id = pipeline
        .resolve_identity(&BAND_MODEL, &object(json!({ "_id": id.as_str() })), &id, None)
        .await;
    assert_eq!(by_id.ok().as_ref().and_then(Document::id), Some(id.as_str()));
}

#[tokio::test]
async fn resolve_identity_reports_missing_target_as_not_found() {
    let (_, pipeline) = pipeline();

    let error = pipeline
        .resolve_identity(&BAND_MODEL, &object(json!({ "code": "air" })), "air", None)
        .await
        .err()
        .unwrap_or_else(|| unreachable!());

    assert!(matches!(error, AppError::NotFound(_)));
    let rejection = rejection(error);
    assert_eq!(rejection.error().key(), MessageKey::ModelNotFound);
    assert_eq!(rejection.error().param("keyKind"), Some("code"));
    assert_eq!(rejection.error().param("key"), Some("air"));
}

#[tokio::test]
async fn resolve_identity_attaches_stored_document_on_discriminator_mismatch() {
    let (store, pipeline) = pipeline();
    seed_band(&store, "Phoenix").await;
    let body = object(json!({ "code": "phoenix", "name": "Justice" }));

    let rejection = rejection(
        pipeline
            .resolve_identity(&BAND_MODEL, &body, "phoenix", Some("name"))
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );

    assert_eq!(rejection.error().key(), MessageKey::MandatoryKeyMismatch);
    assert_eq!(rejection.attachments().len(), 1);
    assert_eq!(rejection.attachments()[0].0, "band");
    assert_eq!(rejection.attachments()[0].1["name"], json!("Phoenix"));
}

#[tokio::test]
async fn resolve_lineage_reports_unknown_ancestor() {
    let (_, pipeline) = pipeline();

    let error = pipeline
        .resolve_lineage(&ALBUM_MODEL, &["nobody"])
        .await
        .err()
        .unwrap_or_else(|| unreachable!());

    assert!(matches!(error, AppError::NotFound(_)));
    let rejection = rejection(error);
    assert_eq!(rejection.error().key(), MessageKey::RelatedNotFound);
    assert_eq!(rejection.error().param("model"), Some("band"));
}

#[tokio::test]
async fn resolve_lineage_rejects_album_of_another_band() {
    let (store, pipeline) = pipeline();
    let phoenix = seed_band(&store, "Phoenix").await;
    seed_band(&store, "Justice").await;
    let album = seed_album(&pipeline, &store, phoenix, "Bankrupt!").await;
    let album_code = album
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let owned = pipeline
        .resolve_lineage(&SONG_MODEL, &["phoenix", album_code.as_str()])
        .await;
    assert_eq!(
        owned.ok().flatten().as_ref().and_then(Document::id),
        album.id()
    );

    let rejection = rejection(
        pipeline
            .resolve_lineage(&SONG_MODEL, &["justice", album_code.as_str()])
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );
    assert_eq!(rejection.error().key(), MessageKey::RelatedMismatch);
    let attachments = rejection.attachments();
    assert_eq!(attachments[0].0, "expected");
    assert_eq!(attachments[0].1["name"], json!("Phoenix"));
    assert_eq!(attachments[1].0, "provided");
    assert_eq!(attachments[1].1["name"], json!("Justice"));
}

#[test]
fn find_options_default_to_max_limit_and_first_sortable() {
    let options = build_find_options(None, None, None, &SONG_MODEL, MAX_LIMIT)
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(options.limit, MAX_LIMIT);
    assert_eq!(options.skip, 0);
    assert_eq!(
        options.sort,
        vec![SortKey::ascending("position"), SortKey::ascending("_id")]
    );
}

#[test]
fn find_options_report_limit_and_skip_together() {
    let rejection = rejection(
        build_find_options(Some("500"), Some("-1"), None, &BAND_MODEL, MAX_LIMIT)
            .err()
            .unwrap_or_else(|| unreachable!()),
    );

    assert_eq!(rejection.error().key(), MessageKey::InvalidQueryOptions);
    assert!(rejection.has_message(MessageKey::InvalidLimit));
    assert!(rejection.has_message(MessageKey::InvalidSkip));
}

#[test]
fn find_options_parse_descending_sort_and_reject_unknown_fields() {
    let options = build_find_options(Some("0"), Some("3"), Some("-name"), &BAND_MODEL, MAX_LIMIT)
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(options.limit, 0);
    assert_eq!(options.skip, 3);
    assert_eq!(
        options.sort,
        vec![SortKey::descending("name"), SortKey::ascending("_id")]
    );

    let rejection = rejection(
        build_find_options(None, None, Some("name,-genre,bio"), &BAND_MODEL, MAX_LIMIT)
            .err()
            .unwrap_or_else(|| unreachable!()),
    );
    assert_eq!(rejection.error().key(), MessageKey::InvalidSortables);
    assert_eq!(
        rejection.invalid(),
        Some((InvalidKind::Sortables, &json!(["-genre", "bio"])))
    );
}

#[tokio::test]
async fn build_query_rejects_unknown_filters_first() {
    let (_, pipeline) = pipeline();

    let rejection = rejection(
        pipeline
            .build_query(
                &BAND_MODEL,
                &params(&[("formationYear", "soon"), ("genre", "pop")]),
                &[],
                None,
            )
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );

    assert_eq!(rejection.error().key(), MessageKey::InvalidFilters);
    assert_eq!(
        rejection.invalid(),
        Some((InvalidKind::Filters, &json!(["genre"])))
    );
}

#[tokio::test]
async fn build_query_reports_numeric_errors_before_range_errors() {
    let (_, pipeline) = pipeline();

    let rejection = rejection(
        pipeline
            .build_query(
                &SONG_MODEL,
                &params(&[("rating", "11"), ("position", "first")]),
                &[],
                None,
            )
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );

    assert_eq!(rejection.error().key(), MessageKey::InvalidNumericFilters);
    assert_eq!(
        rejection.invalid(),
        Some((InvalidKind::NumericFilters, &json!({ "position": "first" })))
    );
}

#[tokio::test]
async fn build_query_scales_duration_ranges_to_seconds() {
    let (_, pipeline) = pipeline();

    let single = pipeline
        .build_query(&SONG_MODEL, &params(&[("duration", "3")]), &[], None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        single.filter,
        Filter::Range {
            field: "duration".to_owned(),
            lower: Some(RangeBound::inclusive(180.0)),
            upper: Some(RangeBound::exclusive(240.0)),
        }
    );

    let pair = pipeline
        .build_query(&SONG_MODEL, &params(&[("duration", "2-4")]), &[], None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        pair.filter,
        Filter::Range {
            field: "duration".to_owned(),
            lower: Some(RangeBound::inclusive(120.0)),
            upper: Some(RangeBound::inclusive(240.0)),
        }
    );
}

#[tokio::test]
async fn build_query_canonicalizes_enum_members_and_rejects_strangers() {
    let (_, pipeline) = pipeline();

    let query = pipeline
        .build_query(&ALBUM_MODEL, &params(&[("type", "ep,studio")]), &[], None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        query.filter,
        Filter::In {
            field: "type".to_owned(),
            values: vec![json!("EP"), json!("Studio")],
        }
    );

    let rejection = rejection(
        pipeline
            .build_query(&ALBUM_MODEL, &params(&[("type", "bootleg")]), &[], None)
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );
    assert_eq!(rejection.error().key(), MessageKey::InvalidEnumFilters);
}

#[tokio::test]
async fn build_query_turns_release_year_into_date_range() {
    let (_, pipeline) = pipeline();

    let query = pipeline
        .build_query(&ALBUM_MODEL, &params(&[("releaseYear", "2009")]), &[], None)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        query.filter,
        Filter::Range {
            field: "releaseDate".to_owned(),
            lower: Some(RangeBound::inclusive("2009-01-01")),
            upper: Some(RangeBound::exclusive("2010-01-01")),
        }
    );

    let rejection = rejection(
        pipeline
            .build_query(&ALBUM_MODEL, &params(&[("releaseYear", "1850")]), &[], None)
            .await
            .err()
            .unwrap_or_else(|| unreachable!()),
    );
    assert_eq!(rejection.error().key(), MessageKey::InvalidDateFilters);
}

#[tokio::test]
async fn build_query_scopes_to_ancestor_and_narrows_to_key() {
    let (store, pipeline) = pipeline();
    let band = seed_band(&store, "Phoenix").await;
    let band_id = band.id().unwrap_or_default().to_owned();

    let query = pipeline
        .build_query(
            &ALBUM_MODEL,
            &params(&[("title", "bank"), ("skip", "2")]),
            &["phoenix"],
            Some("1-bankrupt"),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        query.filter,
        Filter::And(vec![
            Filter::ContainsText {
                field: "title".to_owned(),
                text: "bank".to_owned(),
            },
            Filter::eq("band", band_id),
            Filter::eq("code", "1-bankrupt"),
        ])
    );
    assert_eq!(query.options.limit, 1);
    assert_eq!(query.options.skip, 2);
}

#[tokio::test]
async fn attach_child_deletes_new_child_when_parent_update_fails() {
    let (store, pipeline) = pipeline();
    let band = seed_band(&store, "Phoenix").await;
    let band_id = band
        .id()
        .and_then(EntityId::parse)
        .unwrap_or_else(|| unreachable!());
    let album = Album::create(
        EntityId::generate(),
        1,
        band_id,
        &object(json!({ "title": "Alphabetical" })),
    )
    .unwrap_or_else(|_| unreachable!());
    let stored = store
        .insert(
            Collection::Albums,
            Document::from_entity(&album).unwrap_or_else(|_| unreachable!()),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    store.fail_updates_on(Collection::Bands).await;

    let result = pipeline.attach_child(&ALBUM_MODEL, &stored, band).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(store.all(Collection::Albums).await.is_empty());
}

#[tokio::test]
async fn detach_child_pulls_id_from_parent() {
    let (store, pipeline) = pipeline();
    let band = seed_band(&store, "Phoenix").await;
    let album = seed_album(&pipeline, &store, band, "Ti Amo").await;

    let bands = store.all(Collection::Bands).await;
    assert_eq!(bands[0].get("albums"), Some(&json!([album.id()])));

    pipeline
        .detach_child(&ALBUM_MODEL, &album)
        .await
        .unwrap_or_else(|_| unreachable!());

    let bands = store.all(Collection::Bands).await;
    assert_eq!(bands[0].get("albums"), Some(&json!([])));
}

#[tokio::test]
async fn save_changes_keeps_children_added_after_the_read() {
    let (store, pipeline) = pipeline();
    let original = seed_band(&store, "Phoenix").await;
    let band_id = original.id().unwrap_or_default().to_owned();
    let mut band: Band = original.to_entity().unwrap_or_else(|_| unreachable!());
    band.update(&object(json!({ "name": "Phoenix!" })))
        .unwrap_or_else(|_| unreachable!());

    store
        .add_to_set(Collection::Bands, &band_id, "albums", json!("late-album"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let saved = pipeline
        .save_changes(
            &BAND_MODEL,
            &original,
            &Document::from_entity(&band).unwrap_or_else(|_| unreachable!()),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(saved.get("name"), Some(&json!("Phoenix!")));
    assert_eq!(saved.get("albums"), Some(&json!(["late-album"])));
}
