use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use bandstand_application::LocalizationService;
use bandstand_infrastructure::{EmbeddedTranslationSource, InMemoryDocumentStore};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::build_router;
use crate::handlers::TOTAL_COUNT_HEADER;
use crate::state::AppState;

fn test_app() -> Router {
    let localization = LocalizationService::load(&EmbeddedTranslationSource::new(), "en")
        .unwrap_or_else(|_| unreachable!());
    let state = AppState::new(Arc::new(InMemoryDocumentStore::new()), 50, localization);

    build_router(state, None).unwrap_or_else(|_| unreachable!())
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    send_with(app, method, uri, body, &[]).await
}

async fn send_with(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|_| unreachable!());

    let response = app
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    Reply {
        status,
        headers,
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    }
}

async fn create_band(app: &Router, body: Value) -> Value {
    let reply = send(app, Method::POST, "/bands", Some(body)).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.body
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();

    let reply = send(&app, Method::GET, "/health", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn band_album_creation_embeds_one_level_deep() {
    let app = test_app();

    let band = create_band(&app, json!({ "name": "Phoenix" })).await;
    assert_eq!(band["code"], "phoenix");
    assert_eq!(band["albums"], json!([]));

    let album = send(
        &app,
        Method::POST,
        "/bands/phoenix/albums",
        Some(json!({ "title": "Wolfgang Amadeus Phoenix", "type": "studio" })),
    )
    .await;
    assert_eq!(album.status, StatusCode::CREATED);
    assert_eq!(album.body["code"], "1-wolfgang-amadeus-phoenix");
    assert_eq!(album.body["type"], "Studio");
    assert_eq!(album.body["band"]["code"], "phoenix");
    assert_eq!(
        album.body["band"]["albums"],
        Value::Array(vec![album.body["_id"].clone()])
    );

    let fetched = send(&app, Method::GET, "/bands/phoenix", None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    let albums = fetched.body["albums"].as_array().cloned().unwrap_or_default();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0]["title"], "Wolfgang Amadeus Phoenix");
    assert!(albums[0].get("band").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_album_creates_keep_every_band_reference() {
    let app = test_app();
    create_band(&app, json!({ "name": "Phoenix" })).await;

    let tasks = (0..40)
        .map(|index| {
            let app = app.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::POST,
                    "/bands/phoenix/albums",
                    Some(json!({ "title": format!("Session {index}") })),
                )
                .await
                .status
            })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        assert_eq!(task.await.ok(), Some(StatusCode::CREATED));
    }

    let albums = send(&app, Method::GET, "/albums", None).await;
    let band = send(&app, Method::GET, "/bands/phoenix", None).await;
    assert_eq!(albums.body.as_array().map(Vec::len), Some(40));
    assert_eq!(band.body["albums"].as_array().map(Vec::len), Some(40));
}

#[tokio::test]
async fn unknown_patch_fields_are_listed() {
    let app = test_app();
    create_band(&app, json!({ "name": "Phoenix" })).await;
    send(
        &app,
        Method::POST,
        "/bands/phoenix/albums",
        Some(json!({ "title": "United" })),
    )
    .await;

    let reply = send(
        &app,
        Method::PATCH,
        "/albums/1-united",
        Some(json!({ "code": "1-united", "dummy": true })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["invalidFields"], json!(["dummy"]));
    assert!(
        reply.body["error"]
            .as_str()
            .is_some_and(|error| error.contains("title, releaseDate, type, tags"))
    );
}

#[tokio::test]
async fn collection_filters_keep_insertion_order_and_count_header() {
    let app = test_app();
    for (name, year) in [
        ("Daft Punk", 1993),
        ("Air", 1995),
        ("Phoenix", 1996),
        ("Cassius", 1996),
        ("Justice", 2003),
    ] {
        create_band(&app, json!({ "name": name, "formationYear": year })).await;
    }

    let reply = send(&app, Method::GET, "/bands?formationYear=1996", None).await;

    assert_eq!(reply.status, StatusCode::OK);
    let names = reply
        .body
        .as_array()
        .map(|bands| {
            bands
                .iter()
                .filter_map(|band| band["name"].as_str().map(str::to_owned))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    assert_eq!(names, ["Phoenix", "Cassius"]);
    assert_eq!(
        reply
            .headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some("5")
    );
}

#[tokio::test]
async fn pagination_errors_accumulate() {
    let app = test_app();

    let reply = send(&app, Method::GET, "/bands?limit=500&skip=-1", None).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.body["messages"].as_array().map(Vec::len),
        Some(2)
    );
}

#[tokio::test]
async fn songs_render_durations_and_hide_vote_totals() {
    let app = test_app();
    create_band(&app, json!({ "name": "Phoenix" })).await;
    send(
        &app,
        Method::POST,
        "/bands/phoenix/albums",
        Some(json!({ "title": "Wolfgang" })),
    )
    .await;

    let song = send(
        &app,
        Method::POST,
        "/bands/phoenix/albums/1-wolfgang/songs",
        Some(json!({
            "title": "Lisztomania",
            "position": 1,
            "duration": "4:01",
            "rating": 8,
        })),
    )
    .await;

    assert_eq!(song.status, StatusCode::CREATED);
    assert_eq!(song.body["code"], "1-lisztomania");
    assert_eq!(song.body["duration"], "04:01");
    assert_eq!(song.body["rating"], json!(8.0));
    assert!(song.body.get("ratingSum").is_none());
    assert!(song.body.get("voters").is_none());
    assert_eq!(song.body["album"]["code"], "1-wolfgang");
    assert!(song.body["album"]["band"].is_string());

    let clash = send(
        &app,
        Method::POST,
        "/albums/1-wolfgang/songs",
        Some(json!({ "title": "1901", "position": 1 })),
    )
    .await;
    assert_eq!(clash.status, StatusCode::BAD_REQUEST);
    assert_eq!(clash.body["song"]["code"], "1-lisztomania");
    assert!(clash.body["song"].get("ratingSum").is_none());
}

#[tokio::test]
async fn band_delete_requires_cascade_when_albums_remain() {
    let app = test_app();
    create_band(&app, json!({ "name": "Justice" })).await;
    send(
        &app,
        Method::POST,
        "/bands/justice/albums",
        Some(json!({ "title": "Cross" })),
    )
    .await;

    let refused = send(
        &app,
        Method::DELETE,
        "/bands/justice",
        Some(json!({ "code": "justice", "name": "Justice" })),
    )
    .await;
    assert_eq!(refused.status, StatusCode::CONFLICT);

    let deleted = send(
        &app,
        Method::DELETE,
        "/bands/justice",
        Some(json!({ "code": "justice", "name": "Justice", "cascade": true })),
    )
    .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["success"], true);
    assert_eq!(deleted.body["deleted"]["code"], "justice");

    let albums = send(&app, Method::GET, "/albums", None).await;
    assert_eq!(albums.body, json!([]));
}

#[tokio::test]
async fn patch_returns_updated_and_original_states() {
    let app = test_app();
    create_band(&app, json!({ "name": "Gorillaz" })).await;

    let reply = send(
        &app,
        Method::PATCH,
        "/bands/gorillaz",
        Some(json!({ "code": "gorillaz", "name": "Gorillaz without Murdoc" })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["originalBand"]["code"], "gorillaz");
    assert_eq!(reply.body["updatedBand"]["code"], "gorillaz-without-murdoc");
}

#[tokio::test]
async fn nested_routes_distinguish_missing_and_foreign_ancestors() {
    let app = test_app();
    create_band(&app, json!({ "name": "Phoenix" })).await;
    create_band(&app, json!({ "name": "Air" })).await;
    send(
        &app,
        Method::POST,
        "/bands/phoenix/albums",
        Some(json!({ "title": "United" })),
    )
    .await;

    let missing = send(
        &app,
        Method::PATCH,
        "/bands/nobody/albums/1-united",
        Some(json!({ "code": "1-united", "title": "United!" })),
    )
    .await;
    let foreign = send(
        &app,
        Method::PATCH,
        "/bands/air/albums/1-united",
        Some(json!({ "code": "1-united", "title": "United!" })),
    )
    .await;

    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    assert_ne!(missing.body["error"], foreign.body["error"]);
    assert_eq!(foreign.body["expected"]["code"], "phoenix");
    assert_eq!(foreign.body["provided"]["code"], "air");
}

#[tokio::test]
async fn errors_are_localized_from_accept_language() {
    let app = test_app();

    let french = send_with(
        &app,
        Method::GET,
        "/bands/nobody",
        None,
        &[(ACCEPT_LANGUAGE.as_str(), "fr-CA,fr;q=0.9,en;q=0.5")],
    )
    .await;
    let fallback = send_with(
        &app,
        Method::GET,
        "/bands/nobody",
        None,
        &[(ACCEPT_LANGUAGE.as_str(), "de")],
    )
    .await;

    assert_eq!(french.status, StatusCode::NOT_FOUND);
    assert_eq!(
        french.body["error"],
        "Aucun band trouvé avec key 'nobody'."
    );
    assert_eq!(
        french
            .headers
            .get(CONTENT_LANGUAGE)
            .and_then(|value| value.to_str().ok()),
        Some("fr")
    );
    assert_eq!(fallback.body["error"], "No band found with key 'nobody'.");
}

#[tokio::test]
async fn malformed_bodies_and_unknown_routes_are_rejected() {
    let app = test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/bands")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("[\"Phoenix\"]"))
        .unwrap_or_else(|_| unreachable!());
    let response = app
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = send(&app, Method::GET, "/labels", None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "No route matches GET /labels.");
}
