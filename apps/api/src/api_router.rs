mod cors;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use bandstand_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers::{albums, bands, health, route_not_found_handler, songs};
use crate::middleware;
use crate::state::AppState;

pub fn build_router(app_state: AppState, frontend_url: Option<&str>) -> Result<Router, AppError> {
    let catalog_routes = Router::new()
        .route(
            "/bands",
            get(bands::list_bands_handler).post(bands::create_band_handler),
        )
        .route(
            "/bands/{band_key}",
            get(bands::get_band_handler)
                .patch(bands::update_band_handler)
                .delete(bands::delete_band_handler),
        )
        .route("/albums", get(albums::list_albums_handler))
        .route(
            "/albums/{album_key}",
            get(albums::get_album_handler)
                .patch(albums::update_album_handler)
                .delete(albums::delete_album_handler),
        )
        .route(
            "/bands/{band_key}/albums",
            get(albums::list_band_albums_handler).post(albums::create_band_album_handler),
        )
        .route(
            "/bands/{band_key}/albums/{album_key}",
            get(albums::get_band_album_handler)
                .patch(albums::update_band_album_handler)
                .delete(albums::delete_band_album_handler),
        )
        .route("/songs", get(songs::list_songs_handler))
        .route(
            "/songs/{song_key}",
            get(songs::get_song_handler)
                .patch(songs::update_song_handler)
                .delete(songs::delete_song_handler),
        )
        .route(
            "/albums/{album_key}/songs",
            get(songs::list_album_songs_handler).post(songs::create_album_song_handler),
        )
        .route(
            "/albums/{album_key}/songs/{song_key}",
            get(songs::get_album_song_handler)
                .patch(songs::update_album_song_handler)
                .delete(songs::delete_album_song_handler),
        )
        .route(
            "/bands/{band_key}/albums/{album_key}/songs",
            get(songs::list_band_album_songs_handler)
                .post(songs::create_band_album_song_handler),
        )
        .route(
            "/bands/{band_key}/albums/{album_key}/songs/{song_key}",
            get(songs::get_band_album_song_handler)
                .patch(songs::update_band_album_song_handler)
                .delete(songs::delete_band_album_song_handler),
        );

    let app = Router::new()
        .route("/health", get(health::health_handler))
        .merge(catalog_routes)
        .fallback(route_not_found_handler)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::localize_errors,
        ))
        .layer(TraceLayer::new_for_http());

    let app = match frontend_url {
        Some(frontend_url) => app.layer(cors::build_cors_layer(frontend_url)?),
        None => app,
    };

    Ok(app.with_state(app_state))
}

#[cfg(test)]
mod tests;
