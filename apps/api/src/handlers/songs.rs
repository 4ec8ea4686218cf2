use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{DeletedSongResponse, SongResponse, UpdatedSongResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{Listing, QueryPairs, listing, object_body};

// Ancestor keys are passed root first: `[band, album]` or `[album]`.

pub async fn list_songs_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Listing<SongResponse>> {
    list_songs(&state, &[], &params).await
}

pub async fn list_album_songs_handler(
    State(state): State<AppState>,
    Path(album_key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Listing<SongResponse>> {
    list_songs(&state, &[album_key.as_str()], &params).await
}

pub async fn list_band_album_songs_handler(
    State(state): State<AppState>,
    Path((band_key, album_key)): Path<(String, String)>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Listing<SongResponse>> {
    list_songs(&state, &[band_key.as_str(), album_key.as_str()], &params).await
}

pub async fn create_album_song_handler(
    State(state): State<AppState>,
    Path(album_key): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SongResponse>)> {
    create_song(&state, &[album_key.as_str()], &body).await
}

pub async fn create_band_album_song_handler(
    State(state): State<AppState>,
    Path((band_key, album_key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SongResponse>)> {
    create_song(&state, &[band_key.as_str(), album_key.as_str()], &body).await
}

pub async fn get_song_handler(
    State(state): State<AppState>,
    Path(song_key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Json<SongResponse>> {
    get_song(&state, &[], &song_key, &params).await
}

pub async fn get_album_song_handler(
    State(state): State<AppState>,
    Path((album_key, song_key)): Path<(String, String)>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Json<SongResponse>> {
    get_song(&state, &[album_key.as_str()], &song_key, &params).await
}

pub async fn get_band_album_song_handler(
    State(state): State<AppState>,
    Path((band_key, album_key, song_key)): Path<(String, String, String)>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Json<SongResponse>> {
    get_song(&state, &[band_key.as_str(), album_key.as_str()], &song_key, &params).await
}

pub async fn update_song_handler(
    State(state): State<AppState>,
    Path(song_key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<UpdatedSongResponse>> {
    update_song(&state, &[], &song_key, &body).await
}

pub async fn update_album_song_handler(
    State(state): State<AppState>,
    Path((album_key, song_key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<UpdatedSongResponse>> {
    update_song(&state, &[album_key.as_str()], &song_key, &body).await
}

pub async fn update_band_album_song_handler(
    State(state): State<AppState>,
    Path((band_key, album_key, song_key)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<Json<UpdatedSongResponse>> {
    update_song(&state, &[band_key.as_str(), album_key.as_str()], &song_key, &body).await
}

pub async fn delete_song_handler(
    State(state): State<AppState>,
    Path(song_key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<DeletedSongResponse>> {
    delete_song(&state, &[], &song_key, &body).await
}

pub async fn delete_album_song_handler(
    State(state): State<AppState>,
    Path((album_key, song_key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<DeletedSongResponse>> {
    delete_song(&state, &[album_key.as_str()], &song_key, &body).await
}

pub async fn delete_band_album_song_handler(
    State(state): State<AppState>,
    Path((band_key, album_key, song_key)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<Json<DeletedSongResponse>> {
    delete_song(&state, &[band_key.as_str(), album_key.as_str()], &song_key, &body).await
}

async fn list_songs(
    state: &AppState,
    ancestors: &[&str],
    params: &QueryPairs,
) -> ApiResult<Listing<SongResponse>> {
    let page = state.song_service.list(ancestors, params).await?;

    Ok(listing(page))
}

async fn create_song(
    state: &AppState,
    ancestors: &[&str],
    body: &Bytes,
) -> ApiResult<(StatusCode, Json<SongResponse>)> {
    let payload = object_body(body)?;
    let song = state.song_service.create(ancestors, &payload).await?;

    Ok((StatusCode::CREATED, Json(song.into())))
}

async fn get_song(
    state: &AppState,
    ancestors: &[&str],
    song_key: &str,
    params: &QueryPairs,
) -> ApiResult<Json<SongResponse>> {
    let song = state.song_service.get(ancestors, song_key, params).await?;

    Ok(Json(song.into()))
}

async fn update_song(
    state: &AppState,
    ancestors: &[&str],
    song_key: &str,
    body: &Bytes,
) -> ApiResult<Json<UpdatedSongResponse>> {
    let payload = object_body(body)?;
    let revision = state
        .song_service
        .update(ancestors, song_key, &payload)
        .await?;

    Ok(Json(revision.into()))
}

async fn delete_song(
    state: &AppState,
    ancestors: &[&str],
    song_key: &str,
    body: &Bytes,
) -> ApiResult<Json<DeletedSongResponse>> {
    let payload = object_body(body)?;
    let song = state
        .song_service
        .delete(ancestors, song_key, &payload)
        .await?;

    Ok(Json(song.into()))
}
