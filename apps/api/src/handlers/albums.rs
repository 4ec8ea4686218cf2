use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{AlbumResponse, DeletedAlbumResponse, UpdatedAlbumResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{Listing, QueryPairs, listing, object_body};

pub async fn list_albums_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Listing<AlbumResponse>> {
    let page = state.album_service.list(None, &params).await?;

    Ok(listing(page))
}

pub async fn list_band_albums_handler(
    State(state): State<AppState>,
    Path(band_key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Listing<AlbumResponse>> {
    let page = state.album_service.list(Some(band_key.as_str()), &params).await?;

    Ok(listing(page))
}

pub async fn create_band_album_handler(
    State(state): State<AppState>,
    Path(band_key): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AlbumResponse>)> {
    let payload = object_body(&body)?;
    let album = state.album_service.create(&band_key, &payload).await?;

    Ok((StatusCode::CREATED, Json(album.into())))
}

pub async fn get_album_handler(
    State(state): State<AppState>,
    Path(album_key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Json<AlbumResponse>> {
    let album = state.album_service.get(None, &album_key, &params).await?;

    Ok(Json(album.into()))
}

pub async fn get_band_album_handler(
    State(state): State<AppState>,
    Path((band_key, album_key)): Path<(String, String)>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Json<AlbumResponse>> {
    let album = state
        .album_service
        .get(Some(band_key.as_str()), &album_key, &params)
        .await?;

    Ok(Json(album.into()))
}

pub async fn update_album_handler(
    State(state): State<AppState>,
    Path(album_key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<UpdatedAlbumResponse>> {
    update_album(&state, None, &album_key, &body).await
}

pub async fn update_band_album_handler(
    State(state): State<AppState>,
    Path((band_key, album_key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<UpdatedAlbumResponse>> {
    update_album(&state, Some(band_key.as_str()), &album_key, &body).await
}

pub async fn delete_album_handler(
    State(state): State<AppState>,
    Path(album_key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<DeletedAlbumResponse>> {
    delete_album(&state, None, &album_key, &body).await
}

pub async fn delete_band_album_handler(
    State(state): State<AppState>,
    Path((band_key, album_key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<DeletedAlbumResponse>> {
    delete_album(&state, Some(band_key.as_str()), &album_key, &body).await
}

async fn update_album(
    state: &AppState,
    band_key: Option<&str>,
    album_key: &str,
    body: &Bytes,
) -> ApiResult<Json<UpdatedAlbumResponse>> {
    let payload = object_body(body)?;
    let revision = state
        .album_service
        .update(band_key, album_key, &payload)
        .await?;

    Ok(Json(revision.into()))
}

async fn delete_album(
    state: &AppState,
    band_key: Option<&str>,
    album_key: &str,
    body: &Bytes,
) -> ApiResult<Json<DeletedAlbumResponse>> {
    let payload = object_body(body)?;
    let album = state
        .album_service
        .delete(band_key, album_key, &payload)
        .await?;

    Ok(Json(album.into()))
}
