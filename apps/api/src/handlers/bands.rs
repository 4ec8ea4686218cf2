use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{BandResponse, DeletedBandResponse, UpdatedBandResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{Listing, QueryPairs, listing, object_body};

pub async fn list_bands_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Listing<BandResponse>> {
    let page = state.band_service.list(&params).await?;

    Ok(listing(page))
}

pub async fn get_band_handler(
    State(state): State<AppState>,
    Path(band_key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> ApiResult<Json<BandResponse>> {
    let band = state.band_service.get(&band_key, &params).await?;

    Ok(Json(band.into()))
}

pub async fn create_band_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<BandResponse>)> {
    let payload = object_body(&body)?;
    let band = state.band_service.create(&payload).await?;

    Ok((StatusCode::CREATED, Json(band.into())))
}

pub async fn update_band_handler(
    State(state): State<AppState>,
    Path(band_key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<UpdatedBandResponse>> {
    let payload = object_body(&body)?;
    let revision = state.band_service.update(&band_key, &payload).await?;

    Ok(Json(revision.into()))
}

pub async fn delete_band_handler(
    State(state): State<AppState>,
    Path(band_key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<DeletedBandResponse>> {
    let payload = object_body(&body)?;
    let band = state.band_service.delete(&band_key, &payload).await?;

    Ok(Json(band.into()))
}
