// gallery api handlers

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use super::stream::stream_file;
use crate::gallery::{Envelope, GalleryError};
use crate::server::app::AppState;

/// query-string arguments shared by the gallery routes
#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    pub album: Option<String>,
    pub image: Option<String>,
    pub thumb: Option<String>,
    pub num_results: Option<String>,
    pub distributed: Option<String>,
}

fn envelope<T: Serialize>(result: Result<T, GalleryError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(Envelope::Result(value))).into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &GalleryError) -> Response {
    error!("request failed: {}", err);
    (err.status_code(), Json(Envelope::<()>::from_error(err))).into_response()
}

pub async fn ping() -> Json<Envelope<&'static str>> {
    Json(Envelope::Result("pong"))
}

#[instrument(skip(state))]
pub async fn albums(State(state): State<AppState>) -> Response {
    envelope(state.gallery.albums().await)
}

#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>, Query(query): Query<GalleryQuery>) -> Response {
    envelope(
        state
            .gallery
            .list_files(
                query.album.as_deref(),
                query.num_results.as_deref(),
                query.distributed.as_deref(),
            )
            .await,
    )
}

#[instrument(skip(state))]
pub async fn thumbnails(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Response {
    envelope(
        state
            .gallery
            .thumbnails(
                query.album.as_deref(),
                query.thumb.as_deref(),
                query.image.as_deref(),
                query.num_results.as_deref(),
                query.distributed.as_deref(),
            )
            .await,
    )
}

#[instrument(skip(state))]
pub async fn image(State(state): State<AppState>, Query(query): Query<GalleryQuery>) -> Response {
    let asset = state
        .gallery
        .get_asset(
            query.album.as_deref(),
            query.image.as_deref(),
            query.thumb.as_deref(),
        )
        .await;

    match asset {
        Ok(buffer) => ([(header::CONTENT_TYPE, buffer.content_type)], buffer.bytes).into_response(),
        Err(err) => error_response(&err),
    }
}

#[instrument(skip(state, headers))]
pub async fn video(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
    headers: HeaderMap,
) -> Response {
    let path = match state
        .gallery
        .get_video_path(query.album.as_deref(), query.image.as_deref())
    {
        Ok(path) => path,
        Err(err) => return error_response(&err),
    };

    match stream_file(&path, &headers).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
