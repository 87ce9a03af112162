// byte-range file streaming for video playback

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use http_range_header::parse_range_header;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::utils::media::get_mime_type;

/// stream a file, honouring a single `Range` request
pub async fn stream_file(file_path: &Path, headers: &HeaderMap) -> Result<Response, StatusCode> {
    info!("streaming file: {}", file_path.display());

    let file = File::open(file_path).await.map_err(|e| {
        error!("failed to open file {}: {}", file_path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let metadata = file.metadata().await.map_err(|e| {
        error!("failed to get file metadata {}: {}", file_path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if !metadata.is_file() {
        warn!("refusing to stream non-file: {}", file_path.display());
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let file_size = metadata.len();
    let mime_type = get_mime_type(file_path);

    let Some(range_header) = headers.get(header::RANGE) else {
        return full_response(file, file_size, mime_type);
    };

    let Ok(range_str) = range_header.to_str() else {
        warn!("invalid range header encoding");
        return unsatisfiable(file_size);
    };

    let ranges = match parse_range_header(range_str).and_then(|r| r.validate(file_size)) {
        Ok(ranges) => ranges,
        Err(_) => {
            warn!("range not satisfiable: {}", range_str);
            return unsatisfiable(file_size);
        }
    };

    // multipart ranges are not supported, the first one wins
    match ranges.first() {
        Some(range) => partial_response(file, *range.start(), *range.end(), file_size, mime_type).await,
        None => full_response(file, file_size, mime_type),
    }
}

async fn partial_response(
    mut file: File,
    start: u64,
    end: u64,
    file_size: u64,
    mime_type: String,
) -> Result<Response, StatusCode> {
    file.seek(std::io::SeekFrom::Start(start)).await.map_err(|e| {
        error!("failed to seek file: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let take_bytes = end - start + 1;
    info!("serving partial content: bytes {}-{}/{}", start, end, file_size);

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, take_bytes)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}"))
        .body(Body::from_stream(ReaderStream::new(file.take(take_bytes))))
        .map_err(|e| {
            error!("failed to build partial response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

fn full_response(file: File, file_size: u64, mime_type: String) -> Result<Response, StatusCode> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, file_size)
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            error!("failed to build response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

fn unsatisfiable(file_size: u64) -> Result<Response, StatusCode> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(Body::empty())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
