// thumbnail artifact layout and get-or-create

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::codec::{CodecError, MediaCodec};
use super::types::{MediaBuffer, ThumbnailSpec};
use crate::utils::media::MediaKind;
use crate::utils::paths::{confine, PathTraversalError};

const VIDEO_SEGMENT: &str = "video";

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("invalid artifact path: {0}")]
    InvalidPath(#[from] PathTraversalError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// derived thumbnails live under `thumb_root` at
/// `album/[video/]WIDTHxHEIGHT/file`, written lazily on first request and
/// never invalidated here (the codec may opt into staleness checks)
pub struct ThumbnailCache {
    thumb_root: PathBuf,
    video_extensions: Vec<String>,
    codec: Arc<dyn MediaCodec>,
}

impl ThumbnailCache {
    pub fn new(
        thumb_root: impl Into<PathBuf>,
        video_extensions: Vec<String>,
        codec: Arc<dyn MediaCodec>,
    ) -> Self {
        Self {
            thumb_root: thumb_root.into(),
            video_extensions,
            codec,
        }
    }

    pub fn kind_of(&self, file: &Path) -> MediaKind {
        MediaKind::of(file, &self.video_extensions)
    }

    pub fn artifact_path(
        &self,
        album: &str,
        spec: &ThumbnailSpec,
        file: &str,
    ) -> Result<PathBuf, PathTraversalError> {
        let mut relative = PathBuf::from(album);
        if self.kind_of(Path::new(file)).is_video() {
            relative.push(VIDEO_SEGMENT);
        }
        relative.push(spec.to_string());
        relative.push(file);

        confine(&self.thumb_root, relative)
    }

    /// cached bytes for (`album`, `spec`, `file`) if present, otherwise have
    /// the codec render `source` and persist it
    pub async fn get_or_create(
        &self,
        source: &Path,
        album: &str,
        file: &str,
        spec: &ThumbnailSpec,
    ) -> Result<MediaBuffer, ThumbnailError> {
        let artifact = self.artifact_path(album, spec, file)?;
        let kind = self.kind_of(source);

        Ok(self.codec.thumbnail(source, &artifact, *spec, kind).await?)
    }

    pub async fn get_original(&self, source: &Path) -> Result<MediaBuffer, CodecError> {
        self.codec.original(source, self.kind_of(source)).await
    }
}
