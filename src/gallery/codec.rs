// decode, resize and persist media through an opaque codec capability

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, metadata::Orientation, DynamicImage,
    ImageDecoder, ImageReader,
};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

use super::types::{MediaBuffer, MediaMetadata, ThumbnailSpec};
use crate::config::GalleryConfig;
use crate::utils::media::{get_mime_type, MediaKind};

const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("frame extraction failed: {0}")]
    FrameExtraction(String),

    #[error("codec task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// the pixel-level work the gallery delegates. implementations may be slow
/// and may fail for any single file.
#[async_trait]
pub trait MediaCodec: Send + Sync {
    /// return the artifact at `artifact` when it is present and usable,
    /// otherwise render `source` into `spec`, persist it there and return it
    async fn thumbnail(
        &self,
        source: &Path,
        artifact: &Path,
        spec: ThumbnailSpec,
        kind: MediaKind,
    ) -> Result<MediaBuffer, CodecError>;

    /// the source file, normalized for display
    async fn original(&self, source: &Path, kind: MediaKind) -> Result<MediaBuffer, CodecError>;

    async fn metadata(&self, source: &Path, kind: MediaKind) -> Result<MediaMetadata, CodecError>;
}

/// codec backed by the `image` crate, with video frames pulled out by ffmpeg
#[derive(Debug, Clone)]
pub struct ImageCodec {
    ffmpeg_path: PathBuf,
    jpeg_quality: u8,
    invalidate_stale: bool,
}

impl ImageCodec {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, jpeg_quality: u8, invalidate_stale: bool) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
            invalidate_stale,
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(
            config.ffmpeg_path.clone(),
            config.jpeg_quality,
            config.invalidate_stale,
        )
    }

    async fn read_cached(
        &self,
        source: &Path,
        artifact: &Path,
    ) -> Result<Option<MediaBuffer>, CodecError> {
        let artifact_meta = match fs::metadata(artifact).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if !artifact_meta.is_file() || artifact_meta.len() == 0 {
            return Ok(None);
        }

        if self.invalidate_stale {
            let source_modified = fs::metadata(source).await?.modified()?;
            if artifact_meta.modified()? < source_modified {
                debug!("cached thumbnail is stale: {}", artifact.display());
                return Ok(None);
            }
        }

        let bytes = fs::read(artifact).await?;
        Ok(Some(MediaBuffer::new(bytes, THUMBNAIL_CONTENT_TYPE)))
    }

    async fn extract_frame(&self, source: &Path) -> Result<Vec<u8>, CodecError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-i"])
            .arg(source)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "pipe:1"])
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CodecError::FrameExtraction(stderr.trim().to_string()));
        }
        if output.stdout.is_empty() {
            return Err(CodecError::FrameExtraction("no frame decoded".to_string()));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaCodec for ImageCodec {
    async fn thumbnail(
        &self,
        source: &Path,
        artifact: &Path,
        spec: ThumbnailSpec,
        kind: MediaKind,
    ) -> Result<MediaBuffer, CodecError> {
        if let Some(cached) = self.read_cached(source, artifact).await? {
            return Ok(cached);
        }

        let frame = match kind {
            MediaKind::Video => Some(self.extract_frame(source).await?),
            MediaKind::Image => None,
        };

        let source_path = source.to_path_buf();
        let quality = self.jpeg_quality;
        let bytes = tokio::task::spawn_blocking(move || {
            render_thumbnail(&source_path, frame, spec, quality)
        })
        .await??;

        persist_atomically(artifact, &bytes).await?;
        info!("cached thumbnail: {}", artifact.display());

        Ok(MediaBuffer::new(bytes, THUMBNAIL_CONTENT_TYPE))
    }

    async fn original(&self, source: &Path, kind: MediaKind) -> Result<MediaBuffer, CodecError> {
        let bytes = Bytes::from(fs::read(source).await?);
        let content_type = get_mime_type(source);

        if kind.is_video() {
            return Ok(MediaBuffer::new(bytes, content_type));
        }

        tokio::task::spawn_blocking(move || normalize_orientation(bytes, content_type)).await?
    }

    async fn metadata(&self, source: &Path, kind: MediaKind) -> Result<MediaMetadata, CodecError> {
        let file_meta = fs::metadata(source).await?;
        let modified = file_meta.modified().ok().map(DateTime::<Utc>::from);

        let (width, height) = match kind {
            MediaKind::Video => (None, None),
            MediaKind::Image => {
                let path = source.to_path_buf();
                let (w, h) = tokio::task::spawn_blocking(move || {
                    ImageReader::open(&path)?
                        .with_guessed_format()?
                        .into_dimensions()
                        .map_err(CodecError::from)
                })
                .await??;
                (Some(w), Some(h))
            }
        };

        Ok(MediaMetadata {
            kind,
            content_type: get_mime_type(source),
            width,
            height,
            size: file_meta.len(),
            modified,
            description: String::new(),
        })
    }
}

fn decode_oriented(source: &Path) -> Result<DynamicImage, CodecError> {
    let mut decoder = ImageReader::open(source)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

fn render_thumbnail(
    source: &Path,
    frame: Option<Vec<u8>>,
    spec: ThumbnailSpec,
    quality: u8,
) -> Result<Vec<u8>, CodecError> {
    let img = match frame {
        Some(frame) => image::load_from_memory(&frame)?,
        None => decode_oriented(source)?,
    };

    // never upscale
    let width = spec.width.min(img.width());
    let height = spec.height.min(img.height());
    let resized = if width != img.width() || height != img.height() {
        img.resize(width, height, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&rgb)?;
    Ok(out)
}

/// rotate per the embedded orientation; untouched bytes are passed through
fn normalize_orientation(bytes: Bytes, content_type: String) -> Result<MediaBuffer, CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes.clone())).with_guessed_format()?;
    let Some(format) = reader.format() else {
        return Ok(MediaBuffer::new(bytes, content_type));
    };

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    if orientation == Orientation::NoTransforms {
        return Ok(MediaBuffer::new(bytes, content_type));
    }

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)?;
    Ok(MediaBuffer::new(out.into_inner(), format.to_mime_type()))
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// write to a sibling temp file and rename over the target, so concurrent
/// readers see either nothing or the whole artifact
async fn persist_atomically(target: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let parent = target
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "artifact has no parent"))?;
    fs::create_dir_all(parent).await?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let written = match fs::write(&temp, bytes).await {
        Ok(()) => fs::rename(&temp, target).await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        // a partial write or a failed rename must not leave the temp file behind
        if let Err(cleanup) = fs::remove_file(&temp).await {
            debug!("could not remove {}: {}", temp.display(), cleanup);
        }
        return Err(err.into());
    }
    Ok(())
}
