// shared test helpers
#![allow(dead_code)] // helpers are shared across multiple integration test crates

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use galleryd::{
    config::{AppConfig, GalleryConfig},
    gallery::{CodecError, Gallery, MediaBuffer, MediaCodec, MediaMetadata, ThumbnailSpec},
    server::create_app_with_codec,
    utils::media::{get_mime_type, MediaKind},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// codec that never decodes anything: thumbnails of existing files are
/// `thumb:<file name>`, originals are the raw file bytes, and any file with
/// "broken" in its path fails thumbnailing and metadata
#[derive(Default)]
pub struct FakeCodec {
    pub thumbnail_calls: AtomicUsize,
    pub artifacts: Mutex<Vec<PathBuf>>,
}

impl FakeCodec {
    pub fn calls(&self) -> usize {
        self.thumbnail_calls.load(Ordering::SeqCst)
    }

    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.artifacts.lock().unwrap().clone()
    }
}

fn is_broken(path: &Path) -> bool {
    path.to_string_lossy().contains("broken")
}

#[async_trait]
impl MediaCodec for FakeCodec {
    async fn thumbnail(
        &self,
        source: &Path,
        artifact: &Path,
        _spec: ThumbnailSpec,
        _kind: MediaKind,
    ) -> Result<MediaBuffer, CodecError> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        self.artifacts.lock().unwrap().push(artifact.to_path_buf());

        tokio::fs::metadata(source).await?;
        if is_broken(source) {
            return Err(CodecError::FrameExtraction("corrupt input".to_string()));
        }

        let name = source.file_name().unwrap().to_string_lossy();
        Ok(MediaBuffer::new(format!("thumb:{name}"), "image/jpeg"))
    }

    async fn original(&self, source: &Path, _kind: MediaKind) -> Result<MediaBuffer, CodecError> {
        let bytes = tokio::fs::read(source).await?;
        Ok(MediaBuffer::new(bytes, get_mime_type(source)))
    }

    async fn metadata(&self, source: &Path, kind: MediaKind) -> Result<MediaMetadata, CodecError> {
        if is_broken(source) {
            return Err(CodecError::FrameExtraction("corrupt input".to_string()));
        }

        Ok(MediaMetadata {
            kind,
            content_type: get_mime_type(source),
            width: Some(640),
            height: Some(480),
            size: fs::metadata(source)?.len(),
            modified: None,
            description: String::new(),
        })
    }
}

/// image root and thumbnail root inside one temp dir
pub struct Fixture {
    pub temp_dir: TempDir,
    pub codec: Arc<FakeCodec>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("images")).unwrap();
        fs::create_dir_all(temp_dir.path().join("thumbs")).unwrap();

        Self {
            temp_dir,
            codec: Arc::new(FakeCodec::default()),
        }
    }

    pub fn image_dir(&self) -> PathBuf {
        self.temp_dir.path().join("images")
    }

    pub fn thumb_dir(&self) -> PathBuf {
        self.temp_dir.path().join("thumbs")
    }

    pub fn add_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.image_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn add_album(&self, name: &str) -> PathBuf {
        let path = self.image_dir().join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            gallery: GalleryConfig {
                image_dir: self.image_dir(),
                thumb_dir: self.thumb_dir(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn gallery(&self) -> Gallery {
        Gallery::with_codec(&self.config().gallery, self.codec.clone())
    }

    pub fn app(&self) -> axum::Router {
        create_app_with_codec(&self.config(), self.codec.clone())
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_range(uri: &str, range: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::RANGE, range)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
