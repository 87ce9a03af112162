// gallery facade: every request is answered from the filesystem as it is now

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::batch::BatchRunner;
use super::cache::{ThumbnailCache, ThumbnailError};
use super::codec::{ImageCodec, MediaCodec};
use super::error::GalleryError;
use super::sampler::sample;
use super::types::{AlbumEntry, Limit, MediaBuffer, MediaMetadata, ThumbnailSpec, ThumbnailTag};
use super::walker::{scan_directory, walk};
use crate::config::GalleryConfig;
use crate::utils::media::MediaKind;
use crate::utils::paths::confine;
use crate::utils::sanitize::{require_all, sanitize};

pub struct Gallery {
    image_root: PathBuf,
    video_extensions: Vec<String>,
    codec: Arc<dyn MediaCodec>,
    cache: ThumbnailCache,
    batch: BatchRunner,
}

impl Gallery {
    pub fn new(config: &GalleryConfig) -> Self {
        Self::with_codec(config, Arc::new(ImageCodec::from_config(config)))
    }

    pub fn with_codec(config: &GalleryConfig, codec: Arc<dyn MediaCodec>) -> Self {
        let batch = BatchRunner::new(config.concurrency)
            .with_item_timeout(config.item_timeout_secs.map(Duration::from_secs));

        Self {
            image_root: config.image_dir.clone(),
            video_extensions: config.video_extensions.clone(),
            cache: ThumbnailCache::new(
                config.thumb_dir.clone(),
                config.video_extensions.clone(),
                codec.clone(),
            ),
            codec,
            batch,
        }
    }

    /// immediate subdirectories of the image root
    #[instrument(skip(self))]
    pub async fn albums(&self) -> Result<BTreeMap<String, AlbumEntry>, GalleryError> {
        let scan = scan_directory(&self.image_root)
            .await
            .map_err(GalleryError::DirectoryUnreadable)?;

        if scan.total_entries == 0 {
            return Err(GalleryError::NoAlbums);
        }

        Ok(scan
            .directories
            .into_iter()
            .map(|name| {
                let entry = AlbumEntry {
                    description: name.clone(),
                };
                (name, entry)
            })
            .collect())
    }

    /// metadata for (a sample of) the files in an album, keyed by relative path
    #[instrument(skip(self))]
    pub async fn list_files(
        &self,
        album: Option<&str>,
        num_results: Option<&str>,
        distributed: Option<&str>,
    ) -> Result<HashMap<String, MediaMetadata>, GalleryError> {
        let [album] = require_all([album])?;
        let album_dir = confine(&self.image_root, &album)?;
        let files = self.album_files(&album_dir, num_results, distributed).await?;

        let results = self
            .batch
            .run(files, |file| {
                let album_dir = &album_dir;
                async move {
                    let source = confine(album_dir, &file)?;
                    let mut metadata = self
                        .codec
                        .metadata(&source, self.kind_of(&source))
                        .await
                        .map_err(GalleryError::codec("unable to read metadata"))?;
                    metadata.description = file.clone();
                    Ok::<_, GalleryError>((file, metadata))
                }
            })
            .await?;

        Ok(results)
    }

    /// base64 thumbnails for one file, or for (a sample of) a whole album.
    /// a single requested thumbnail that fails is an error; in a batch the
    /// failing files are just left out.
    #[instrument(skip(self))]
    pub async fn thumbnails(
        &self,
        album: Option<&str>,
        thumb: Option<&str>,
        image: Option<&str>,
        num_results: Option<&str>,
        distributed: Option<&str>,
    ) -> Result<HashMap<String, ThumbnailTag>, GalleryError> {
        let [album, thumb] = require_all([album, thumb])?;
        let spec: ThumbnailSpec = thumb.parse()?;

        if let Some(file) = image.filter(|f| !f.is_empty()) {
            let source = confine(&self.image_root, Path::new(&album).join(file))?;
            let thumbnail = self
                .cache
                .get_or_create(&source, &album, file, &spec)
                .await
                .map_err(|err| thumbnail_failure(err, "unable to get thumb image"))?;

            let tag = ThumbnailTag {
                base64tag: thumbnail.to_data_uri(),
            };
            return Ok(HashMap::from([(file.to_string(), tag)]));
        }

        let album_dir = confine(&self.image_root, &album)?;
        let files = self.album_files(&album_dir, num_results, distributed).await?;

        let results = self
            .batch
            .run(files, |file| {
                let (album, album_dir, spec) = (&album, &album_dir, &spec);
                async move {
                    let source = confine(album_dir, &file)?;
                    let thumbnail = self
                        .cache
                        .get_or_create(&source, album, &file, spec)
                        .await
                        .map_err(|err| thumbnail_failure(err, "unable to get thumb image"))?;
                    let tag = ThumbnailTag {
                        base64tag: thumbnail.to_data_uri(),
                    };
                    Ok::<_, GalleryError>((file, tag))
                }
            })
            .await?;

        Ok(results)
    }

    /// one file, optionally thumbnailed. a failed thumbnail falls back to
    /// the original; only both failing is an error.
    #[instrument(skip(self))]
    pub async fn get_asset(
        &self,
        album: Option<&str>,
        image: Option<&str>,
        thumb: Option<&str>,
    ) -> Result<MediaBuffer, GalleryError> {
        let [album] = require_all([album])?;
        let file = image
            .filter(|f| !f.is_empty())
            .ok_or(GalleryError::MissingArgument)?;
        let source = confine(&self.image_root, Path::new(&album).join(file))?;

        let Some(thumb) = thumb.filter(|t| !t.is_empty()) else {
            return self
                .cache
                .get_original(&source)
                .await
                .map_err(GalleryError::codec("unable to get image"));
        };

        let spec: ThumbnailSpec = sanitize(thumb)?.parse()?;
        match self.cache.get_or_create(&source, &album, file, &spec).await {
            Ok(thumbnail) => return Ok(thumbnail),
            Err(ThumbnailError::Codec(err)) => {
                warn!("thumbnail failed for {}, serving original: {}", source.display(), err);
            }
            Err(ThumbnailError::InvalidPath(err)) => return Err(err.into()),
        }

        self.cache
            .get_original(&source)
            .await
            .map_err(GalleryError::codec("unable to get backup image"))
    }

    /// confined absolute path of a video, for a streaming collaborator
    #[instrument(skip(self))]
    pub fn get_video_path(
        &self,
        album: Option<&str>,
        image: Option<&str>,
    ) -> Result<PathBuf, GalleryError> {
        let [album] = require_all([album])?;
        let file = image
            .filter(|f| !f.is_empty())
            .ok_or(GalleryError::MissingArgument)?;

        Ok(confine(&self.image_root, Path::new(&album).join(file))?)
    }

    fn kind_of(&self, path: &Path) -> MediaKind {
        MediaKind::of(path, &self.video_extensions)
    }

    /// walk an album and cut the listing down to the requested sample
    async fn album_files(
        &self,
        album_dir: &Path,
        num_results: Option<&str>,
        distributed: Option<&str>,
    ) -> Result<Vec<String>, GalleryError> {
        let dir = album_dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || walk(&dir)).await??;

        if files.is_empty() {
            return Err(GalleryError::NoFilesFound);
        }

        let total = files.len();
        let files = sample(files, Limit::parse(num_results), distributed == Some("true"));
        debug!("processing {} of {} files", files.len(), total);

        Ok(files)
    }
}

fn thumbnail_failure(err: ThumbnailError, context: &'static str) -> GalleryError {
    match err {
        ThumbnailError::InvalidPath(err) => err.into(),
        ThumbnailError::Codec(source) => GalleryError::Codec { context, source },
    }
}
