// media-serving core: album walks, sampling, thumbnail caching and batches

pub mod batch;
pub mod cache;
pub mod codec;
pub mod error;
pub mod sampler;
pub mod service;
pub mod types;
pub mod walker;

pub use batch::{BatchError, BatchRunner};
pub use cache::{ThumbnailCache, ThumbnailError};
pub use codec::{CodecError, ImageCodec, MediaCodec};
pub use error::GalleryError;
pub use sampler::sample;
pub use service::Gallery;
pub use types::{
    AlbumEntry, Envelope, ErrorBody, InvalidDimensions, Limit, MediaBuffer, MediaMetadata,
    ThumbnailSpec, ThumbnailTag,
};
pub use walker::{walk, WalkError};
