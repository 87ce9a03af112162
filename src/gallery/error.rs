use axum::http::StatusCode;
use thiserror::Error;
use tracing::debug;

use super::batch::BatchError;
use super::codec::CodecError;
use super::types::InvalidDimensions;
use super::walker::WalkError;
use crate::utils::{paths::PathTraversalError, sanitize::SanitizeError};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("missing required argument")]
    MissingArgument,

    #[error("malformed argument")]
    MalformedArgument,

    #[error("no files processed")]
    NoFilesFound,

    #[error("no images processed")]
    NoResultsProduced,

    #[error("no albums processed")]
    NoAlbums,

    #[error("{context}")]
    Codec {
        context: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("directory unreadable: {0}")]
    DirectoryUnreadable(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GalleryError {
    /// every failure surfaces as 500 at this layer, bad input included
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub(crate) fn codec(context: &'static str) -> impl FnOnce(CodecError) -> Self {
        move |source| GalleryError::Codec { context, source }
    }
}

impl From<SanitizeError> for GalleryError {
    fn from(err: SanitizeError) -> Self {
        match err {
            SanitizeError::Missing => GalleryError::MissingArgument,
            SanitizeError::Malformed => GalleryError::MalformedArgument,
        }
    }
}

// escapes are reported exactly like any other malformed input
impl From<PathTraversalError> for GalleryError {
    fn from(err: PathTraversalError) -> Self {
        debug!("rejecting path: {}", err);
        GalleryError::MalformedArgument
    }
}

impl From<InvalidDimensions> for GalleryError {
    fn from(err: InvalidDimensions) -> Self {
        debug!("rejecting thumbnail size: {}", err);
        GalleryError::MalformedArgument
    }
}

impl From<WalkError> for GalleryError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::Unreadable { source, .. } => GalleryError::DirectoryUnreadable(source),
        }
    }
}

impl From<BatchError> for GalleryError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::NoResults => GalleryError::NoResultsProduced,
        }
    }
}

impl From<tokio::task::JoinError> for GalleryError {
    fn from(err: tokio::task::JoinError) -> Self {
        GalleryError::Internal(err.to_string())
    }
}
