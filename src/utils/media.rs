// media classification and content type helpers

use serde::{Deserialize, Serialize};
use std::path::Path;

/// how a media file is thumbnailed and served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// classify by extension; `video_extensions` is matched case-insensitively
    /// and may be given with or without a leading dot
    pub fn of(path: &Path, video_extensions: &[String]) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return MediaKind::Image;
        };

        let is_video = video_extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext));

        if is_video {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }
}

/// get mime type for a file based on its extension
pub fn get_mime_type(file_path: &Path) -> String {
    mime_guess::from_path(file_path)
        .first_or_octet_stream()
        .to_string()
}
