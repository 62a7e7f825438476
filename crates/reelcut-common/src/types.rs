//! Media vocabulary shared across reelcut.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The class of media carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Video frames.
    Video,
    /// Continuous audio.
    Audio,
    /// Timecode (typically a single sample covering the whole track).
    Timecode,
    /// Text / captions.
    Text,
    /// Timed metadata.
    Metadata,
    /// Anything the editor has no special handling for.
    Unknown,
}

impl MediaKind {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Timecode => write!(f, "timecode"),
            Self::Text => write!(f, "text"),
            Self::Metadata => write!(f, "metadata"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_serialization() {
        let kind = MediaKind::Video;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#""video""#);

        let kind: MediaKind = serde_json::from_str(r#""timecode""#).unwrap();
        assert_eq!(kind, MediaKind::Timecode);
    }

    #[test]
    fn test_media_kind_predicates() {
        assert!(MediaKind::Video.is_video());
        assert!(!MediaKind::Video.is_audio());
        assert!(MediaKind::Audio.is_audio());
        assert!(!MediaKind::Timecode.is_audio());
    }

    #[test]
    fn test_media_kind_display() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
        assert_eq!(MediaKind::Metadata.to_string(), "metadata");
    }
}
