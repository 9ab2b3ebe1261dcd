use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MediaError;

/// Kind of media being transported.
///
/// Selects the HKDF context label and whether a streaming sidecar is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaCategory {
    /// All categories, in wire-label order.
    pub const ALL: [MediaCategory; 4] = [
        MediaCategory::Image,
        MediaCategory::Video,
        MediaCategory::Audio,
        MediaCategory::Document,
    ];

    /// HKDF info string used when expanding the media key.
    pub fn hkdf_label(self) -> &'static [u8] {
        match self {
            MediaCategory::Image => b"WhatsApp Image Keys",
            MediaCategory::Video => b"WhatsApp Video Keys",
            MediaCategory::Audio => b"WhatsApp Audio Keys",
            MediaCategory::Document => b"WhatsApp Document Keys",
        }
    }

    /// Whether receivers can validate this media incrementally (sidecar present).
    pub fn is_streamable(self) -> bool {
        matches!(self, MediaCategory::Video | MediaCategory::Audio)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Image => "IMAGE",
            MediaCategory::Video => "VIDEO",
            MediaCategory::Audio => "AUDIO",
            MediaCategory::Document => "DOCUMENT",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = MediaError;

    /// Case-insensitive: `"VIDEO"`, `"video"` and `"Video"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MediaError::UnsupportedCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            MediaCategory::ALL.iter().map(|c| c.hkdf_label()).collect();
        assert_eq!(labels.len(), 4);
        assert_eq!(MediaCategory::Document.hkdf_label(), b"WhatsApp Document Keys");
    }

    #[test]
    fn test_streamable_categories() {
        assert!(MediaCategory::Video.is_streamable());
        assert!(MediaCategory::Audio.is_streamable());
        assert!(!MediaCategory::Image.is_streamable());
        assert!(!MediaCategory::Document.is_streamable());
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("IMAGE".parse::<MediaCategory>().unwrap(), MediaCategory::Image);
        assert_eq!("audio".parse::<MediaCategory>().unwrap(), MediaCategory::Audio);
        for c in MediaCategory::ALL {
            assert_eq!(c.to_string().parse::<MediaCategory>().unwrap(), c);
        }
    }

    #[test]
    fn test_parse_unknown_category() {
        let err = "STICKER".parse::<MediaCategory>().unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedCategory(ref s) if s == "STICKER"));
    }
}
