//! MIME Types and Verdicts
//!
//! The confidence scale mirrors HTMLMediaElement.canPlayType: an empty
//! answer means "cannot play", "maybe" and "probably" are increasing
//! confidence.

use std::fmt;

/// Playability verdict for a (renderer, type) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    #[default]
    Empty,
    Maybe,
    Probably,
}

impl Verdict {
    /// True for any non-empty verdict
    #[inline]
    pub fn is_playable(self) -> bool {
        self != Verdict::Empty
    }

    /// Canonical string form ("", "maybe", "probably")
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Empty => "",
            Verdict::Maybe => "maybe",
            Verdict::Probably => "probably",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Application,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Application => "application",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            "application" => Some(MediaKind::Application),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed MIME type string
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed mime type: {0}")]
pub struct MimeTypeError(pub String);

/// A parsed media MIME type (kind/subtype)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType {
    pub kind: MediaKind,
    pub subtype: String,
}

impl MimeType {
    /// Build a type from its parts, normalizing the subtype to lowercase
    pub fn new(kind: MediaKind, subtype: &str) -> Self {
        Self {
            kind,
            subtype: subtype.to_ascii_lowercase(),
        }
    }

    /// Parse "video/mp4" style strings
    pub fn parse(s: &str) -> Result<Self, MimeTypeError> {
        let (top, sub) = s
            .split_once('/')
            .ok_or_else(|| MimeTypeError(s.to_string()))?;
        let kind = MediaKind::parse(&top.to_ascii_lowercase())
            .ok_or_else(|| MimeTypeError(s.to_string()))?;
        if sub.is_empty() {
            return Err(MimeTypeError(s.to_string()));
        }
        Ok(Self::new(kind, sub))
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_ordering() {
        assert!(Verdict::Probably > Verdict::Maybe);
        assert!(Verdict::Maybe > Verdict::Empty);
        assert!(!Verdict::Empty.is_playable());
        assert!(Verdict::Maybe.is_playable());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Empty.to_string(), "");
        assert_eq!(Verdict::Probably.to_string(), "probably");
    }

    #[test]
    fn test_mime_parse() {
        let mt = MimeType::parse("Video/MP4").unwrap();
        assert_eq!(mt.kind, MediaKind::Video);
        assert_eq!(mt.subtype, "mp4");
        assert_eq!(mt.to_string(), "video/mp4");
    }

    #[test]
    fn test_mime_parse_rejects_garbage() {
        assert!(MimeType::parse("mp4").is_err());
        assert!(MimeType::parse("text/html").is_err());
        assert!(MimeType::parse("video/").is_err());
    }
}
