//! Extension and type lookup
//!
//! A static table maps comma-joined extensions to one or more MIME
//! subtypes. Extension extraction is deliberately anti-greedy: only the
//! last path segment counts, and query strings / fragments never leak
//! into the extension.

use url::Url;

use crate::{MediaKind, MimeType, Verdict};

/// Extension rows: (comma-joined extensions, media kind, comma-joined subtypes)
const EXTENSION_TABLE: &[(&str, MediaKind, &str)] = &[
    ("mp4,m4v,f4v", MediaKind::Video, "mp4"),
    ("mov", MediaKind::Video, "mp4,quicktime"),
    ("webm,webmv", MediaKind::Video, "webm"),
    ("ogv", MediaKind::Video, "ogg"),
    ("flv", MediaKind::Video, "x-flv"),
    ("3gp", MediaKind::Video, "3gpp"),
    ("mp3", MediaKind::Audio, "mpeg"),
    ("m4a,f4a", MediaKind::Audio, "mp4"),
    ("aac", MediaKind::Audio, "aac"),
    ("ogg,oga", MediaKind::Audio, "ogg"),
    ("wav", MediaKind::Audio, "wav"),
    ("webma", MediaKind::Audio, "webm"),
    ("m3u8", MediaKind::Application, "x-mpegurl"),
    ("f4m", MediaKind::Application, "f4m"),
];

/// A renderer kind's static MIME capability table
#[derive(Debug, Clone, Copy)]
pub struct TypeTable {
    pub entries: &'static [(&'static str, Verdict)],
}

impl TypeTable {
    pub const EMPTY: TypeTable = TypeTable { entries: &[] };

    /// Verdict for a type, `Empty` if the table has no row for it
    pub fn verdict(&self, mime: &MimeType) -> Verdict {
        let wanted = mime.to_string();
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&wanted))
            .map(|(_, v)| *v)
            .unwrap_or(Verdict::Empty)
    }
}

/// Extract the last path segment's extension from a locator
///
/// Query strings and fragments are stripped first, so `clip.mp4?t=1`
/// and `clip.mp4#cue` both yield `mp4`, and `video.m4v/manifest.m3u8`
/// yields `m3u8` (last segment only).
fn extension_of(locator: &str) -> Option<String> {
    if let Ok(url) = Url::parse(locator) {
        return extension_of_path(url.path());
    }
    // Not an absolute URL: strip query/fragment by hand
    let end = locator.find(['?', '#']).unwrap_or(locator.len());
    extension_of_path(&locator[..end])
}

fn extension_of_path(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Guess the MIME type(s) of a locator from its extension
///
/// Returns every subtype registered for the extension, in table order;
/// `None` when the extension is absent or unrecognized.
pub fn guess_type(locator: &str) -> Option<Vec<MimeType>> {
    let ext = extension_of(locator)?;
    let mut found = Vec::new();
    for (exts, kind, subtypes) in EXTENSION_TABLE {
        if exts.split(',').any(|e| e == ext) {
            for sub in subtypes.split(',') {
                found.push(MimeType::new(*kind, sub));
            }
        }
    }
    if found.is_empty() {
        tracing::debug!(extension = %ext, "unrecognized media extension");
        return None;
    }
    Some(found)
}

/// Pure table lookup for an explicit type
pub fn can_play_type(table: &TypeTable, mime: &MimeType) -> Verdict {
    table.verdict(mime)
}

/// Verdict for a locator, deriving candidate types when none is given
///
/// Candidates resolve optimistically: the first `Probably` wins
/// immediately, otherwise the first `Maybe` seen is kept. An extension
/// mapped to several subtypes (`.mov`) therefore takes the best match.
pub fn can_play(table: &TypeTable, locator: &str, mime: Option<&MimeType>) -> Verdict {
    let candidates: Vec<MimeType> = match mime {
        Some(m) => vec![m.clone()],
        None => match guess_type(locator) {
            Some(list) => list,
            None => return Verdict::Empty,
        },
    };
    let mut best = Verdict::Empty;
    for candidate in &candidates {
        match table.verdict(candidate) {
            Verdict::Probably => return Verdict::Probably,
            Verdict::Maybe if best == Verdict::Empty => best = Verdict::Maybe,
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: TypeTable = TypeTable {
        entries: &[
            ("video/mp4", Verdict::Probably),
            ("video/quicktime", Verdict::Probably),
            ("video/webm", Verdict::Maybe),
            ("audio/mpeg", Verdict::Probably),
        ],
    };

    #[test]
    fn test_guess_type_bare_name() {
        let types = guess_type("clip.mp4").unwrap();
        assert_eq!(types, vec![MimeType::new(MediaKind::Video, "mp4")]);
    }

    #[test]
    fn test_guess_type_case_insensitive() {
        let types = guess_type("CLIP.MP4").unwrap();
        assert_eq!(types[0].subtype, "mp4");
    }

    #[test]
    fn test_guess_type_query_and_fragment() {
        let expected = guess_type("clip.mp4").unwrap();
        assert_eq!(guess_type("clip.mp4?t=10").unwrap(), expected);
        assert_eq!(guess_type("clip.mp4#chapter-2").unwrap(), expected);
        assert_eq!(
            guess_type("https://cdn.example/v/clip.mp4?sig=a.b.c").unwrap(),
            expected
        );
    }

    #[test]
    fn test_guess_type_last_segment_only() {
        // The earlier dotted segment must not win
        let types = guess_type("https://cdn.example/video.m4v/manifest.m3u8").unwrap();
        assert_eq!(
            types,
            vec![MimeType::new(MediaKind::Application, "x-mpegurl")]
        );
    }

    #[test]
    fn test_guess_type_multi_subtype() {
        let types = guess_type("trailer.mov").unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0], MimeType::new(MediaKind::Video, "mp4"));
        assert_eq!(types[1], MimeType::new(MediaKind::Video, "quicktime"));
    }

    #[test]
    fn test_guess_type_unknown() {
        assert!(guess_type("readme.txt").is_none());
        assert!(guess_type("no-extension").is_none());
        assert!(guess_type("https://cdn.example/stream").is_none());
    }

    #[test]
    fn test_can_play_type_lookup() {
        let mp4 = MimeType::parse("video/mp4").unwrap();
        let ogg = MimeType::parse("video/ogg").unwrap();
        assert_eq!(can_play_type(&TABLE, &mp4), Verdict::Probably);
        assert_eq!(can_play_type(&TABLE, &ogg), Verdict::Empty);
    }

    #[test]
    fn test_can_play_prefers_probably_over_earlier_maybe() {
        // .mov maps to mp4 then quicktime; both probably here, but a
        // table where the first candidate is only maybe must still land
        // on probably from a later candidate.
        const MOV_TABLE: TypeTable = TypeTable {
            entries: &[
                ("video/mp4", Verdict::Maybe),
                ("video/quicktime", Verdict::Probably),
            ],
        };
        assert_eq!(can_play(&MOV_TABLE, "trailer.mov", None), Verdict::Probably);
    }

    #[test]
    fn test_can_play_explicit_type_overrides_extension() {
        let webm = MimeType::parse("video/webm").unwrap();
        assert_eq!(can_play(&TABLE, "clip.mp4", Some(&webm)), Verdict::Maybe);
    }

    #[test]
    fn test_can_play_unknown_is_empty() {
        assert_eq!(can_play(&TABLE, "stream", None), Verdict::Empty);
        assert_eq!(can_play(&TypeTable::EMPTY, "clip.mp4", None), Verdict::Empty);
    }
}
