//! Source resolution
//!
//! Raw source specifications (a URL, a typed descriptor, or an ordered
//! list of either) become the canonical source list. Order is
//! preserved: it is the trial order during renderer selection, so
//! callers express fallback priority by supplying sources in that
//! order. Verdicts are memoized per source and never recomputed.

use std::collections::HashMap;

use strand_backend::{RendererId, RendererKind, RendererRegistry};
use strand_mime::{guess_type, MimeType, Verdict};

/// Raw source specification
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// A bare locator
    Url(String),
    /// A locator with an explicit type
    Descriptor { src: String, mime: Option<MimeType> },
    /// Ordered fallback list
    Many(Vec<SourceSpec>),
}

impl From<&str> for SourceSpec {
    fn from(s: &str) -> Self {
        SourceSpec::Url(s.to_string())
    }
}

impl From<String> for SourceSpec {
    fn from(s: String) -> Self {
        SourceSpec::Url(s)
    }
}

impl From<Vec<&str>> for SourceSpec {
    fn from(list: Vec<&str>) -> Self {
        SourceSpec::Many(list.into_iter().map(SourceSpec::from).collect())
    }
}

impl From<Vec<SourceSpec>> for SourceSpec {
    fn from(list: Vec<SourceSpec>) -> Self {
        SourceSpec::Many(list)
    }
}

/// A resolved candidate source with its per-renderer verdict cache
#[derive(Debug, Clone)]
pub struct Source {
    pub locator: String,
    /// Explicit type if supplied, else the first guessed type
    pub mime: Option<MimeType>,
    explicit: bool,
    verdicts: HashMap<RendererId, Verdict>,
}

impl Source {
    fn new(locator: String, mime: Option<MimeType>) -> Self {
        let explicit = mime.is_some();
        let mime = mime.or_else(|| guess_type(&locator).and_then(|mut v| {
            if v.is_empty() {
                None
            } else {
                Some(v.remove(0))
            }
        }));
        Self {
            locator,
            mime,
            explicit,
            verdicts: HashMap::new(),
        }
    }

    /// Memoized verdict for a renderer kind
    pub fn verdict_for(&mut self, kind: &dyn RendererKind) -> Verdict {
        if let Some(v) = self.verdicts.get(&kind.id()) {
            return *v;
        }
        let mime = if self.explicit { self.mime.as_ref() } else { None };
        let verdict = kind.can_play(&self.locator, mime);
        self.verdicts.insert(kind.id(), verdict);
        verdict
    }

    /// Cached verdict, if this renderer was consulted before
    pub fn cached(&self, id: RendererId) -> Option<Verdict> {
        self.verdicts.get(&id).copied()
    }
}

/// Resolve a raw specification against the candidate renderers
///
/// Every renderer in the supplied list is consulted eagerly; the
/// result order matches input order. `None` resets to the explicit
/// empty-source state.
pub fn resolve(spec: Option<SourceSpec>, registry: &RendererRegistry) -> Vec<Source> {
    let mut out = Vec::new();
    if let Some(spec) = spec {
        flatten(spec, &mut out);
    }
    for source in &mut out {
        for kind in registry.kinds() {
            source.verdict_for(kind.as_ref());
        }
    }
    tracing::debug!(count = out.len(), "sources resolved");
    out
}

fn flatten(spec: SourceSpec, out: &mut Vec<Source>) {
    match spec {
        SourceSpec::Url(src) => out.push(Source::new(src, None)),
        SourceSpec::Descriptor { src, mime } => out.push(Source::new(src, mime)),
        SourceSpec::Many(list) => {
            for entry in list {
                flatten(entry, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use strand_backend::{embed, native, plugin, Environment, RendererRegistry};

    fn registry() -> RendererRegistry {
        RendererRegistry::detect(&Rc::new(RefCell::new(Environment::full())))
    }

    #[test]
    fn test_resolve_preserves_order() {
        let spec = SourceSpec::from(vec!["a.webm", "b.mp4", "c.flv"]);
        let sources = resolve(Some(spec), &registry());
        let locators: Vec<&str> = sources.iter().map(|s| s.locator.as_str()).collect();
        assert_eq!(locators, vec!["a.webm", "b.mp4", "c.flv"]);
    }

    #[test]
    fn test_resolve_fills_verdicts_eagerly() {
        let sources = resolve(Some("clip.mp4".into()), &registry());
        let source = &sources[0];
        assert_eq!(source.cached(native::ID), Some(Verdict::Probably));
        assert_eq!(source.cached(plugin::ID), Some(Verdict::Probably));
        assert_eq!(source.cached(embed::ID), Some(Verdict::Empty));
    }

    #[test]
    fn test_explicit_type_wins_over_extension() {
        let spec = SourceSpec::Descriptor {
            src: "clip.mp4".into(),
            mime: Some(MimeType::parse("video/youtube").unwrap()),
        };
        let sources = resolve(Some(spec), &registry());
        assert_eq!(sources[0].cached(embed::ID), Some(Verdict::Probably));
        assert_eq!(sources[0].cached(native::ID), Some(Verdict::Empty));
    }

    #[test]
    fn test_none_resets_to_empty() {
        assert!(resolve(None, &registry()).is_empty());
    }

    #[test]
    fn test_guessed_mime_recorded() {
        let sources = resolve(Some("clip.webm".into()), &registry());
        assert_eq!(
            sources[0].mime,
            Some(MimeType::parse("video/webm").unwrap())
        );
        let sources = resolve(Some("mystery".into()), &registry());
        assert_eq!(sources[0].mime, None);
    }
}
